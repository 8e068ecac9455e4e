pub mod error;
pub mod migrations;
pub mod models;
pub mod rooms;
pub mod users;

#[cfg(test)]
pub(crate) mod testutil;

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use rusqlite::Connection;
use tracing::info;

pub use error::{RoomError, RoomResult};

const READER_POOL_SIZE: usize = 4;

/// SQLite handle with a reader/writer split.
///
/// All mutations go through the single writer connection, each as one
/// transaction, so every operation's read-validate-write sequence is atomic
/// and serialized per the store. Status polls go to a small pool of
/// read-only WAL connections and never block the writer.
pub struct Database {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    reader_idx: AtomicUsize,
}

impl Database {
    pub fn open(path: &Path) -> RoomResult<Self> {
        let writer = Connection::open(path)?;

        // WAL mode for concurrent reads
        writer.pragma_update(None, "journal_mode", "WAL")?;
        writer.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&writer)?;

        let mut readers = Vec::with_capacity(READER_POOL_SIZE);
        for _ in 0..READER_POOL_SIZE {
            let conn = Connection::open_with_flags(
                path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            conn.pragma_update(None, "journal_mode", "WAL")?;
            readers.push(Mutex::new(conn));
        }

        info!(
            "Database opened at {} (1 writer + {} readers)",
            path.display(),
            READER_POOL_SIZE
        );
        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            reader_idx: AtomicUsize::new(0),
        })
    }

    pub fn with_read<F, T>(&self, f: F) -> RoomResult<T>
    where
        F: FnOnce(&Connection) -> RoomResult<T>,
    {
        let idx = self.reader_idx.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let conn = self.readers[idx]
            .lock()
            .map_err(|e| RoomError::Storage(format!("reader lock poisoned: {e}")))?;
        f(&conn)
    }

    pub fn with_write<F, T>(&self, f: F) -> RoomResult<T>
    where
        F: FnOnce(&mut Connection) -> RoomResult<T>,
    {
        let mut conn = self
            .writer
            .lock()
            .map_err(|e| RoomError::Storage(format!("writer lock poisoned: {e}")))?;
        f(&mut conn)
    }
}
