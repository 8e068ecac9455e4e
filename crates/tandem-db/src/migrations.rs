use rusqlite::Connection;
use tracing::info;

use crate::error::RoomResult;

pub fn run(conn: &Connection) -> RoomResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id            TEXT PRIMARY KEY,
            username      TEXT NOT NULL UNIQUE,
            display_name  TEXT NOT NULL,
            password      TEXT NOT NULL,
            partner_id    TEXT REFERENCES users(id) ON DELETE SET NULL,
            created_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_users_partner
            ON users(partner_id);

        CREATE TABLE IF NOT EXISTS rooms (
            id                TEXT PRIMARY KEY,
            title             TEXT NOT NULL,
            status            TEXT NOT NULL DEFAULT 'waiting',
            user_a_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            user_b_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            timer_seconds     INTEGER NOT NULL DEFAULT 0,
            timer_running     INTEGER NOT NULL DEFAULT 0,
            timer_started_at  TEXT,
            heart_count       INTEGER NOT NULL DEFAULT 0,
            user_a_emotion    TEXT,
            user_b_emotion    TEXT,
            started_at        TEXT,
            ended_at          TEXT,
            last_activity_at  TEXT,
            created_at        TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_rooms_status
            ON rooms(status);

        CREATE INDEX IF NOT EXISTS idx_rooms_user_a
            ON rooms(user_a_id);

        CREATE INDEX IF NOT EXISTS idx_rooms_user_b
            ON rooms(user_b_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
