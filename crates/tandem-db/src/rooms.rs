//! Room operations: the shared-activity state machine.
//!
//! Every mutation runs on the writer connection inside one transaction:
//! load, authorize, validate the transition, compute derived values, write.
//! That unit is atomic, so a user pausing the timer and the sweeper
//! completing the room can never both observe "running" and double-bank
//! the elapsed interval.
//!
//! Time is injected: callers pass `now`, so tests drive the clock.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;

use tandem_types::models::{Emotion, RoomStatus};

use crate::Database;
use crate::error::{RoomError, RoomResult};
use crate::models::{RoomRow, parse_emotion_column, parse_timestamp_column};
use crate::users::OptionalExt;

/// Rooms idle longer than this are force-completed by the sweeper.
pub const DEFAULT_STALE_AFTER_SECS: i64 = 180;

const MAX_TITLE_CHARS: usize = 100;

impl Database {
    /// Create a room between `initiator_id` and their current partner.
    /// The room starts in `waiting` with zeroed timer and heart counters.
    pub fn create_room(
        &self,
        id: &str,
        title: &str,
        initiator_id: &str,
        now: DateTime<Utc>,
    ) -> RoomResult<RoomRow> {
        let title = title.trim();
        if title.is_empty() {
            return Err(RoomError::ValidationFailed("title must not be blank".into()));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(RoomError::ValidationFailed(format!(
                "title is too long (maximum is {MAX_TITLE_CHARS} characters)"
            )));
        }

        self.with_write(|conn| {
            let tx = conn.transaction()?;

            let initiator = crate::users::query_user(&tx, "id = ?1", initiator_id)?
                .ok_or(RoomError::UserNotFound)?;
            let partner_id =
                crate::users::partner_link(&tx, &initiator.id)?.ok_or(RoomError::NotPaired)?;

            tx.execute(
                "INSERT INTO rooms (id, title, user_a_id, user_b_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, title, initiator_id, &partner_id, now.to_rfc3339()),
            )?;

            let room = load_room(&tx, id)?;
            tx.commit()?;
            Ok(room)
        })
    }

    /// `waiting → active`: stamps `started_at`, records activity, and
    /// starts the timer in the same transition.
    pub fn start_room(
        &self,
        room_id: &str,
        caller_id: &str,
        now: DateTime<Utc>,
    ) -> RoomResult<RoomRow> {
        self.with_write(|conn| {
            let tx = conn.transaction()?;
            let room = load_room_authorized(&tx, room_id, caller_id)?;

            if room.status != RoomStatus::Waiting {
                return Err(RoomError::InvalidTransition);
            }

            let ts = now.to_rfc3339();
            tx.execute(
                "UPDATE rooms
                 SET status = 'active', started_at = ?1, last_activity_at = ?1,
                     timer_running = 1, timer_started_at = ?1
                 WHERE id = ?2",
                (&ts, room_id),
            )?;

            let room = load_room(&tx, room_id)?;
            tx.commit()?;
            Ok(room)
        })
    }

    /// Resume the timer. Fails if it is already running.
    pub fn start_timer(
        &self,
        room_id: &str,
        caller_id: &str,
        now: DateTime<Utc>,
    ) -> RoomResult<RoomRow> {
        self.with_write(|conn| {
            let tx = conn.transaction()?;
            let room = load_room_authorized(&tx, room_id, caller_id)?;

            if room.timer_running {
                return Err(RoomError::InvalidTransition);
            }

            let ts = now.to_rfc3339();
            tx.execute(
                "UPDATE rooms
                 SET timer_running = 1, timer_started_at = ?1, last_activity_at = ?1
                 WHERE id = ?2",
                (&ts, room_id),
            )?;

            let room = load_room(&tx, room_id)?;
            tx.commit()?;
            Ok(room)
        })
    }

    /// Bank the running interval into `timer_seconds` and stop the timer.
    /// Fails if the timer is not running.
    pub fn pause_timer(
        &self,
        room_id: &str,
        caller_id: &str,
        now: DateTime<Utc>,
    ) -> RoomResult<RoomRow> {
        self.with_write(|conn| {
            let tx = conn.transaction()?;
            let room = load_room_authorized(&tx, room_id, caller_id)?;

            if !room.timer_running {
                return Err(RoomError::InvalidTransition);
            }

            bank_timer(&tx, &room, now)?;

            let room = load_room(&tx, room_id)?;
            tx.commit()?;
            Ok(room)
        })
    }

    /// `active`/`paused` → `completed`. A running timer is banked first, in
    /// the same transaction. Terminal: nothing transitions out of
    /// `completed`.
    pub fn complete_room(
        &self,
        room_id: &str,
        caller_id: &str,
        now: DateTime<Utc>,
    ) -> RoomResult<RoomRow> {
        self.with_write(|conn| {
            let tx = conn.transaction()?;
            let room = load_room_authorized(&tx, room_id, caller_id)?;

            if !matches!(room.status, RoomStatus::Active | RoomStatus::Paused) {
                return Err(RoomError::InvalidTransition);
            }

            complete_in_tx(&tx, &room, now)?;

            let room = load_room(&tx, room_id)?;
            tx.commit()?;
            Ok(room)
        })
    }

    /// Increment the heart counter. Monotonic: nothing in this engine ever
    /// decrements it. Allowed in any non-terminal status.
    pub fn add_hearts(
        &self,
        room_id: &str,
        caller_id: &str,
        count: i64,
        now: DateTime<Utc>,
    ) -> RoomResult<RoomRow> {
        if count <= 0 {
            return Err(RoomError::ValidationFailed(
                "heart count must be positive".into(),
            ));
        }

        self.with_write(|conn| {
            let tx = conn.transaction()?;
            let room = load_room_authorized(&tx, room_id, caller_id)?;

            if room.status.is_terminal() {
                return Err(RoomError::InvalidTransition);
            }

            tx.execute(
                "UPDATE rooms
                 SET heart_count = heart_count + ?1, last_activity_at = ?2
                 WHERE id = ?3",
                (count, now.to_rfc3339(), room_id),
            )?;

            let room = load_room(&tx, room_id)?;
            tx.commit()?;
            Ok(room)
        })
    }

    /// Heartbeat: unconditionally refresh `last_activity_at`.
    pub fn touch_activity(
        &self,
        room_id: &str,
        caller_id: &str,
        now: DateTime<Utc>,
    ) -> RoomResult<RoomRow> {
        self.with_write(|conn| {
            let tx = conn.transaction()?;
            load_room_authorized(&tx, room_id, caller_id)?;

            tx.execute(
                "UPDATE rooms SET last_activity_at = ?1 WHERE id = ?2",
                (now.to_rfc3339(), room_id),
            )?;

            let room = load_room(&tx, room_id)?;
            tx.commit()?;
            Ok(room)
        })
    }

    /// Record the caller's emotion on their side of the room.
    pub fn set_emotion(
        &self,
        room_id: &str,
        caller_id: &str,
        emotion: Emotion,
        now: DateTime<Utc>,
    ) -> RoomResult<RoomRow> {
        self.with_write(|conn| {
            let tx = conn.transaction()?;
            let room = load_room(&tx, room_id)?;

            let column = if room.user_a_id == caller_id {
                "user_a_emotion"
            } else if room.user_b_id == caller_id {
                "user_b_emotion"
            } else {
                return Err(RoomError::InvalidParticipant);
            };

            let sql = format!(
                "UPDATE rooms SET {column} = ?1, last_activity_at = ?2 WHERE id = ?3"
            );
            tx.execute(&sql, (emotion.as_str(), now.to_rfc3339(), room_id))?;

            let room = load_room(&tx, room_id)?;
            tx.commit()?;
            Ok(room)
        })
    }

    /// Sweeper entry point: complete the room iff it is `active` and idle
    /// past `threshold`. Check and transition are one transaction, so two
    /// concurrent sweeps (or a sweep racing a user's complete) cannot
    /// double-complete or double-bank. Returns whether it fired.
    pub fn auto_complete_if_stale(
        &self,
        room_id: &str,
        now: DateTime<Utc>,
        threshold: Duration,
    ) -> RoomResult<bool> {
        self.with_write(|conn| {
            let tx = conn.transaction()?;

            let room = match query_room(&tx, room_id)? {
                Some(room) => room,
                // raced with deletion; nothing to do
                None => return Ok(false),
            };

            if room.status != RoomStatus::Active || !room.is_stale(now, threshold) {
                return Ok(false);
            }

            complete_in_tx(&tx, &room, now)?;
            tx.commit()?;
            Ok(true)
        })
    }

    // -- Reads --

    /// Load a room for a participant. Pure read on a reader connection.
    pub fn get_room_for(&self, room_id: &str, caller_id: &str) -> RoomResult<RoomRow> {
        self.with_read(|conn| load_room_authorized(conn, room_id, caller_id))
    }

    /// Rooms the user participates in, newest first.
    pub fn list_rooms_for_user(&self, user_id: &str) -> RoomResult<Vec<RoomRow>> {
        self.with_read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ROOM_COLUMNS} FROM rooms
                 WHERE user_a_id = ?1 OR user_b_id = ?1
                 ORDER BY created_at DESC"
            ))?;

            let rows = stmt
                .query_map([user_id], room_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Ids of all `active` rooms — the sweeper's scan set.
    pub fn active_room_ids(&self) -> RoomResult<Vec<String>> {
        self.with_read(|conn| {
            let mut stmt = conn.prepare("SELECT id FROM rooms WHERE status = 'active'")?;
            let ids = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }
}

/// Bank the running interval: fold elapsed seconds into `timer_seconds`,
/// stop the timer, record activity. Caller verified `timer_running`.
fn bank_timer(conn: &Connection, room: &RoomRow, now: DateTime<Utc>) -> RoomResult<()> {
    let elapsed = room.current_elapsed_seconds(now);
    conn.execute(
        "UPDATE rooms
         SET timer_seconds = ?1, timer_running = 0, timer_started_at = NULL,
             last_activity_at = ?2
         WHERE id = ?3",
        (elapsed, now.to_rfc3339(), &room.id),
    )?;
    Ok(())
}

/// Shared tail of `complete_room` and `auto_complete_if_stale`, so a swept
/// room is indistinguishable from an explicitly completed one.
fn complete_in_tx(conn: &Connection, room: &RoomRow, now: DateTime<Utc>) -> RoomResult<()> {
    if room.timer_running {
        bank_timer(conn, room, now)?;
    }
    conn.execute(
        "UPDATE rooms SET status = 'completed', ended_at = ?1 WHERE id = ?2",
        (now.to_rfc3339(), &room.id),
    )?;
    Ok(())
}

fn load_room(conn: &Connection, room_id: &str) -> RoomResult<RoomRow> {
    query_room(conn, room_id)?.ok_or(RoomError::RoomNotFound)
}

fn load_room_authorized(conn: &Connection, room_id: &str, caller_id: &str) -> RoomResult<RoomRow> {
    let room = load_room(conn, room_id)?;
    if !room.is_participant(caller_id) {
        return Err(RoomError::NotAuthorized);
    }
    Ok(room)
}

const ROOM_COLUMNS: &str = "id, title, status, user_a_id, user_b_id, timer_seconds, \
     timer_running, timer_started_at, heart_count, user_a_emotion, user_b_emotion, \
     started_at, ended_at, last_activity_at, created_at";

fn query_room(conn: &Connection, room_id: &str) -> RoomResult<Option<RoomRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = ?1"))?;
    stmt.query_row([room_id], room_from_row).optional()
}

fn room_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RoomRow> {
    let id: String = row.get(0)?;
    let status_raw: String = row.get(2)?;
    let status = RoomStatus::parse(&status_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown room status '{status_raw}'").into(),
        )
    })?;

    Ok(RoomRow {
        title: row.get(1)?,
        status,
        user_a_id: row.get(3)?,
        user_b_id: row.get(4)?,
        timer_seconds: row.get(5)?,
        timer_running: row.get(6)?,
        timer_started_at: parse_timestamp_column(&id, "timer_started_at", row.get(7)?),
        heart_count: row.get(8)?,
        user_a_emotion: parse_emotion_column(&id, "user_a_emotion", row.get(9)?),
        user_b_emotion: parse_emotion_column(&id, "user_b_emotion", row.get(10)?),
        started_at: parse_timestamp_column(&id, "started_at", row.get(11)?),
        ended_at: parse_timestamp_column(&id, "ended_at", row.get(12)?),
        last_activity_at: parse_timestamp_column(&id, "last_activity_at", row.get(13)?),
        created_at: row.get(14)?,
        id,
    })
}
