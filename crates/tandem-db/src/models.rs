//! Database row types — these map directly to SQLite rows.
//! Distinct from the tandem-types API models to keep the DB layer
//! independent of the HTTP surface.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use tracing::warn;

use tandem_types::models::{Emotion, RoomStatus};

#[derive(Debug)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub password: String,
    pub partner_id: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct RoomRow {
    pub id: String,
    pub title: String,
    pub status: RoomStatus,
    pub user_a_id: String,
    pub user_b_id: String,
    /// Seconds banked while the timer previously ran. Excludes the
    /// currently-running interval.
    pub timer_seconds: i64,
    pub timer_running: bool,
    /// Set iff `timer_running` is true.
    pub timer_started_at: Option<DateTime<Utc>>,
    pub heart_count: i64,
    pub user_a_emotion: Option<Emotion>,
    pub user_b_emotion: Option<Emotion>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub created_at: String,
}

impl RoomRow {
    pub fn is_participant(&self, user_id: &str) -> bool {
        self.user_a_id == user_id || self.user_b_id == user_id
    }

    /// The other participant, or None if `user_id` is not in this room.
    pub fn partner_for(&self, user_id: &str) -> Option<&str> {
        if self.user_a_id == user_id {
            Some(&self.user_b_id)
        } else if self.user_b_id == user_id {
            Some(&self.user_a_id)
        } else {
            None
        }
    }

    pub fn emotion_for(&self, user_id: &str) -> Option<Emotion> {
        if self.user_a_id == user_id {
            self.user_a_emotion
        } else if self.user_b_id == user_id {
            self.user_b_emotion
        } else {
            None
        }
    }

    /// Banked seconds plus the running interval, truncated to whole seconds.
    /// A pure read: the same committed fields always yield the same value
    /// for a given `now`.
    pub fn current_elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        if !self.timer_running {
            return self.timer_seconds;
        }
        match self.timer_started_at {
            Some(started) => self.timer_seconds + (now - started).num_seconds().max(0),
            None => self.timer_seconds,
        }
    }

    /// No recorded activity for longer than `threshold`. Rooms that never
    /// recorded activity are not stale.
    pub fn is_stale(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        match self.last_activity_at {
            Some(last) => now - last > threshold,
            None => false,
        }
    }
}

/// Parse a stored timestamp. Code-written fields are RFC 3339; SQLite's
/// `datetime('now')` defaults are "YYYY-MM-DD HH:MM:SS" without a zone, so
/// fall back to parsing those as naive UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>().ok().or_else(|| {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|ndt| ndt.and_utc())
    })
}

pub(crate) fn parse_timestamp_column(room_id: &str, column: &str, raw: Option<String>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    match parse_timestamp(&raw) {
        Some(ts) => Some(ts),
        None => {
            warn!("Corrupt {} '{}' on room '{}'", column, raw, room_id);
            None
        }
    }
}

pub(crate) fn parse_emotion_column(room_id: &str, column: &str, raw: Option<String>) -> Option<Emotion> {
    let raw = raw?;
    match Emotion::parse(&raw) {
        Some(emotion) => Some(emotion),
        None => {
            warn!("Corrupt {} '{}' on room '{}'", column, raw, room_id);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn room(timer_seconds: i64, running: bool, started: Option<DateTime<Utc>>) -> RoomRow {
        RoomRow {
            id: "r".into(),
            title: "t".into(),
            status: RoomStatus::Active,
            user_a_id: "a".into(),
            user_b_id: "b".into(),
            timer_seconds,
            timer_running: running,
            timer_started_at: started,
            heart_count: 0,
            user_a_emotion: None,
            user_b_emotion: None,
            started_at: None,
            ended_at: None,
            last_activity_at: None,
            created_at: String::new(),
        }
    }

    #[test]
    fn elapsed_is_banked_seconds_while_stopped() {
        let now = Utc.with_ymd_and_hms(2025, 6, 20, 12, 0, 0).unwrap();
        let r = room(42, false, None);
        assert_eq!(r.current_elapsed_seconds(now), 42);
    }

    #[test]
    fn elapsed_adds_running_interval_truncated() {
        let started = Utc.with_ymd_and_hms(2025, 6, 20, 12, 0, 0).unwrap();
        let now = started + Duration::milliseconds(95_900);
        let r = room(30, true, Some(started));
        // 95.9s truncates to 95, never rounds up
        assert_eq!(r.current_elapsed_seconds(now), 125);
    }

    #[test]
    fn elapsed_never_goes_negative_on_clock_skew() {
        let started = Utc.with_ymd_and_hms(2025, 6, 20, 12, 0, 0).unwrap();
        let now = started - Duration::seconds(10);
        let r = room(7, true, Some(started));
        assert_eq!(r.current_elapsed_seconds(now), 7);
    }

    #[test]
    fn staleness_threshold_is_exclusive() {
        let last = Utc.with_ymd_and_hms(2025, 6, 20, 12, 0, 0).unwrap();
        let mut r = room(0, false, None);
        r.last_activity_at = Some(last);

        let threshold = Duration::minutes(3);
        assert!(r.is_stale(last + Duration::minutes(4), threshold));
        assert!(!r.is_stale(last + Duration::minutes(1), threshold));
        assert!(!r.is_stale(last + Duration::minutes(3), threshold));

        r.last_activity_at = None;
        assert!(!r.is_stale(last + Duration::days(1), threshold));
    }

    #[test]
    fn partner_relabeling() {
        let r = room(0, false, None);
        assert_eq!(r.partner_for("a"), Some("b"));
        assert_eq!(r.partner_for("b"), Some("a"));
        assert_eq!(r.partner_for("c"), None);
        assert!(r.is_participant("a"));
        assert!(!r.is_participant("c"));
    }
}
