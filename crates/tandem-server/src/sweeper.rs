use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use tandem_api::auth::AppState;
use tandem_db::{Database, RoomResult};

/// Background task that force-completes abandoned rooms.
///
/// Runs on an interval; every `active` room idle past the staleness
/// threshold is completed exactly as if a participant had completed it.
pub async fn run_sweep_loop(state: AppState, interval_secs: u64, stale_after_secs: i64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        match sweep_stale(&state.db, stale_after_secs) {
            Ok(count) => {
                if count > 0 {
                    info!("Sweep: auto-completed {} stale rooms", count);
                }
            }
            Err(e) => {
                warn!("Sweep error: {}", e);
            }
        }
    }
}

fn sweep_stale(db: &Database, stale_after_secs: i64) -> RoomResult<usize> {
    let threshold = chrono::Duration::seconds(stale_after_secs);

    let mut completed = 0;
    // Each room's check-and-transition is its own transaction; no lock is
    // held across rooms, and a room completed by a user mid-sweep is
    // simply skipped.
    for room_id in db.active_room_ids()? {
        if db.auto_complete_if_stale(&room_id, Utc::now(), threshold)? {
            completed += 1;
        }
    }

    Ok(completed)
}

#[cfg(test)]
mod tests {
    use super::sweep_stale;
    use chrono::{TimeZone, Utc};
    use tandem_db::Database;
    use tandem_types::models::RoomStatus;
    use uuid::Uuid;

    fn seed_user(db: &Database, username: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_user(&id, username, username, "$argon2id$test-hash")
            .unwrap();
        id
    }

    #[test]
    fn sweep_completes_only_idle_active_rooms() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("sweep-test.db")).unwrap();

        let a = seed_user(&db, "akira");
        let b = seed_user(&db, "botan");
        db.create_mutual_pair(&a, &b).unwrap();

        // started long ago and never touched since
        let long_ago = Utc.with_ymd_and_hms(2025, 6, 20, 9, 0, 0).unwrap();
        let idle = db
            .create_room(&Uuid::new_v4().to_string(), "idle", &a, long_ago)
            .unwrap();
        db.start_room(&idle.id, &a, long_ago).unwrap();

        // active with a recent heartbeat
        let busy = db
            .create_room(&Uuid::new_v4().to_string(), "busy", &a, long_ago)
            .unwrap();
        db.start_room(&busy.id, &a, long_ago).unwrap();
        db.touch_activity(&busy.id, &a, Utc::now()).unwrap();

        // never started
        let waiting = db
            .create_room(&Uuid::new_v4().to_string(), "waiting", &a, long_ago)
            .unwrap();

        let completed = sweep_stale(&db, 180).unwrap();
        assert_eq!(completed, 1);

        let idle = db.get_room_for(&idle.id, &a).unwrap();
        assert_eq!(idle.status, RoomStatus::Completed);
        assert!(idle.ended_at.is_some());
        // the running timer was banked on the way out
        assert!(!idle.timer_running);
        assert!(idle.timer_seconds >= (Utc::now() - long_ago).num_seconds() - 2);

        assert_eq!(
            db.get_room_for(&busy.id, &a).unwrap().status,
            RoomStatus::Active
        );
        assert_eq!(
            db.get_room_for(&waiting.id, &a).unwrap().status,
            RoomStatus::Waiting
        );

        // nothing left to sweep
        assert_eq!(sweep_stale(&db, 180).unwrap(), 0);
    }
}
