//! Read-only view-model assembly: a room row plus the requesting caller
//! becomes the snapshot clients poll. Pure functions, no storage access.

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use tandem_db::models::RoomRow;
use tandem_types::api::{RoomStatusResponse, RoomSummary};
use tandem_types::models::format_elapsed;

/// Assemble the polled snapshot. Elapsed time is computed live from the
/// committed fields; `my_emotion`/`partner_emotion` relabel the two
/// participant slots from the caller's perspective.
pub fn room_status(room: &RoomRow, caller_id: &str, now: DateTime<Utc>) -> RoomStatusResponse {
    let elapsed_seconds = room.current_elapsed_seconds(now);

    RoomStatusResponse {
        id: parse_id(&room.id),
        title: room.title.clone(),
        status: room.status,
        timer_running: room.timer_running,
        elapsed_time: format_elapsed(elapsed_seconds),
        elapsed_seconds,
        heart_count: room.heart_count,
        last_activity_at: room
            .last_activity_at
            .map(|t| t.format("%H:%M:%S").to_string()),
        started_at: room.started_at.map(|t| t.format("%H:%M").to_string()),
        ended_at: room.ended_at.map(|t| t.format("%Y/%m/%d %H:%M").to_string()),
        user_a_emotion: room.user_a_emotion.map(Into::into),
        user_b_emotion: room.user_b_emotion.map(Into::into),
        my_emotion: room.emotion_for(caller_id).map(Into::into),
        partner_emotion: room
            .partner_for(caller_id)
            .and_then(|partner| room.emotion_for(partner))
            .map(Into::into),
    }
}

pub fn room_summary(room: &RoomRow) -> RoomSummary {
    RoomSummary {
        id: parse_id(&room.id),
        title: room.title.clone(),
        status: room.status,
        heart_count: room.heart_count,
        created_at: room.created_at.clone(),
    }
}

fn parse_id(raw: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt room id '{}': {}", raw, e);
        Uuid::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tandem_types::models::{Emotion, RoomStatus};

    fn sample_room() -> RoomRow {
        let started = Utc.with_ymd_and_hms(2025, 6, 20, 9, 0, 0).unwrap();
        RoomRow {
            id: Uuid::new_v4().to_string(),
            title: "evening debrief".into(),
            status: RoomStatus::Active,
            user_a_id: "user-a".into(),
            user_b_id: "user-b".into(),
            timer_seconds: 120,
            timer_running: true,
            timer_started_at: Some(started),
            heart_count: 4,
            user_a_emotion: Some(Emotion::Happy),
            user_b_emotion: Some(Emotion::Sleepy),
            started_at: Some(started),
            ended_at: None,
            last_activity_at: Some(started),
            created_at: started.to_rfc3339(),
        }
    }

    #[test]
    fn elapsed_is_live_computed_and_formatted() {
        let room = sample_room();
        let now = room.timer_started_at.unwrap() + Duration::seconds(5);

        let status = room_status(&room, "user-a", now);
        assert_eq!(status.elapsed_seconds, 125);
        assert_eq!(status.elapsed_time, "02:05");
        assert!(status.timer_running);
        assert_eq!(status.started_at.as_deref(), Some("09:00"));
        assert_eq!(status.last_activity_at.as_deref(), Some("09:00:00"));
        assert_eq!(status.ended_at, None);
    }

    #[test]
    fn emotions_relabel_per_caller() {
        let room = sample_room();
        let now = Utc::now();

        let for_a = room_status(&room, "user-a", now);
        assert_eq!(for_a.my_emotion.unwrap().tag, Emotion::Happy);
        assert_eq!(for_a.partner_emotion.unwrap().tag, Emotion::Sleepy);

        let for_b = room_status(&room, "user-b", now);
        assert_eq!(for_b.my_emotion.unwrap().tag, Emotion::Sleepy);
        assert_eq!(for_b.partner_emotion.unwrap().tag, Emotion::Happy);

        // both raw slots are present regardless of caller
        assert_eq!(for_b.user_a_emotion.unwrap().tag, Emotion::Happy);
        assert_eq!(for_b.user_b_emotion.unwrap().emoji, "😴");
    }
}
