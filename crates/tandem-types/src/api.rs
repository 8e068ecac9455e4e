use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Emotion, RoomStatus};

// -- JWT Claims --

/// JWT claims shared between the REST middleware and token issuance.
/// Canonical definition lives here in tandem-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub display_name: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub display_name: String,
    pub token: String,
}

// -- Pairing --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PairRequest {
    /// Username of the user to pair with.
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct PartnerInfo {
    pub user_id: Uuid,
    pub username: String,
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct PairingResponse {
    pub partner: Option<PartnerInfo>,
}

// -- Rooms --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateRoomRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddHeartsRequest {
    #[serde(default = "default_heart_count")]
    pub count: u32,
}

fn default_heart_count() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetEmotionRequest {
    /// Emotion tag; validated against the closed set before storage.
    pub emotion: String,
}

#[derive(Debug, Serialize)]
pub struct RoomSummary {
    pub id: Uuid,
    pub title: String,
    pub status: RoomStatus,
    pub heart_count: i64,
    pub created_at: String,
}

/// An emotion as delivered to clients: the tag plus the emoji to render.
#[derive(Debug, Clone, Serialize)]
pub struct EmotionView {
    pub tag: Emotion,
    pub emoji: &'static str,
}

impl From<Emotion> for EmotionView {
    fn from(tag: Emotion) -> Self {
        Self {
            tag,
            emoji: tag.emoji(),
        }
    }
}

/// Snapshot of a room as polled by a participant. Elapsed time is computed
/// live from the banked seconds and the running interval; `my_emotion` and
/// `partner_emotion` are relabeled from the caller's perspective.
#[derive(Debug, Serialize)]
pub struct RoomStatusResponse {
    pub id: Uuid,
    pub title: String,
    pub status: RoomStatus,
    pub timer_running: bool,
    pub elapsed_time: String,
    pub elapsed_seconds: i64,
    pub heart_count: i64,
    pub last_activity_at: Option<String>,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub user_a_emotion: Option<EmotionView>,
    pub user_b_emotion: Option<EmotionView>,
    pub my_emotion: Option<EmotionView>,
    pub partner_emotion: Option<EmotionView>,
}
