//! Room endpoints. Every mutation maps to one engine operation and returns
//! the freshly assembled status projection, so the client that acted sees
//! the same snapshot a polling partner will.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use tandem_db::RoomError;
use tandem_types::api::{
    AddHeartsRequest, Claims, CreateRoomRequest, RoomStatusResponse, RoomSummary,
    SetEmotionRequest,
};
use tandem_types::models::Emotion;

use crate::auth::AppState;
use crate::error::{ApiError, run_db};
use crate::projection;

pub async fn create_room(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateRoomRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let caller = claims.sub.to_string();
    let room_id = Uuid::new_v4().to_string();
    let now = Utc::now();

    let room = run_db(move || db.db.create_room(&room_id, &req.title, &caller, now)).await?;

    Ok((
        StatusCode::CREATED,
        Json(projection::room_status(&room, &claims.sub.to_string(), now)),
    ))
}

pub async fn list_rooms(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<RoomSummary>>, ApiError> {
    let db = state.clone();
    let caller = claims.sub.to_string();

    let rooms = run_db(move || db.db.list_rooms_for_user(&caller)).await?;

    Ok(Json(rooms.iter().map(projection::room_summary).collect()))
}

/// The polling endpoint: a pure read, never blocked by writers.
pub async fn room_status(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<RoomStatusResponse>, ApiError> {
    let db = state.clone();
    let caller = claims.sub.to_string();
    let rid = room_id.to_string();
    let now = Utc::now();

    let room = run_db(move || db.db.get_room_for(&rid, &caller)).await?;

    Ok(Json(projection::room_status(
        &room,
        &claims.sub.to_string(),
        now,
    )))
}

pub async fn start(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<RoomStatusResponse>, ApiError> {
    let db = state.clone();
    let caller = claims.sub.to_string();
    let rid = room_id.to_string();
    let now = Utc::now();

    let room = run_db(move || db.db.start_room(&rid, &caller, now)).await?;

    Ok(Json(projection::room_status(
        &room,
        &claims.sub.to_string(),
        now,
    )))
}

pub async fn pause_timer(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<RoomStatusResponse>, ApiError> {
    let db = state.clone();
    let caller = claims.sub.to_string();
    let rid = room_id.to_string();
    let now = Utc::now();

    let room = run_db(move || db.db.pause_timer(&rid, &caller, now)).await?;

    Ok(Json(projection::room_status(
        &room,
        &claims.sub.to_string(),
        now,
    )))
}

pub async fn resume_timer(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<RoomStatusResponse>, ApiError> {
    let db = state.clone();
    let caller = claims.sub.to_string();
    let rid = room_id.to_string();
    let now = Utc::now();

    let room = run_db(move || db.db.start_timer(&rid, &caller, now)).await?;

    Ok(Json(projection::room_status(
        &room,
        &claims.sub.to_string(),
        now,
    )))
}

pub async fn complete(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<RoomStatusResponse>, ApiError> {
    let db = state.clone();
    let caller = claims.sub.to_string();
    let rid = room_id.to_string();
    let now = Utc::now();

    let room = run_db(move || db.db.complete_room(&rid, &caller, now)).await?;

    Ok(Json(projection::room_status(
        &room,
        &claims.sub.to_string(),
        now,
    )))
}

pub async fn add_heart(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    body: Option<Json<AddHeartsRequest>>,
) -> Result<Json<RoomStatusResponse>, ApiError> {
    let count = body.map(|Json(req)| i64::from(req.count)).unwrap_or(1);

    let db = state.clone();
    let caller = claims.sub.to_string();
    let rid = room_id.to_string();
    let now = Utc::now();

    let room = run_db(move || db.db.add_hearts(&rid, &caller, count, now)).await?;

    Ok(Json(projection::room_status(
        &room,
        &claims.sub.to_string(),
        now,
    )))
}

/// Heartbeat from a polling client; refreshes activity so the sweeper
/// leaves the room alone.
pub async fn update_activity(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<RoomStatusResponse>, ApiError> {
    let db = state.clone();
    let caller = claims.sub.to_string();
    let rid = room_id.to_string();
    let now = Utc::now();

    let room = run_db(move || db.db.touch_activity(&rid, &caller, now)).await?;

    Ok(Json(projection::room_status(
        &room,
        &claims.sub.to_string(),
        now,
    )))
}

pub async fn set_emotion(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SetEmotionRequest>,
) -> Result<Json<RoomStatusResponse>, ApiError> {
    // Reject unknown tags at the boundary; nothing invalid is ever stored.
    let emotion = Emotion::parse(&req.emotion).ok_or(ApiError(RoomError::InvalidEmotion))?;

    let db = state.clone();
    let caller = claims.sub.to_string();
    let rid = room_id.to_string();
    let now = Utc::now();

    let room = run_db(move || db.db.set_emotion(&rid, &caller, emotion, now)).await?;

    Ok(Json(projection::room_status(
        &room,
        &claims.sub.to_string(),
        now,
    )))
}
