use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::warn;
use uuid::Uuid;

use tandem_db::RoomError;
use tandem_db::models::UserRow;
use tandem_types::api::{Claims, PairRequest, PairingResponse, PartnerInfo};

use crate::auth::AppState;
use crate::error::{ApiError, run_db};

pub async fn get_pairing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<PairingResponse>, ApiError> {
    let db = state.clone();
    let user_id = claims.sub.to_string();

    let partner = run_db(move || db.db.partner_of(&user_id)).await?;

    Ok(Json(PairingResponse {
        partner: partner.map(partner_info),
    }))
}

/// Pair the caller with another user by username. Both partner links are
/// written atomically; fails if either side is already paired.
pub async fn create_pairing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PairRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let caller_id = claims.sub.to_string();

    let partner = run_db(move || {
        let target = db
            .db
            .get_user_by_username(&req.username)?
            .ok_or(RoomError::UserNotFound)?;
        db.db.create_mutual_pair(&caller_id, &target.id)?;
        Ok(target)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(PairingResponse {
            partner: Some(partner_info(partner)),
        }),
    ))
}

/// Dissolve the caller's partnership. Idempotent.
pub async fn delete_pairing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, ApiError> {
    let db = state.clone();
    let user_id = claims.sub.to_string();

    run_db(move || db.db.unpair(&user_id)).await?;

    Ok(StatusCode::NO_CONTENT)
}

fn partner_info(user: UserRow) -> PartnerInfo {
    PartnerInfo {
        user_id: user.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt user id '{}': {}", user.id, e);
            Uuid::default()
        }),
        username: user.username,
        display_name: user.display_name,
    }
}
