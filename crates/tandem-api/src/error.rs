use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use tandem_db::{RoomError, RoomResult};

/// Wrapper giving every engine error a stable HTTP mapping. Domain errors
/// are expected and recoverable (4xx with the message in the body); only
/// `Storage` is a fault and its detail stays in the server log.
#[derive(Debug)]
pub struct ApiError(pub RoomError);

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self(RoomError::Storage(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            RoomError::NotAuthorized | RoomError::InvalidParticipant => StatusCode::FORBIDDEN,
            RoomError::RoomNotFound | RoomError::UserNotFound => StatusCode::NOT_FOUND,
            RoomError::AlreadyPaired => StatusCode::CONFLICT,
            RoomError::NotPaired | RoomError::InvalidTransition => StatusCode::CONFLICT,
            RoomError::SelfPair
            | RoomError::InvalidEmotion
            | RoomError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RoomError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RoomError> for ApiError {
    fn from(e: RoomError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if let RoomError::Storage(detail) = &self.0 {
            error!("storage error: {}", detail);
            "internal error".to_string()
        } else {
            self.0.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Run blocking rusqlite work off the async runtime.
pub(crate) async fn run_db<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> RoomResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal("task join error")
        })?
        .map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_client_statuses() {
        assert_eq!(
            ApiError(RoomError::NotAuthorized).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError(RoomError::RoomNotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError(RoomError::AlreadyPaired).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError(RoomError::InvalidTransition).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError(RoomError::InvalidEmotion).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError(RoomError::ValidationFailed("x".into())).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError(RoomError::Storage("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
