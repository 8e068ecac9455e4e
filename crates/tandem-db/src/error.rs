use thiserror::Error;

/// Expected, recoverable failures of room and pairing operations. The API
/// layer maps each variant to a stable HTTP status; only `Storage` is a
/// fault. A failed operation never leaves partial state behind — every
/// mutation runs inside one transaction that rolls back on error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoomError {
    #[error("caller is not a participant of this room")]
    NotAuthorized,

    #[error("user has no partner")]
    NotPaired,

    #[error("user is already paired")]
    AlreadyPaired,

    #[error("a user cannot pair with themself")]
    SelfPair,

    #[error("operation not allowed in the room's current status")]
    InvalidTransition,

    #[error("user is not a participant of this room")]
    InvalidParticipant,

    #[error("unrecognized emotion")]
    InvalidEmotion,

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("room not found")]
    RoomNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for RoomError {
    fn from(e: rusqlite::Error) -> Self {
        RoomError::Storage(e.to_string())
    }
}

pub type RoomResult<T> = Result<T, RoomError>;
