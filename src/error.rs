//! Game Error Types
//!
//! Every failure a submission can end in. Client-caused kinds map to 4xx
//! responses; `Unknown` and `Storage` signal internal state problems and
//! map to 5xx so operators can tell them apart from user error.

use axum::http::StatusCode;
use thiserror::Error;

use crate::game::models::KillClaim;

/// Errors surfaced by the kill-claim engine and its collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Credentials missing or mismatched
    #[error("Not authorized.")]
    NotAuthorized,

    /// Submitter lacks rights over the requested operation
    #[error("Permission denied.")]
    PermissionDenied,

    /// Killer or victim has already been eliminated
    #[error("User '{0}' is already dead.")]
    UsersDead(String),

    /// The ordered (killer, victim) pair was claimed before
    #[error("A claim already exists for '{}' killing '{}'.", .0.killer_alias(), .0.victim)]
    ClaimAlreadyExists(KillClaim),

    /// Referenced player does not exist
    #[error("User '{0}' does not exist.")]
    NotFound(String),

    /// Target chain invariant violation
    #[error("Unknown error: {0}")]
    Unknown(String),

    /// Backing store failed or rejected a write
    #[error("Storage failure: {0}")]
    Storage(String),

    /// Resource does not implement this verb
    #[error("Operation '{0}' is not supported here.")]
    Unsupported(&'static str),

    /// Malformed or conflicting request payload
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl GameError {
    /// Internal failures need operator attention, not a different request
    pub fn is_internal(&self) -> bool {
        matches!(self, GameError::Unknown(_) | GameError::Storage(_))
    }

    /// Short machine-readable tag for logs and response bodies
    pub fn kind(&self) -> &'static str {
        match self {
            GameError::NotAuthorized => "not_authorized",
            GameError::PermissionDenied => "permission_denied",
            GameError::UsersDead(_) => "users_dead",
            GameError::ClaimAlreadyExists(_) => "claim_already_exists",
            GameError::NotFound(_) => "not_found",
            GameError::Unknown(_) => "unknown",
            GameError::Storage(_) => "storage",
            GameError::Unsupported(_) => "unsupported",
            GameError::InvalidRequest(_) => "invalid_request",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GameError::NotAuthorized => StatusCode::UNAUTHORIZED,
            GameError::PermissionDenied => StatusCode::FORBIDDEN,
            GameError::UsersDead(_) => StatusCode::CONFLICT,
            GameError::ClaimAlreadyExists(_) => StatusCode::CONFLICT,
            GameError::NotFound(_) => StatusCode::NOT_FOUND,
            GameError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GameError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            GameError::Unsupported(_) => StatusCode::METHOD_NOT_ALLOWED,
            GameError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<sqlx::Error> for GameError {
    fn from(err: sqlx::Error) -> Self {
        GameError::Storage(err.to_string())
    }
}

/// Result type for game operations
pub type GameResult<T> = Result<T, GameError>;
