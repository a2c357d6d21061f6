//! Error types for medley-hs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// History sync pipeline errors
///
/// Only `SourceUnavailable` and `RuleParse` abort a whole run; the rest are
/// absorbed at the coordinator boundary and surfaced through counts and logs.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Legacy database cannot be opened or read; fatal for the whole run
    #[error("legacy source unavailable: {0}")]
    SourceUnavailable(String),

    /// A remap rule line has no `source:destination` delimiter; rules are
    /// validated before any category executes, so this aborts the run
    #[error("malformed remap rule: {line:?}")]
    RuleParse { line: String },

    /// A plugin value that requires rewriting failed to decode as JSON;
    /// scoped to the single record carrying it
    #[error("value decode failed for key {key:?}: {reason}")]
    ValueDecode { key: String, reason: String },

    /// Destination store write failed; per-record unless systemic
    #[error("store write failed: {0}")]
    Store(#[from] medley_common::Error),

    /// A sync run is already in flight
    #[error("a sync run is already in progress")]
    AlreadyRunning,
}

/// Whether a store failure is connection-level rather than row-level
///
/// Systemic failures abandon the remaining records of the current category;
/// row-level failures skip one record and continue.
pub fn is_systemic(err: &medley_common::Error) -> bool {
    match err {
        medley_common::Error::Database(e) => matches!(
            e,
            sqlx::Error::PoolClosed
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::WorkerCrashed
                | sqlx::Error::Io(_)
                | sqlx::Error::Protocol(_)
        ),
        medley_common::Error::Io(_) => true,
        _ => false,
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - a sync run is already in progress
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// medley-common error
    #[error("Common error: {0}")]
    Common(#[from] medley_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "ALREADY_RUNNING", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_level_database_errors_are_not_systemic() {
        let err = medley_common::Error::Database(sqlx::Error::RowNotFound);
        assert!(!is_systemic(&err));
    }

    #[test]
    fn pool_loss_is_systemic() {
        let err = medley_common::Error::Database(sqlx::Error::PoolClosed);
        assert!(is_systemic(&err));
    }

    #[test]
    fn config_errors_are_not_systemic() {
        let err = medley_common::Error::Config("bad".to_string());
        assert!(!is_systemic(&err));
    }
}
