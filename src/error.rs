//! Error types for the vault and interception cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Network Failure Kind ==
/// Which side of the interception contract a network failure happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// A page navigation; normally recovered by the shell fallback
    Navigation,
    /// Any other request; propagated to the caller
    Resource,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Navigation => f.write_str("navigation"),
            FailureKind::Resource => f.write_str("resource"),
        }
    }
}

// == Fetch Error ==
/// Raised by a fetcher when no HTTP response could be obtained at all.
///
/// An HTTP error status is not a fetch error.
#[derive(Error, Debug, Clone)]
#[error("network request failed: {0}")]
pub struct FetchError(pub String);

// == Vault Error Enum ==
/// Unified error type for the vault and the cache manager.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Unknown username or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Registration with a username that already exists
    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    /// Collection access without an active session
    #[error("No active session")]
    NotAuthenticated,

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The network could not be reached and nothing could stand in for it
    #[error("{kind} network failure for {url}: {reason}")]
    NetworkFailure {
        kind: FailureKind,
        url: String,
        reason: String,
    },

    /// A durable record exists but does not parse
    #[error("Malformed record '{key}': {reason}")]
    StorageMalformed { key: String, reason: String },

    /// The key-value substrate failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VaultError {
    /// Builds a `StorageMalformed` for the given record key.
    pub fn malformed(key: &str, reason: impl std::fmt::Display) -> Self {
        VaultError::StorageMalformed {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Wraps a fetch error with the failing URL.
    pub fn network(kind: FailureKind, url: &str, err: FetchError) -> Self {
        VaultError::NetworkFailure {
            kind,
            url: url.to_string(),
            reason: err.0,
        }
    }
}

impl From<std::io::Error> for VaultError {
    fn from(err: std::io::Error) -> Self {
        VaultError::Storage(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for VaultError {
    fn into_response(self) -> Response {
        let status = match &self {
            VaultError::InvalidCredentials | VaultError::NotAuthenticated => {
                StatusCode::UNAUTHORIZED
            }
            VaultError::UsernameTaken(_) => StatusCode::CONFLICT,
            VaultError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            VaultError::NetworkFailure { .. } => StatusCode::BAD_GATEWAY,
            VaultError::StorageMalformed { .. }
            | VaultError::Storage(_)
            | VaultError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the vault.
pub type Result<T> = std::result::Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (VaultError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (
                VaultError::UsernameTaken("ash".into()),
                StatusCode::CONFLICT,
            ),
            (
                VaultError::network(
                    FailureKind::Resource,
                    "http://up/cards",
                    FetchError("refused".into()),
                ),
                StatusCode::BAD_GATEWAY,
            ),
            (
                VaultError::malformed("user-table", "eof"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_network_failure_message() {
        let err = VaultError::network(
            FailureKind::Navigation,
            "http://up/",
            FetchError("offline".into()),
        );
        assert_eq!(
            err.to_string(),
            "navigation network failure for http://up/: offline"
        );
    }
}
