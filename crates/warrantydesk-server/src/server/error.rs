//! Domain outcomes returned by the services.

use crate::storage::DatabaseError;

/// Errors returned by the service layer.
///
/// The three authentication variants carry fixed messages that never say
/// which check failed.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Invalid national code or password")]
    InvalidCredentials,

    #[error("Invalid Token")]
    InvalidToken,

    #[error("Invalid Refresh Token")]
    InvalidRefreshToken,

    #[error("Access denied")]
    AccessDenied,

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(DatabaseError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Internal(format!("{context}: {err}"))
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound(what) => Self::NotFound(what),
            other => Self::Database(other),
        }
    }
}
