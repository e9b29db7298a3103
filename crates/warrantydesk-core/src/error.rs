//! Error types for `Warrantydesk` core library.

use thiserror::Error;

/// Result type alias using `Warrantydesk` Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for `Warrantydesk` operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A stored or submitted case status that is not part of the lifecycle
    #[error("Unknown case status: {0}")]
    UnknownStatus(String),

    #[error("Unknown document type: {0}")]
    UnknownDocumentType(String),
}
