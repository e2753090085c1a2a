//! Error types for bkt.

use thiserror::Error;

/// Main error type for bkt operations.
///
/// Two families matter to callers: [`Error::Validation`] is raised before any
/// request leaves the process, everything else comes from the transport.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller input was rejected before any network call
    #[error("{0}")]
    Validation(String),

    /// HTTP request failed before a response status was received
    #[error("HTTP error: {0}")]
    Http(String),

    /// Server answered 401
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Server answered 403
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Server answered 404
    #[error("Not found: {0}")]
    NotFound(String),

    /// API returned any other non-success status
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Path or link could not be resolved against the base endpoint
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The call was cancelled through its context
    #[error("request cancelled")]
    Cancelled,

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Shorthand for a validation error with a fixed message.
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Map a non-success HTTP status and server message to an error.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => Error::Unauthorized(message),
            403 => Error::Forbidden(message),
            404 => Error::NotFound(message),
            _ => Error::Api { status, message },
        }
    }

    /// HTTP status carried by the error, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Unauthorized(_) => Some(401),
            Error::Forbidden(_) => Some(403),
            Error::NotFound(_) => Some(404),
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error was raised by input validation.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

/// Result type alias for bkt operations.
pub type Result<T> = std::result::Result<T, Error>;
