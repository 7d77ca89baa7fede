//! Error types for the ZavaX core library.

use thiserror::Error;

/// Errors that can occur while decoding node replies.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ZavaxError {
    /// The reply body is not a JSON object.
    #[error("Malformed reply: expected a JSON object, got {0}")]
    MalformedReply(String),

    /// A height field could not be read as an unsigned integer.
    #[error("Invalid height value: {0}")]
    InvalidHeight(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, ZavaxError>;
