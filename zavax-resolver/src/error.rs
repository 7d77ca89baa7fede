//! Error types for the ZavaX resolver.
//!
//! Transport problems and in-band node errors are kept apart: the
//! resolver halts on an in-band error but never retries a transport one.

use thiserror::Error;
use zavax_core::NodeError;

/// Errors that can occur while talking to a node.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// Network-level failure (connection refused, TLS, reset).
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The node did not answer within the request timeout.
    #[error("Request to node timed out")]
    Timeout,

    /// The endpoint could not be parsed as a URL.
    #[error("Invalid node endpoint '{0}'")]
    InvalidEndpoint(String),

    /// The reply body was not a JSON-RPC object.
    #[error("Malformed reply from node: {0}")]
    MalformedReply(String),

    /// The node answered with an in-band error.
    #[error("{0}")]
    Node(NodeError),
}

impl ResolverError {
    /// Whether this is a transport-level failure rather than a node answer.
    pub fn is_transport(&self) -> bool {
        !matches!(self, ResolverError::Node(_))
    }
}

impl From<reqwest::Error> for ResolverError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ResolverError::Timeout
        } else if e.is_decode() {
            ResolverError::MalformedReply(e.to_string())
        } else {
            ResolverError::Transport(e.to_string())
        }
    }
}

impl From<zavax_core::ZavaxError> for ResolverError {
    fn from(e: zavax_core::ZavaxError) -> Self {
        ResolverError::MalformedReply(e.to_string())
    }
}

/// Result type alias for resolver operations.
pub type Result<T> = std::result::Result<T, ResolverError>;
