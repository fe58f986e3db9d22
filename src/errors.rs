//! # Client Errors
//!
//! Error types shared by the query model, the execution workers and the
//! sequence queue.

use thiserror::Error;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Client errors
///
/// Errors are `Clone` because a single failure is fanned out to every
/// pending result of an execution (count, data and the item queue).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    // ==================
    // Configuration Errors
    // ==================
    /// Operation or parameter the resource was not configured for
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid query parameter
    #[error("Invalid query parameter: {0}")]
    InvalidQueryParam(String),

    /// Requested page size exceeds the configured maximum
    #[error("Top {0} exceeds maximum {1}")]
    LimitExceeded(usize, usize),

    // ==================
    // Execution Errors
    // ==================
    /// A per-item validator rejected an element
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The transport adapter failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status
    #[error("Unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// The response never carried `@odata.count`
    #[error("Count was not present in the response")]
    CountUnavailable,

    /// No record matched the requested key
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The producer went away before settling a result
    #[error("Execution dropped before completion")]
    Dropped,
}

impl ClientError {
    /// Returns true for errors raised before any I/O took place
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ClientError::Configuration(_)
                | ClientError::InvalidQueryParam(_)
                | ClientError::LimitExceeded(_, _)
        )
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}
