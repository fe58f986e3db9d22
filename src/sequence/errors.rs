//! # Sequence Errors

use thiserror::Error;

/// Result type for queue producer operations
pub type SequenceResult<T> = Result<T, SequenceError>;

/// Misuse of a sequence queue
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// Push, complete or fail after the queue already ended
    #[error("Sequence already ended")]
    Ended,
}
