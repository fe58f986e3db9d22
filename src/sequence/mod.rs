//! # Async Sequence Queue
//!
//! Turns items produced over time into lazily consumed sequences.

mod errors;
mod queue;

pub use errors::{SequenceError, SequenceResult};
pub use queue::{SequenceCursor, SequenceQueue};
