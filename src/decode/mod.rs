//! # Response Decoding

mod decoder;
mod scanner;

pub(crate) use decoder::parse_count;
pub use decoder::{DecodeEvent, IncrementalDecoder};
