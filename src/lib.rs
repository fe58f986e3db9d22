//! odatakit - build protocol queries, run them remotely or in memory
//!
//! Filter expressions render to protocol syntax and evaluate against local
//! JSON records. Queries execute either through a streaming worker that
//! decodes the response as it arrives or through a mock engine over an
//! in-memory dataset; both return the same result types.

pub mod cli;
pub mod config;
pub mod decode;
pub mod errors;
pub mod execution;
pub mod expr;
pub mod query;
pub mod sequence;
pub mod transport;

pub use config::ClientConfig;
pub use errors::{ClientError, ClientResult};
