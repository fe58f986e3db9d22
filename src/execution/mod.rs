//! # Query Execution
//!
//! Two interchangeable executors: [`StreamingWorker`] talks to a service
//! through a transport, [`MockEngine`] answers from memory.

mod mock;
mod result;
mod sorter;
mod streaming;
mod validator;

use crate::errors::ClientResult;
use crate::query::{EntityKey, QueryOptions};

pub use mock::{Dataset, MockEngine};
pub use result::{CollectionResult, Deferred, Settle, SingleResult};
pub use sorter::ResultSorter;
pub use streaming::{RequestSpec, StreamingWorker};
pub use validator::{ItemValidator, SelectedFieldsValidator};

/// Runs queries; configuration errors are returned synchronously, all
/// later failures surface through the results
pub trait Executor: Send + Sync {
    fn execute_collection(&self, options: &QueryOptions) -> ClientResult<CollectionResult>;

    fn execute_single(&self, key: &EntityKey, options: &QueryOptions) -> ClientResult<SingleResult>;
}
