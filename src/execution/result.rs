//! # Execution Results
//!
//! A collection execution yields three views that agree on every item: the
//! total count, the materialized array and a live item sequence. A single
//! entity execution yields one deferred value.

use futures_util::future::{self, BoxFuture, FutureExt, Shared};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::errors::{ClientError, ClientResult};
use crate::sequence::{SequenceCursor, SequenceQueue};

/// A result that may still be pending; cloning shares the same outcome
#[derive(Clone)]
pub struct Deferred<T: Clone> {
    inner: Shared<BoxFuture<'static, ClientResult<T>>>,
}

impl<T: Clone + Send + Sync + 'static> Deferred<T> {
    /// Already settled with `result`
    pub fn ready(result: ClientResult<T>) -> Self {
        Self {
            inner: future::ready(result).boxed().shared(),
        }
    }

    /// Pending until the returned [`Settle`] is used.
    ///
    /// Dropping the `Settle` unused settles with [`ClientError::Dropped`].
    pub fn pending() -> (Settle<T>, Self) {
        let (sender, receiver) = oneshot::channel();
        let inner = async move { receiver.await.unwrap_or(Err(ClientError::Dropped)) }
            .boxed()
            .shared();
        (
            Settle {
                sender: Some(sender),
            },
            Self { inner },
        )
    }

    /// Waits for the outcome
    pub async fn get(&self) -> ClientResult<T> {
        self.inner.clone().await
    }

    /// The outcome, if already settled and observed
    pub fn peek(&self) -> Option<ClientResult<T>> {
        self.inner.peek().cloned()
    }
}

/// Producer side of a [`Deferred`]; only the first outcome counts
#[derive(Debug)]
pub struct Settle<T> {
    sender: Option<oneshot::Sender<ClientResult<T>>>,
}

impl<T> Settle<T> {
    /// Settles the result; false if it was already settled
    pub fn settle(&mut self, result: ClientResult<T>) -> bool {
        match self.sender.take() {
            Some(sender) => {
                // Receiver gone means nobody is waiting, which is fine
                let _ = sender.send(result);
                true
            }
            None => false,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.sender.is_none()
    }
}

/// Result of a collection execution
#[derive(Clone)]
pub struct CollectionResult {
    count: Deferred<u64>,
    data: Deferred<Vec<Value>>,
    iterator: SequenceQueue<Value>,
}

impl CollectionResult {
    pub fn new(
        count: Deferred<u64>,
        data: Deferred<Vec<Value>>,
        iterator: SequenceQueue<Value>,
    ) -> Self {
        Self {
            count,
            data,
            iterator,
        }
    }

    /// All three views settled up front
    pub fn settled(count: ClientResult<u64>, data: Vec<Value>) -> Self {
        let iterator = SequenceQueue::new();
        for item in &data {
            // Freshly created queue, cannot have ended
            let _ = iterator.push(item.clone());
        }
        let _ = iterator.complete();

        Self {
            count: Deferred::ready(count),
            data: Deferred::ready(Ok(data)),
            iterator,
        }
    }

    /// Total count, post-filter and pre-paging
    pub async fn count(&self) -> ClientResult<u64> {
        self.count.get().await
    }

    /// Every item, once fully received
    pub async fn data(&self) -> ClientResult<Vec<Value>> {
        self.data.get().await
    }

    /// A fresh cursor over the items as they arrive
    pub fn iter(&self) -> SequenceCursor<Value> {
        self.iterator.cursor()
    }

    pub fn queue(&self) -> &SequenceQueue<Value> {
        &self.iterator
    }
}

/// Result of a single entity execution
#[derive(Clone)]
pub struct SingleResult {
    value: Deferred<Value>,
}

impl SingleResult {
    pub fn new(value: Deferred<Value>) -> Self {
        Self { value }
    }

    pub fn settled(result: ClientResult<Value>) -> Self {
        Self {
            value: Deferred::ready(result),
        }
    }

    pub async fn get(&self) -> ClientResult<Value> {
        self.value.get().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_pending_settles_once() {
        let (mut settle, deferred) = Deferred::<u64>::pending();
        let reader = deferred.clone();

        assert!(settle.settle(Ok(3)));
        assert!(!settle.settle(Ok(4)));
        assert!(settle.is_settled());
        assert_eq!(deferred.get().await, Ok(3));
        assert_eq!(reader.get().await, Ok(3));
        assert_eq!(reader.peek(), Some(Ok(3)));
    }

    #[tokio::test]
    async fn test_dropped_settle_rejects() {
        let (settle, deferred) = Deferred::<u64>::pending();
        drop(settle);
        assert_eq!(deferred.get().await, Err(ClientError::Dropped));
    }

    #[tokio::test]
    async fn test_settled_collection_has_three_views() {
        let result = CollectionResult::settled(Ok(5), vec![json!(1), json!(2)]);

        assert_eq!(result.count().await, Ok(5));
        assert_eq!(result.data().await.unwrap(), vec![json!(1), json!(2)]);
        assert_eq!(
            result.iter().try_collect().await.unwrap(),
            vec![json!(1), json!(2)]
        );
        assert!(result.queue().is_ended());
    }
}
