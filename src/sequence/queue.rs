//! # Sequence Queue
//!
//! Append-only log fed by one producer and read by any number of cursors.
//! Each cursor keeps its own position and replays the log from the start.
//!
//! ## Lifecycle
//! Open, then `push` any number of times, then exactly one of `complete` or
//! `fail`. Both are terminal; further producer calls return
//! [`SequenceError::Ended`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::stream::{self, Stream};
use tokio::sync::Notify;

use super::errors::{SequenceError, SequenceResult};
use crate::errors::ClientError;

#[derive(Debug)]
struct State<T, E> {
    items: Vec<T>,
    ended: bool,
    error: Option<E>,
}

#[derive(Debug)]
struct Inner<T, E> {
    state: Mutex<State<T, E>>,
    notify: Notify,
}

impl<T, E> Inner<T, E> {
    fn lock(&self) -> MutexGuard<'_, State<T, E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Push-to-pull bridge between a producer and lazy consumers
#[derive(Debug)]
pub struct SequenceQueue<T, E = ClientError> {
    inner: Arc<Inner<T, E>>,
}

impl<T, E> Clone for SequenceQueue<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E> Default for SequenceQueue<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> SequenceQueue<T, E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    items: Vec::new(),
                    ended: false,
                    error: None,
                }),
                notify: Notify::new(),
            }),
        }
    }

    /// Appends an item and wakes waiting cursors
    pub fn push(&self, item: T) -> SequenceResult<()> {
        {
            let mut state = self.inner.lock();
            if state.ended {
                return Err(SequenceError::Ended);
            }
            state.items.push(item);
        }
        self.inner.notify.notify_waiters();
        Ok(())
    }

    /// Ends the sequence normally
    pub fn complete(&self) -> SequenceResult<()> {
        self.end(None)
    }

    /// Ends the sequence with `error`; cursors yield it after draining
    pub fn fail(&self, error: E) -> SequenceResult<()> {
        self.end(Some(error))
    }

    fn end(&self, error: Option<E>) -> SequenceResult<()> {
        {
            let mut state = self.inner.lock();
            if state.ended {
                return Err(SequenceError::Ended);
            }
            state.ended = true;
            state.error = error;
        }
        self.inner.notify.notify_waiters();
        Ok(())
    }

    pub fn is_ended(&self) -> bool {
        self.inner.lock().ended
    }

    /// Number of items pushed so far
    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A new consumer positioned at the first item
    pub fn cursor(&self) -> SequenceCursor<T, E> {
        SequenceCursor {
            inner: Arc::clone(&self.inner),
            position: 0,
            finished: false,
        }
    }
}

/// Independent read position over a [`SequenceQueue`]
#[derive(Debug)]
pub struct SequenceCursor<T, E = ClientError> {
    inner: Arc<Inner<T, E>>,
    position: usize,
    finished: bool,
}

impl<T: Clone, E: Clone> SequenceCursor<T, E> {
    /// Next item, waiting while the queue is open.
    ///
    /// Returns `None` once the queue completed and every item was read. A
    /// failed queue yields its error once, then `None`.
    pub async fn next(&mut self) -> Option<Result<T, E>> {
        if self.finished {
            return None;
        }

        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register before inspecting state so a push in between is not lost
            notified.as_mut().enable();

            {
                let state = self.inner.lock();
                if let Some(item) = state.items.get(self.position) {
                    self.position += 1;
                    return Some(Ok(item.clone()));
                }
                if state.ended {
                    self.finished = true;
                    return state.error.clone().map(Err);
                }
            }

            notified.await;
        }
    }

    /// Reads the remaining items, stopping at the first error
    pub async fn try_collect(mut self) -> Result<Vec<T>, E> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await {
            items.push(item?);
        }
        Ok(items)
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<T, E>> {
        stream::unfold(self, |mut cursor| async move {
            cursor.next().await.map(|item| (item, cursor))
        })
    }
}
