//! In-memory transport answering from a script.

use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::BoxFuture;
use futures_util::stream::{self, StreamExt};
use serde_json::Value;

use super::{ResponseBody, Transport, TransportRequest, TransportResponse};
use crate::errors::{ClientError, ClientResult};

/// One scripted reply
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Whole body at once
    Complete { status: u16, body: Value },

    /// Body delivered as chunks, optionally failing after the last one
    Chunks {
        status: u16,
        chunks: Vec<String>,
        error: Option<ClientError>,
    },

    /// The exchange itself fails
    Failure(ClientError),
}

type Responder = dyn Fn(&TransportRequest) -> ScriptedReply + Send + Sync;

/// Transport returning scripted replies and recording every request
#[derive(Clone)]
pub struct ScriptedTransport {
    responder: Arc<Responder>,
    requests: Arc<Mutex<Vec<TransportRequest>>>,
}

impl ScriptedTransport {
    pub fn new(responder: impl Fn(&TransportRequest) -> ScriptedReply + Send + Sync + 'static) -> Self {
        Self {
            responder: Arc::new(responder),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always answers 200 with `body` in one piece
    pub fn complete(body: Value) -> Self {
        Self::new(move |_| ScriptedReply::Complete {
            status: 200,
            body: body.clone(),
        })
    }

    /// Always answers 200 with `chunks`
    pub fn chunks<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let chunks: Vec<String> = chunks.into_iter().map(Into::into).collect();
        Self::new(move |_| ScriptedReply::Chunks {
            status: 200,
            chunks: chunks.clone(),
            error: None,
        })
    }

    /// Requests seen so far
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Transport for ScriptedTransport {
    fn invoke(&self, request: TransportRequest) -> BoxFuture<'_, ClientResult<TransportResponse>> {
        let reply = (self.responder)(&request);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        Box::pin(async move {
            tokio::task::yield_now().await;
            match reply {
                ScriptedReply::Complete { status, body } => Ok(TransportResponse {
                    status,
                    body: ResponseBody::Complete(body),
                }),
                ScriptedReply::Chunks {
                    status,
                    chunks,
                    error,
                } => {
                    let items = chunks
                        .into_iter()
                        .map(Ok)
                        .chain(error.map(Err))
                        .collect::<Vec<_>>();
                    // Yield between chunks so consumers observe partial progress
                    let body = stream::iter(items)
                        .then(|item| async move {
                            tokio::task::yield_now().await;
                            item
                        })
                        .boxed();
                    Ok(TransportResponse {
                        status,
                        body: ResponseBody::Chunks(body),
                    })
                }
                ScriptedReply::Failure(error) => Err(error),
            }
        })
    }
}
