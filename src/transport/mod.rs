//! # Transport Contract
//!
//! The adapter the streaming worker talks to. An adapter takes a resolved
//! request and returns a status plus either the whole decoded body or a
//! lazy stream of raw text chunks.

mod scripted;

use std::fmt;

use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use serde_json::Value;

use crate::errors::ClientResult;

pub use scripted::{ScriptedReply, ScriptedTransport};

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved request
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Raw text chunks of a response body
pub type ChunkStream = BoxStream<'static, ClientResult<String>>;

/// Response body as the adapter delivers it
pub enum ResponseBody {
    /// Whole body, already decoded
    Complete(Value),

    /// Body still arriving
    Chunks(ChunkStream),
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Complete(value) => f.debug_tuple("Complete").field(value).finish(),
            ResponseBody::Chunks(_) => f.write_str("Chunks(..)"),
        }
    }
}

#[derive(Debug)]
pub struct TransportResponse {
    pub status: u16,
    pub body: ResponseBody,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Adapter performing the network exchange
pub trait Transport: Send + Sync {
    fn invoke(&self, request: TransportRequest) -> BoxFuture<'_, ClientResult<TransportResponse>>;
}
