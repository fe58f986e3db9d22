//! # Streaming Execution Worker
//!
//! Sends a query through a [`Transport`] and resolves the count, the full
//! array and the live item sequence while the body is still arriving.
//!
//! ## Failure
//! A transport, status, decode or validation failure rejects every result
//! still pending and fails the item sequence. Items already pushed stay
//! visible to cursors that read them.

use std::sync::Arc;

use futures_util::StreamExt;
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

use super::result::{CollectionResult, Deferred, Settle, SingleResult};
use super::validator::ItemValidator;
use super::Executor;
use crate::config::ClientConfig;
use crate::decode::{parse_count, DecodeEvent, IncrementalDecoder};
use crate::errors::{ClientError, ClientResult};
use crate::query::{to_query_params, EntityKey, QueryOptions, SelectExpandShape};
use crate::sequence::SequenceQueue;
use crate::transport::{Method, ResponseBody, Transport, TransportRequest, TransportResponse};

/// Method, resource path and payload of one request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl RequestSpec {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
        }
    }
}

/// Executor backed by a transport
#[derive(Clone)]
pub struct StreamingWorker {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
    resource: String,
    validator: Option<Arc<dyn ItemValidator>>,
}

/// Everything the background task needs
struct Exchange {
    transport: Arc<dyn Transport>,
    request: TransportRequest,
    validator: Option<Arc<dyn ItemValidator>>,
    shape: SelectExpandShape,
}

impl StreamingWorker {
    /// Worker for the entity set at `resource` below the configured root
    pub fn new(transport: Arc<dyn Transport>, config: ClientConfig, resource: impl Into<String>) -> Self {
        Self {
            transport,
            config,
            resource: resource.into(),
            validator: None,
        }
    }

    pub fn with_validator(mut self, validator: impl ItemValidator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Starts a collection request.
    ///
    /// Configuration problems are returned here, before any I/O. Everything
    /// later surfaces through the returned results.
    pub fn execute(&self, spec: RequestSpec, options: &QueryOptions) -> ClientResult<CollectionResult> {
        let (runtime, exchange) = self.prepare(spec, options)?;

        let (count_settle, count) = Deferred::pending();
        let (data_settle, data) = Deferred::pending();
        let queue = SequenceQueue::new();

        let sink = CollectionSink {
            count: count_settle,
            data: data_settle,
            queue: queue.clone(),
            items: Vec::new(),
        };
        runtime.spawn(drive_collection(exchange, sink));

        Ok(CollectionResult::new(count, data, queue))
    }

    /// Starts a single entity request
    pub fn execute_one(&self, spec: RequestSpec, options: &QueryOptions) -> ClientResult<SingleResult> {
        let (runtime, exchange) = self.prepare(spec, options)?;

        let (settle, value) = Deferred::pending();
        runtime.spawn(drive_single(exchange, settle));

        Ok(SingleResult::new(value))
    }

    fn prepare(&self, spec: RequestSpec, options: &QueryOptions) -> ClientResult<(Handle, Exchange)> {
        if let Some(top) = options.top {
            if top > self.config.max_top {
                return Err(ClientError::LimitExceeded(top, self.config.max_top));
            }
        }

        let runtime = Handle::try_current().map_err(|_| {
            ClientError::Configuration("streaming execution needs a tokio runtime".to_string())
        })?;

        let request = TransportRequest {
            method: spec.method,
            url: self.config.url(&spec.path),
            headers: self.config.headers(),
            query: to_query_params(options),
            body: spec.body,
        };

        debug!(
            method = %request.method,
            url = %request.url,
            params = request.query.len(),
            "starting execution"
        );

        Ok((
            runtime,
            Exchange {
                transport: Arc::clone(&self.transport),
                request,
                validator: self.validator.clone(),
                shape: SelectExpandShape::from_options(options),
            },
        ))
    }
}

impl Executor for StreamingWorker {
    fn execute_collection(&self, options: &QueryOptions) -> ClientResult<CollectionResult> {
        self.execute(RequestSpec::get(self.resource.clone()), options)
    }

    fn execute_single(&self, key: &EntityKey, options: &QueryOptions) -> ClientResult<SingleResult> {
        let path = format!("{}{}", self.resource, key.to_segment()?);
        self.execute_one(RequestSpec::get(path), options)
    }
}

impl Exchange {
    fn validate(&self, item: Value) -> ClientResult<Value> {
        match &self.validator {
            Some(validator) => validator
                .validate(item, &self.shape)
                .map_err(ClientError::Validation),
            None => Ok(item),
        }
    }

    /// Invokes the transport and rejects non-success statuses
    async fn send(&self) -> ClientResult<ResponseBody> {
        let TransportResponse { status, body } =
            self.transport.invoke(self.request.clone()).await?;

        if !(200..300).contains(&status) {
            let message = match body {
                ResponseBody::Complete(value) => value.to_string(),
                ResponseBody::Chunks(chunks) => chunks
                    .filter_map(|chunk| async move { chunk.ok() })
                    .collect::<Vec<_>>()
                    .await
                    .concat(),
            };
            return Err(ClientError::Status { status, message });
        }

        Ok(body)
    }
}

/// Producer side of a collection execution
struct CollectionSink {
    count: Settle<u64>,
    data: Settle<Vec<Value>>,
    queue: SequenceQueue<Value>,
    items: Vec<Value>,
}

impl CollectionSink {
    fn count(&mut self, count: u64) {
        if self.count.settle(Ok(count)) {
            trace!(count, "count resolved");
        }
    }

    fn item(&mut self, item: Value) {
        // The sink owns the only producer handle, so the queue is open
        let _ = self.queue.push(item.clone());
        self.items.push(item);
    }

    fn finish(mut self) {
        if !self.count.is_settled() {
            self.count.settle(Err(ClientError::CountUnavailable));
        }
        debug!(items = self.items.len(), "execution complete");
        self.data.settle(Ok(std::mem::take(&mut self.items)));
        let _ = self.queue.complete();
    }

    fn fail(mut self, error: ClientError) {
        warn!(%error, delivered = self.items.len(), "execution failed");
        self.count.settle(Err(error.clone()));
        self.data.settle(Err(error.clone()));
        let _ = self.queue.fail(error);
    }
}

impl Drop for CollectionSink {
    /// A task that dies before settling still ends the item sequence
    fn drop(&mut self) {
        if !self.queue.is_ended() {
            warn!(delivered = self.items.len(), "execution dropped");
            let _ = self.queue.fail(ClientError::Dropped);
        }
    }
}

async fn drive_collection(exchange: Exchange, mut sink: CollectionSink) {
    match receive_collection(&exchange, &mut sink).await {
        Ok(()) => sink.finish(),
        Err(error) => sink.fail(error),
    }
}

async fn receive_collection(exchange: &Exchange, sink: &mut CollectionSink) -> ClientResult<()> {
    match exchange.send().await? {
        ResponseBody::Complete(body) => {
            let count = body.get("@odata.count").map(parse_count).transpose()?;
            let items = match body.get("value") {
                Some(Value::Array(items)) => items.clone(),
                _ => return Err(ClientError::Decode("body has no value array".to_string())),
            };

            // Validate everything before publishing anything
            let items = items
                .into_iter()
                .map(|item| exchange.validate(item))
                .collect::<ClientResult<Vec<_>>>()?;

            if let Some(count) = count {
                sink.count(count);
            }
            for item in items {
                sink.item(item);
            }
        }
        ResponseBody::Chunks(mut chunks) => {
            let mut decoder = IncrementalDecoder::collection();
            while let Some(chunk) = chunks.next().await {
                let chunk = chunk?;
                if chunk.is_empty() {
                    continue;
                }
                for event in decoder.feed(&chunk)? {
                    apply_event(exchange, sink, event)?;
                }
            }
            for event in decoder.finish()? {
                apply_event(exchange, sink, event)?;
            }
        }
    }
    Ok(())
}

fn apply_event(exchange: &Exchange, sink: &mut CollectionSink, event: DecodeEvent) -> ClientResult<()> {
    match event {
        DecodeEvent::Count(count) => sink.count(count),
        DecodeEvent::Item(item) => sink.item(exchange.validate(item)?),
        DecodeEvent::Single(_) => {
            return Err(ClientError::Decode("unexpected single value".to_string()))
        }
    }
    Ok(())
}

async fn drive_single(exchange: Exchange, mut settle: Settle<Value>) {
    let result = receive_single(&exchange).await;
    if let Err(error) = &result {
        warn!(%error, "single execution failed");
    }
    settle.settle(result);
}

async fn receive_single(exchange: &Exchange) -> ClientResult<Value> {
    match exchange.send().await? {
        ResponseBody::Complete(body) => exchange.validate(body),
        ResponseBody::Chunks(mut chunks) => {
            let mut decoder = IncrementalDecoder::single();
            let mut value = None;
            while let Some(chunk) = chunks.next().await {
                let chunk = chunk?;
                if chunk.is_empty() {
                    continue;
                }
                value = value.or(single_value(decoder.feed(&chunk)?));
            }
            value = value.or(single_value(decoder.finish()?));

            let value = value.ok_or_else(|| ClientError::Decode("empty body".to_string()))?;
            exchange.validate(value)
        }
    }
}

fn single_value(events: Vec<DecodeEvent>) -> Option<Value> {
    events.into_iter().find_map(|event| match event {
        DecodeEvent::Single(value) => Some(value),
        _ => None,
    })
}
