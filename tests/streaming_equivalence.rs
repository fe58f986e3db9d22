//! Streaming Worker Tests
//!
//! Tests for the streaming worker:
//! - a complete body and the same body in chunks give identical results
//! - failures reject count, data and the item sequence together
//! - a body without a count rejects only the count

use std::sync::Arc;

use odatakit::execution::{CollectionResult, SelectedFieldsValidator, StreamingWorker};
use odatakit::expr::prop;
use odatakit::query::{EntitySet, OrderBy};
use odatakit::transport::{ScriptedReply, ScriptedTransport};
use odatakit::{ClientConfig, ClientError};
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn body() -> Value {
    json!({
        "@odata.context": "$metadata#People",
        "@odata.count": 42,
        "value": [
            {"id": 1, "name": "Ann \"the first\", [x]", "tags": ["a b", " "]},
            {"id": 2, "name": "Bo", "address": {"city": "Oslo", "zip": null}},
            {"id": 3, "name": "Cy", "score": 1.5}
        ]
    })
}

/// Splits `text` into fixed-size chunks with empty ones mixed in
fn split(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    for (i, piece) in chars.chunks(size).enumerate() {
        if i % 3 == 0 {
            chunks.push(String::new());
        }
        chunks.push(piece.iter().collect());
    }
    chunks
}

fn chunked(body: &Value, size: usize) -> Vec<String> {
    split(&body.to_string(), size)
}

fn people(transport: ScriptedTransport) -> EntitySet<StreamingWorker> {
    let worker = StreamingWorker::new(
        Arc::new(transport),
        ClientConfig::with_base_url("http://svc/odata"),
        "People",
    );
    EntitySet::new(Arc::new(worker))
}

async fn outcome(result: &CollectionResult) -> (Result<u64, ClientError>, Vec<Value>, Vec<Value>) {
    let count = result.count().await;
    let data = result.data().await.unwrap();
    let items = result.iter().try_collect().await.unwrap();
    (count, data, items)
}

// =============================================================================
// Equivalence Tests
// =============================================================================

/// Complete and chunked deliveries agree on count, data and items.
#[tokio::test]
async fn test_complete_and_chunked_agree() {
    let complete = people(ScriptedTransport::complete(body()))
        .count()
        .execute()
        .unwrap();
    let expected = outcome(&complete).await;

    assert_eq!(expected.0, Ok(42));
    assert_eq!(expected.1.len(), 3);
    assert_eq!(expected.1, expected.2);

    for size in [1, 2, 7, 64, 10_000] {
        let streamed = people(ScriptedTransport::chunks(chunked(&body(), size)))
            .count()
            .execute()
            .unwrap();
        assert_eq!(outcome(&streamed).await, expected, "chunk size {}", size);
    }
}

/// Whitespace between tokens and inside strings survives any chunking.
#[tokio::test]
async fn test_pretty_body_in_chunks() {
    let pretty = serde_json::to_string_pretty(&body()).unwrap();
    let expected = body()["value"].as_array().unwrap().clone();

    for size in [1, 3, 16] {
        let result = people(ScriptedTransport::chunks(split(&pretty, size)))
            .execute()
            .unwrap();
        assert_eq!(result.data().await.unwrap(), expected, "chunk size {}", size);
    }
}

/// Items reach a cursor started before the response arrives.
#[tokio::test]
async fn test_cursor_started_early() {
    let result = people(ScriptedTransport::chunks(chunked(&body(), 5)))
        .execute()
        .unwrap();

    let mut cursor = result.iter();
    let mut ids = Vec::new();
    while let Some(item) = cursor.next().await {
        ids.push(item.unwrap()["id"].as_i64().unwrap());
    }

    assert_eq!(ids, vec![1, 2, 3]);
}

/// The request carries the rendered options.
#[tokio::test]
async fn test_request_carries_query() {
    let transport = ScriptedTransport::complete(body());
    people(transport.clone())
        .filter(prop("name").starts_with("A"))
        .order_by(OrderBy::desc("id"))
        .top(3)
        .execute()
        .unwrap()
        .data()
        .await
        .unwrap();

    let request = &transport.requests()[0];
    assert_eq!(request.url, "http://svc/odata/People");
    assert_eq!(
        request.query,
        vec![
            ("$filter".to_string(), "startswith(name,'A')".to_string()),
            ("$orderby".to_string(), "id desc".to_string()),
            ("$top".to_string(), "3".to_string()),
        ]
    );
}

// =============================================================================
// Count Tests
// =============================================================================

/// Missing count rejects count while data resolves.
#[tokio::test]
async fn test_missing_count() {
    let body = json!({"value": [{"id": 1}]});

    for transport in [
        ScriptedTransport::complete(body.clone()),
        ScriptedTransport::chunks(chunked(&body, 3)),
    ] {
        let result = people(transport).count().execute().unwrap();
        assert_eq!(result.count().await, Err(ClientError::CountUnavailable));
        assert_eq!(result.data().await.unwrap(), vec![json!({"id": 1})]);
    }
}

// =============================================================================
// Failure Tests
// =============================================================================

/// A validator rejection fails every view in both delivery modes.
#[tokio::test]
async fn test_validation_failure_rejects_everything() {
    for transport in [
        ScriptedTransport::complete(body()),
        ScriptedTransport::chunks(chunked(&body(), 4)),
    ] {
        let worker = StreamingWorker::new(
            Arc::new(transport),
            ClientConfig::default(),
            "People",
        )
        .with_validator(SelectedFieldsValidator);
        let result = EntitySet::new(Arc::new(worker))
            .select(["id", "address"])
            .execute()
            .unwrap();

        let expected = ClientError::Validation("missing field: address".to_string());
        assert_eq!(result.count().await, Err(expected.clone()));
        assert_eq!(result.data().await, Err(expected.clone()));

        let mut cursor = result.iter();
        let mut last = None;
        while let Some(item) = cursor.next().await {
            last = Some(item);
        }
        assert_eq!(last, Some(Err(expected)));
    }
}

/// A malformed chunked body fails with a decode error.
#[tokio::test]
async fn test_decode_failure() {
    let result = people(ScriptedTransport::chunks([r#"{"value":[{"id":1},"#, "oops]}"]))
        .execute()
        .unwrap();

    assert!(matches!(result.data().await, Err(ClientError::Decode(_))));
    assert!(matches!(
        result.iter().try_collect().await,
        Err(ClientError::Decode(_))
    ));
}

/// A transport failure before any response rejects everything.
#[tokio::test]
async fn test_transport_failure() {
    let transport = ScriptedTransport::new(|_| {
        ScriptedReply::Failure(ClientError::Transport("refused".to_string()))
    });
    let result = people(transport).count().execute().unwrap();

    let expected = ClientError::Transport("refused".to_string());
    assert_eq!(result.count().await, Err(expected.clone()));
    assert_eq!(result.data().await, Err(expected));
}
