//! # Mock Execution Engine
//!
//! Answers queries from an in-memory dataset the way a conforming service
//! would, wrapped in the same result types as the streaming worker.
//!
//! ## Pipeline
//! filter, count, sort, page, project. Counting sits after filtering and
//! before paging so `count` reports every match.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use super::result::{CollectionResult, SingleResult};
use super::sorter::ResultSorter;
use super::Executor;
use crate::errors::{ClientError, ClientResult};
use crate::query::{EntityKey, QueryOptions, DEFAULT_TOP};

/// Source of the records a mock engine queries
pub trait Dataset: Send + Sync {
    fn records(&self) -> Vec<Value>;
}

impl<F> Dataset for F
where
    F: Fn() -> Vec<Value> + Send + Sync,
{
    fn records(&self) -> Vec<Value> {
        self()
    }
}

/// In-memory executor
#[derive(Clone)]
pub struct MockEngine {
    dataset: Arc<dyn Dataset>,
    key_fields: Vec<String>,
    default_top: usize,
}

impl MockEngine {
    /// Engine over a fixed set of records keyed by `id`
    pub fn new(records: Vec<Value>) -> Self {
        Self::from_dataset(move || records.clone())
    }

    /// Engine reading records from `dataset` on every execution
    pub fn from_dataset(dataset: impl Dataset + 'static) -> Self {
        Self {
            dataset: Arc::new(dataset),
            key_fields: vec!["id".to_string()],
            default_top: DEFAULT_TOP,
        }
    }

    /// Fields forming the entity key, in key order
    pub fn with_key_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Page size used when a query has no `top`
    pub fn with_default_top(mut self, default_top: usize) -> Self {
        self.default_top = default_top;
        self
    }

    /// Runs the pipeline, returning the count (when requested) and the page
    pub fn run(&self, options: &QueryOptions) -> (Option<u64>, Vec<Value>) {
        let records = self.dataset.records();
        let total = records.len();
        let (count, page) = apply(records, options, Some(self.default_top));

        debug!(
            total,
            matched = count,
            returned = page.len(),
            "mock collection executed"
        );

        (options.count.then_some(count as u64), page)
    }

    /// Finds the record whose key fields equal `key`
    pub fn lookup(&self, key: &EntityKey) -> ClientResult<Value> {
        let wanted = EntityKey::canonical(&key.values_for(&self.key_fields)?);
        self.find(&wanted)
            .ok_or_else(|| ClientError::NotFound(key.to_string()))
    }

    fn find(&self, canonical: &str) -> Option<Value> {
        self.dataset
            .records()
            .into_iter()
            .find(|record| self.canonical_key(record) == canonical)
    }

    fn canonical_key(&self, record: &Value) -> String {
        let values: Vec<Value> = self
            .key_fields
            .iter()
            .map(|field| record.get(field).cloned().unwrap_or(Value::Null))
            .collect();
        EntityKey::canonical(&values)
    }
}

impl Executor for MockEngine {
    fn execute_collection(&self, options: &QueryOptions) -> ClientResult<CollectionResult> {
        let (count, page) = self.run(options);
        let count = count.ok_or(ClientError::CountUnavailable);
        Ok(CollectionResult::settled(count, page))
    }

    fn execute_single(&self, key: &EntityKey, options: &QueryOptions) -> ClientResult<SingleResult> {
        let wanted = EntityKey::canonical(&key.values_for(&self.key_fields)?);
        let result = self
            .find(&wanted)
            .map(|record| project(record, options))
            .ok_or_else(|| ClientError::NotFound(key.to_string()));

        debug!(key = %key, found = result.is_ok(), "mock single executed");
        Ok(SingleResult::settled(result))
    }
}

/// Filter, count, sort, page and project `records`.
///
/// Returns the post-filter count with the projected page.
fn apply(records: Vec<Value>, options: &QueryOptions, default_top: Option<usize>) -> (usize, Vec<Value>) {
    let mut matched: Vec<Value> = records
        .into_iter()
        .filter(|record| options.filter.iter().all(|f| f.matches(record)))
        .collect();
    let count = matched.len();

    ResultSorter::sort(&mut matched, &options.order_by);

    let page = matched
        .into_iter()
        .skip(options.skip.unwrap_or(0))
        .take(options.top.or(default_top).unwrap_or(usize::MAX))
        .map(|record| project(record, options))
        .collect();

    (count, page)
}

/// Applies select and the nested options of each expanded property
fn project(record: Value, options: &QueryOptions) -> Value {
    let Value::Object(mut object) = record else {
        return record;
    };

    for expand in &options.expand {
        if let Some(nested) = object.get_mut(&expand.property) {
            *nested = match nested.take() {
                // Expanded collections are not paged unless asked to
                Value::Array(items) => Value::Array(apply(items, &expand.options, None).1),
                other => project(other, &expand.options),
            };
        }
    }

    let Some(fields) = options.selected() else {
        return Value::Object(object);
    };

    let keep = fields
        .iter()
        .chain(options.expand.iter().map(|e| &e.property));
    let mut projected = Map::new();
    for field in keep {
        if let Some(value) = object.remove(field) {
            projected.insert(field.clone(), value);
        }
    }
    Value::Object(projected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{prop, Constant};
    use crate::query::{Expand, OrderBy};
    use serde_json::json;

    fn people() -> MockEngine {
        MockEngine::new(vec![
            json!({"id": 1, "name": "Carol", "age": 30}),
            json!({"id": 2, "name": "alice", "age": 25}),
            json!({"id": 3, "name": "Bob", "age": 35}),
        ])
    }

    #[test]
    fn test_filter_count_sort_page_project() {
        let options = QueryOptions::new()
            .with_filter(prop("age").ge(30))
            .with_order_by(OrderBy::desc("name"))
            .with_top(2)
            .with_select(["id"])
            .with_count();

        let (count, page) = people().run(&options);

        assert_eq!(count, Some(2));
        assert_eq!(page, vec![json!({"id": 1}), json!({"id": 3})]);
    }

    #[test]
    fn test_count_only_when_requested() {
        let (count, page) = people().run(&QueryOptions::new());
        assert_eq!(count, None);
        assert_eq!(page.len(), 3);
    }

    #[test]
    fn test_default_top_applies() {
        let records = (0..150).map(|i| json!({"id": i})).collect();
        let engine = MockEngine::new(records);
        let (count, page) = engine.run(&QueryOptions::new().with_count());
        assert_eq!(count, Some(150));
        assert_eq!(page.len(), 100);

        let (_, page) = engine.with_default_top(10).run(&QueryOptions::new().with_skip(145));
        assert_eq!(page.len(), 5);
    }

    #[test]
    fn test_case_insensitive_order() {
        let (_, page) = people().run(&QueryOptions::new().with_order_by(OrderBy::asc("name")));
        let names: Vec<&str> = page.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["alice", "Bob", "Carol"]);
    }

    #[test]
    fn test_expanded_collection_gets_nested_options() {
        let engine = MockEngine::new(vec![json!({
            "id": 1,
            "name": "Ann",
            "orders": [
                {"id": 10, "total": 50},
                {"id": 11, "total": 150},
                {"id": 12, "total": 250}
            ],
            "manager": {"id": 9, "name": "Max"}
        })]);
        let options = QueryOptions::new()
            .with_select(["id"])
            .with_expand(Expand {
                property: "orders".into(),
                options: QueryOptions::new()
                    .with_filter(prop("total").gt(100))
                    .with_order_by(OrderBy::desc("total"))
                    .with_select(["id"]),
            })
            .with_expand(Expand {
                property: "manager".into(),
                options: QueryOptions::new().with_select(["name"]),
            });

        let (_, page) = engine.run(&options);

        assert_eq!(
            page,
            vec![json!({
                "id": 1,
                "orders": [{"id": 12}, {"id": 11}],
                "manager": {"name": "Max"}
            })]
        );
    }

    #[test]
    fn test_lookup_composite_key() {
        let engine = MockEngine::new(vec![
            json!({"order": 1, "sku": "a,b", "qty": 1}),
            json!({"order": 1, "sku": "c", "qty": 2}),
        ])
        .with_key_fields(["order", "sku"]);

        let key = EntityKey::composite([("sku", Constant::from("c")), ("order", Constant::Int(1))]);
        assert_eq!(engine.lookup(&key).unwrap()["qty"], 2);

        let missing = EntityKey::composite([("order", Constant::Int(2)), ("sku", Constant::from("c"))]);
        assert!(matches!(engine.lookup(&missing), Err(ClientError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_execute_single_projects() {
        let result = people()
            .execute_single(&EntityKey::single(2), &QueryOptions::new().with_select(["name"]))
            .unwrap();
        assert_eq!(result.get().await.unwrap(), json!({"name": "alice"}));

        let missing = people()
            .execute_single(&EntityKey::single(99), &QueryOptions::new())
            .unwrap();
        assert!(matches!(missing.get().await, Err(ClientError::NotFound(_))));
    }

    #[test]
    fn test_key_shape_mismatch_is_synchronous() {
        let result = people().execute_single(
            &EntityKey::composite([("id", 1), ("other", 2)]),
            &QueryOptions::new(),
        );
        assert!(result.is_ok());

        let engine = people().with_key_fields(["id", "name"]);
        let result = engine.execute_single(&EntityKey::single(1), &QueryOptions::new());
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }

    #[test]
    fn test_dataset_is_read_per_execution() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let engine = MockEngine::from_dataset(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            vec![json!({"id": 1})]
        });

        engine.run(&QueryOptions::new());
        engine.run(&QueryOptions::new());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
