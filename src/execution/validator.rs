//! Per-item validation hook for the streaming worker.

use serde_json::Value;

use crate::query::SelectExpandShape;

/// Checks (and may rewrite) each received item.
///
/// Returning `Err` fails the whole execution with
/// [`ClientError::Validation`](crate::errors::ClientError::Validation).
pub trait ItemValidator: Send + Sync {
    fn validate(&self, item: Value, shape: &SelectExpandShape) -> Result<Value, String>;
}

impl<F> ItemValidator for F
where
    F: Fn(Value, &SelectExpandShape) -> Result<Value, String> + Send + Sync,
{
    fn validate(&self, item: Value, shape: &SelectExpandShape) -> Result<Value, String> {
        self(item, shape)
    }
}

/// Requires every item to be an object carrying each selected field and
/// each expanded property
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectedFieldsValidator;

impl ItemValidator for SelectedFieldsValidator {
    fn validate(&self, item: Value, shape: &SelectExpandShape) -> Result<Value, String> {
        let Some(object) = item.as_object() else {
            return Err(format!("expected an object, got {}", item));
        };

        let selected = shape.select.iter().flatten();
        let expanded = shape.expand.keys();
        if let Some(missing) = selected.chain(expanded).find(|f| !object.contains_key(*f)) {
            return Err(format!("missing field: {}", missing));
        }

        Ok(item)
    }
}
