//! Result sorting for the mock engine
//!
//! Multi-key, stable and case-insensitive for strings.

use std::cmp::Ordering;

use serde_json::Value;

use crate::query::{OrderBy, SortDirection};

/// Sorts records by an ordering list
pub struct ResultSorter;

impl ResultSorter {
    /// Sorts records by `order`, earlier entries taking priority.
    ///
    /// Sort is stable: records equal on every key keep their relative order.
    pub fn sort(records: &mut [Value], order: &[OrderBy]) {
        if order.is_empty() {
            return;
        }

        records.sort_by(|a, b| {
            for entry in order {
                let ordering = Self::compare_values(
                    lookup(a, &entry.property),
                    lookup(b, &entry.property),
                );
                let ordering = match entry.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }

    /// Compares two JSON values for sorting.
    ///
    /// Ordering rules:
    /// - missing = null < bool < number < string
    /// - strings compare case-insensitively
    fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        let a = a.unwrap_or(&Value::Null);
        let b = b.unwrap_or(&Value::Null);

        let type_order = |v: &Value| -> u8 {
            match v {
                Value::Null => 0,
                Value::Bool(_) => 1,
                Value::Number(_) => 2,
                Value::String(_) => 3,
                Value::Array(_) => 4,
                Value::Object(_) => 5,
            }
        };

        let a_type = type_order(a);
        let b_type = type_order(b);
        if a_type != b_type {
            return a_type.cmp(&b_type);
        }

        match (a, b) {
            (Value::Bool(a_b), Value::Bool(b_b)) => a_b.cmp(b_b),
            (Value::Number(a_n), Value::Number(b_n)) => {
                let a_f = a_n.as_f64().unwrap_or(0.0);
                let b_f = b_n.as_f64().unwrap_or(0.0);
                a_f.partial_cmp(&b_f).unwrap_or(Ordering::Equal)
            }
            (Value::String(a_s), Value::String(b_s)) => a_s.to_lowercase().cmp(&b_s.to_lowercase()),
            _ => Ordering::Equal,
        }
    }
}

/// Reads a `/`-separated property path off a record
fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('/')
        .try_fold(record, |value, segment| value.get(segment))
}
