//! # Entity Keys
//!
//! Single and composite keys addressing one entity of a set.

use std::fmt;

use serde_json::Value;

use crate::errors::{ClientError, ClientResult};
use crate::expr::Constant;

/// Separator between the encoded parts of a composite key
const KEY_SEPARATOR: &str = ",";

/// Key of a single entity
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKey {
    /// Single-property key, rendered `('x')`
    Single(Constant),

    /// Named key parts, rendered `(A=1,B='x')`
    Composite(Vec<(String, Constant)>),
}

impl EntityKey {
    pub fn single(value: impl Into<Constant>) -> Self {
        EntityKey::Single(value.into())
    }

    pub fn composite<I, K, V>(parts: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Constant>,
    {
        EntityKey::Composite(
            parts
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Key values ordered by `key_fields`
    ///
    /// A single key needs exactly one key field; a composite key must name
    /// every key field.
    pub fn values_for(&self, key_fields: &[String]) -> ClientResult<Vec<Value>> {
        match self {
            EntityKey::Single(value) if key_fields.len() == 1 => Ok(vec![value.to_value()]),
            EntityKey::Single(_) => Err(ClientError::Configuration(format!(
                "single key given for {} key fields",
                key_fields.len()
            ))),
            EntityKey::Composite(parts) => key_fields
                .iter()
                .map(|field| {
                    parts
                        .iter()
                        .find(|(name, _)| name == field)
                        .map(|(_, value)| value.to_value())
                        .ok_or_else(|| {
                            ClientError::Configuration(format!("key part missing: {}", field))
                        })
                })
                .collect(),
        }
    }

    /// Encodes key values into one unambiguous lookup string.
    ///
    /// Each part is JSON-encoded so separators inside string parts stay quoted.
    pub fn canonical(values: &[Value]) -> String {
        values
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(KEY_SEPARATOR)
    }

    /// URL path segment for this key
    pub fn to_segment(&self) -> ClientResult<String> {
        match self {
            EntityKey::Single(value) => Ok(format!("({})", value)),
            EntityKey::Composite(parts) if parts.is_empty() => Err(ClientError::Configuration(
                "composite key has no parts".to_string(),
            )),
            EntityKey::Composite(parts) => {
                let inner = parts
                    .iter()
                    .map(|(name, value)| format!("{}={}", name, value))
                    .collect::<Vec<_>>()
                    .join(",");
                Ok(format!("({})", inner))
            }
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_segment() {
            Ok(segment) => write!(f, "{}", segment),
            Err(_) => write!(f, "()"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_segments() {
        assert_eq!(EntityKey::single("ab'c").to_segment().unwrap(), "('ab''c')");
        assert_eq!(EntityKey::single(7).to_segment().unwrap(), "(7)");
        assert_eq!(
            EntityKey::composite([("OrderId", Constant::Int(1)), ("Sku", Constant::from("x"))])
                .to_segment()
                .unwrap(),
            "(OrderId=1,Sku='x')"
        );
        assert!(EntityKey::Composite(Vec::new()).to_segment().is_err());
    }

    #[test]
    fn test_values_follow_key_field_order() {
        let key = EntityKey::composite([("b", 2), ("a", 1)]);
        assert_eq!(
            key.values_for(&fields(&["a", "b"])).unwrap(),
            vec![json!(1), json!(2)]
        );
        assert!(key.values_for(&fields(&["a", "c"])).is_err());
    }

    #[test]
    fn test_single_key_needs_one_field() {
        let key = EntityKey::single(1);
        assert!(key.values_for(&fields(&["id"])).is_ok());
        assert!(matches!(
            key.values_for(&fields(&["a", "b"])),
            Err(ClientError::Configuration(_))
        ));
    }

    #[test]
    fn test_canonical_is_unambiguous() {
        let joined = EntityKey::canonical(&[json!("a,b"), json!("c")]);
        let split = EntityKey::canonical(&[json!("a"), json!("b,c")]);
        assert_ne!(joined, split);
        assert_eq!(EntityKey::canonical(&[json!(1), json!("x")]), "1,\"x\"");
    }
}
