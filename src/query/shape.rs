//! # Select/Expand Shape
//!
//! The requested result shape handed to item validators.

use std::collections::BTreeMap;

use super::options::QueryOptions;

/// Fields and nested relations a caller asked for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectExpandShape {
    /// Selected fields (None = all)
    pub select: Option<Vec<String>>,

    /// Shape of each expanded navigation property
    pub expand: BTreeMap<String, SelectExpandShape>,
}

impl SelectExpandShape {
    /// Projects the select/expand part of `options`
    pub fn from_options(options: &QueryOptions) -> Self {
        Self {
            select: options.selected().map(<[String]>::to_vec),
            expand: options
                .expand
                .iter()
                .map(|e| (e.property.clone(), Self::from_options(&e.options)))
                .collect(),
        }
    }

    /// Whether `field` is part of the requested shape
    pub fn includes(&self, field: &str) -> bool {
        self.expand.contains_key(field)
            || self
                .select
                .as_ref()
                .map_or(true, |fields| fields.iter().any(|f| f == field))
    }
}
