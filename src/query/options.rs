//! # Query Options
//!
//! The immutable record of everything a caller asked for. Every `with_*`
//! method returns a new value carrying the previous options plus the delta.

use crate::expr::Expr;

/// Page size the mock engine applies when no `top` was requested
pub const DEFAULT_TOP: usize = 100;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Order by clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub property: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// An expanded navigation property and the options applied to it
#[derive(Debug, Clone, PartialEq)]
pub struct Expand {
    pub property: String,
    pub options: QueryOptions,
}

impl Expand {
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            options: QueryOptions::default(),
        }
    }
}

/// Requested query shape
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    /// Ask the service for the total count
    pub count: bool,

    /// Filters, AND-combined when rendered
    pub filter: Vec<Expr>,

    /// Ordering in priority order
    pub order_by: Vec<OrderBy>,

    /// Fields to select (None = all)
    pub select: Option<Vec<String>>,

    /// Number of records to skip
    pub skip: Option<usize>,

    /// Number of records to return
    pub top: Option<usize>,

    /// Expanded navigation properties
    pub expand: Vec<Expand>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no option is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn with_count(&self) -> Self {
        Self {
            count: true,
            ..self.clone()
        }
    }

    /// Adds a filter; all filters must hold
    pub fn with_filter(&self, filter: Expr) -> Self {
        let mut next = self.clone();
        next.filter.push(filter);
        next
    }

    /// Replaces any prior ordering
    pub fn with_order_by(&self, order: OrderBy) -> Self {
        Self {
            order_by: vec![order],
            ..self.clone()
        }
    }

    /// Appends a lower-priority ordering
    pub fn with_then_by(&self, order: OrderBy) -> Self {
        let mut next = self.clone();
        next.order_by.push(order);
        next
    }

    /// Replaces any prior selection.
    ///
    /// Selections do not accumulate: the projected shape always matches the
    /// most recent call. An empty list clears the selection.
    pub fn with_select<I, S>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        Self {
            select: (!fields.is_empty()).then_some(fields),
            ..self.clone()
        }
    }

    /// The selection, if it names at least one field
    pub fn selected(&self) -> Option<&[String]> {
        self.select.as_deref().filter(|fields| !fields.is_empty())
    }

    pub fn with_skip(&self, skip: usize) -> Self {
        Self {
            skip: Some(skip),
            ..self.clone()
        }
    }

    pub fn with_top(&self, top: usize) -> Self {
        Self {
            top: Some(top),
            ..self.clone()
        }
    }

    /// Adds an expansion, replacing an earlier one for the same property
    pub fn with_expand(&self, expand: Expand) -> Self {
        let mut next = self.clone();
        match next.expand.iter_mut().find(|e| e.property == expand.property) {
            Some(existing) => *existing = expand,
            None => next.expand.push(expand),
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::prop;

    #[test]
    fn test_updates_leave_original_untouched() {
        let base = QueryOptions::new().with_top(5);
        let next = base.with_skip(10).with_count();

        assert_eq!(base.skip, None);
        assert!(!base.count);
        assert_eq!(next.top, Some(5));
        assert_eq!(next.skip, Some(10));
        assert!(next.count);
    }

    #[test]
    fn test_order_by_replaces_then_by_appends() {
        let options = QueryOptions::new()
            .with_order_by(OrderBy::asc("a"))
            .with_then_by(OrderBy::desc("b"))
            .with_order_by(OrderBy::asc("c"))
            .with_then_by(OrderBy::asc("d"));

        assert_eq!(options.order_by, vec![OrderBy::asc("c"), OrderBy::asc("d")]);
    }

    #[test]
    fn test_select_replaces() {
        let options = QueryOptions::new().with_select(["a", "b"]).with_select(["c"]);
        assert_eq!(options.select, Some(vec!["c".to_string()]));
    }

    #[test]
    fn test_empty_select_clears() {
        let options = QueryOptions::new()
            .with_select(["a"])
            .with_select(Vec::<String>::new());
        assert_eq!(options.select, None);

        let direct = QueryOptions {
            select: Some(Vec::new()),
            ..QueryOptions::default()
        };
        assert_eq!(direct.selected(), None);
    }

    #[test]
    fn test_filters_accumulate() {
        let options = QueryOptions::new()
            .with_filter(prop("a").equals(1))
            .with_filter(prop("b").equals(2));
        assert_eq!(options.filter.len(), 2);
    }

    #[test]
    fn test_expand_same_property_replaces() {
        let options = QueryOptions::new()
            .with_expand(Expand::new("Orders"))
            .with_expand(Expand {
                property: "Orders".into(),
                options: QueryOptions::new().with_top(1),
            });
        assert_eq!(options.expand.len(), 1);
        assert_eq!(options.expand[0].options.top, Some(1));
    }

    #[test]
    fn test_is_empty() {
        assert!(QueryOptions::new().is_empty());
        assert!(!QueryOptions::new().with_count().is_empty());
    }
}
