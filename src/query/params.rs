//! # Protocol Parameter Serializer
//!
//! Maps [`QueryOptions`] to `$`-prefixed protocol query parameters.

use crate::expr::Expr;

use super::options::{Expand, QueryOptions};

/// Separator between list entries in `$orderby`, `$select` and `$expand`
const LIST_SEPARATOR: &str = ", ";

/// Separator between sub-options inside an expansion
const NESTED_SEPARATOR: &str = "; ";

/// Renders options as protocol parameters.
///
/// A key is emitted only when its option is present, always in the order
/// `$count`, `$filter`, `$orderby`, `$select`, `$skip`, `$top`, `$expand`.
pub fn to_query_params(options: &QueryOptions) -> Vec<(String, String)> {
    let mut params = Vec::new();

    if options.count {
        params.push(("$count".to_string(), "true".to_string()));
    }

    if let Some(filter) = Expr::and_all(options.filter.iter().cloned()) {
        params.push(("$filter".to_string(), filter.to_string()));
    }

    if !options.order_by.is_empty() {
        let order = options
            .order_by
            .iter()
            .map(|o| format!("{} {}", o.property, o.direction.as_str()))
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR);
        params.push(("$orderby".to_string(), order));
    }

    if let Some(select) = options.selected() {
        params.push(("$select".to_string(), select.join(LIST_SEPARATOR)));
    }

    if let Some(skip) = options.skip {
        params.push(("$skip".to_string(), skip.to_string()));
    }

    if let Some(top) = options.top {
        params.push(("$top".to_string(), top.to_string()));
    }

    if !options.expand.is_empty() {
        let expand = options
            .expand
            .iter()
            .map(render_expand)
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR);
        params.push(("$expand".to_string(), expand));
    }

    params
}

/// `property` or `property(<nested options>)`
fn render_expand(expand: &Expand) -> String {
    let nested = to_query_params(&expand.options);
    if nested.is_empty() {
        return expand.property.clone();
    }

    let inner = nested
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(NESTED_SEPARATOR);
    format!("{}({})", expand.property, inner)
}

/// Renders parameters as a query string (values left unencoded)
pub fn to_query_string(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::prop;
    use crate::query::options::OrderBy;

    fn get<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_empty_options_emit_nothing() {
        assert!(to_query_params(&QueryOptions::new()).is_empty());
    }

    #[test]
    fn test_empty_select_emits_nothing() {
        let direct = QueryOptions {
            select: Some(Vec::new()),
            ..QueryOptions::new()
        };
        assert!(to_query_params(&direct).is_empty());

        let cleared = QueryOptions::new().with_select(Vec::<String>::new());
        assert!(to_query_params(&cleared).is_empty());
    }

    #[test]
    fn test_single_filter_renders_bare() {
        let options = QueryOptions::new().with_filter(prop("Age").ge(30));
        let params = to_query_params(&options);
        assert_eq!(get(&params, "$filter"), Some("Age ge 30"));
    }

    #[test]
    fn test_multiple_filters_and_combined() {
        let options = QueryOptions::new()
            .with_filter(prop("Age").ge(30))
            .with_filter(prop("Name").starts_with("A"));
        let params = to_query_params(&options);
        assert_eq!(
            get(&params, "$filter"),
            Some("(Age ge 30 and startswith(Name,'A'))")
        );
    }

    #[test]
    fn test_all_options_in_order() {
        let options = QueryOptions::new()
            .with_top(10)
            .with_skip(20)
            .with_select(["Id", "Name"])
            .with_order_by(OrderBy::desc("Name"))
            .with_then_by(OrderBy::asc("Id"))
            .with_count();
        let params = to_query_params(&options);

        let keys: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["$count", "$orderby", "$select", "$skip", "$top"]);
        assert_eq!(get(&params, "$count"), Some("true"));
        assert_eq!(get(&params, "$orderby"), Some("Name desc, Id asc"));
        assert_eq!(get(&params, "$select"), Some("Id, Name"));
        assert_eq!(get(&params, "$skip"), Some("20"));
        assert_eq!(get(&params, "$top"), Some("10"));
    }

    #[test]
    fn test_expand_with_nested_options() {
        let nested = QueryOptions::new()
            .with_filter(prop("Total").gt(100))
            .with_order_by(OrderBy::desc("Total"));
        let options = QueryOptions::new()
            .with_expand(Expand {
                property: "Orders".into(),
                options: nested,
            })
            .with_expand(Expand::new("Manager"));
        let params = to_query_params(&options);

        assert_eq!(
            get(&params, "$expand"),
            Some("Orders($filter=Total gt 100; $orderby=Total desc), Manager")
        );
    }

    #[test]
    fn test_deeply_nested_expand() {
        let lines = Expand {
            property: "Lines".into(),
            options: QueryOptions::new().with_select(["Qty"]),
        };
        let orders = Expand {
            property: "Orders".into(),
            options: QueryOptions::new().with_top(2).with_expand(lines),
        };
        let params = to_query_params(&QueryOptions::new().with_expand(orders));
        assert_eq!(
            get(&params, "$expand"),
            Some("Orders($top=2; $expand=Lines($select=Qty))")
        );
    }

    #[test]
    fn test_query_string() {
        let params = to_query_params(&QueryOptions::new().with_top(1).with_count());
        assert_eq!(to_query_string(&params), "$count=true&$top=1");
    }
}
