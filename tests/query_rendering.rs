//! Query Rendering Tests
//!
//! Tests for protocol rendering:
//! - filter grammar for every node kind
//! - parameter order and separators
//! - nested expansion

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use odatakit::execution::MockEngine;
use odatakit::expr::{all, any, lit, prop, Constant};
use odatakit::query::{parse_params, to_query_params, EntityKey, EntitySet, OrderBy};
use uuid::Uuid;

// =============================================================================
// Helper Functions
// =============================================================================

fn set() -> EntitySet<MockEngine> {
    EntitySet::new(Arc::new(MockEngine::new(Vec::new())))
}

fn param(set: &EntitySet<MockEngine>, key: &str) -> Option<String> {
    set.to_query_params()
        .into_iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v)
}

// =============================================================================
// Filter Grammar Tests
// =============================================================================

/// Literals render in their protocol form.
#[test]
fn test_literals() {
    assert_eq!(lit(Constant::Null).to_string(), "null");
    assert_eq!(lit(true).to_string(), "true");
    assert_eq!(lit(-4).to_string(), "-4");
    assert_eq!(lit("O'Neil").to_string(), "'O''Neil'");
    assert_eq!(
        lit(Uuid::nil()).to_string(),
        "'00000000-0000-0000-0000-000000000000'"
    );
    assert_eq!(
        lit(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()).to_string(),
        "2024-02-29"
    );
    assert_eq!(
        lit(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()).to_string(),
        "2024-01-02T03:04:05.000Z"
    );
    assert_eq!(
        lit(NaiveTime::from_hms_opt(13, 5, 9).unwrap()).to_string(),
        "13:05:09.000"
    );
}

/// Connectives wrap, not does not.
#[test]
fn test_connectives() {
    let filter = prop("a")
        .equals(1)
        .and(prop("b").not_equals(2))
        .and(prop("c").lt(3));
    assert_eq!(filter.to_string(), "(a eq 1 and b ne 2 and c lt 3)");

    let negated = !prop("a").le(1).or(prop("b").ge(2));
    assert_eq!(negated.to_string(), "not (a le 1 or b ge 2)");
}

/// Functions and arithmetic render with their arguments.
#[test]
fn test_functions_and_operators() {
    assert_eq!(
        prop("Name").substring(1, None).to_string(),
        "substring(Name,1)"
    );
    assert_eq!(
        prop("Name").substring(1, Some(lit(2))).to_string(),
        "substring(Name,1,2)"
    );
    assert_eq!(
        prop("Name").trim().to_upper().index_of("X").to_string(),
        "indexof(toupper(trim(Name)),'X')"
    );
    assert_eq!(
        ((prop("Price") * 2) % 7).floor().to_string(),
        "floor(((Price mul 2) mod 7))"
    );
}

/// Nested quantifiers get distinct, increasing aliases.
#[test]
fn test_nested_quantifiers() {
    let filter = any("Orders", |o| o.all("Lines", |l| l.prop("Qty").gt(0)));
    let text = filter.to_string();

    let outer: usize = text["Orders/any(e".len()..text.find(':').unwrap()]
        .parse()
        .unwrap();
    let expected = format!(
        "Orders/any(e{0}: e{0}/Lines/all(e{1}: e{1}/Qty gt 0))",
        outer,
        outer + 1
    );
    assert_eq!(text, expected);

    let second = all("Tags", |t| t.it().equals("x")).to_string();
    assert!(!second.contains(&format!("e{}:", outer)));
}

// =============================================================================
// Parameter Tests
// =============================================================================

/// Parameters appear in a fixed order with list separators.
#[test]
fn test_parameter_order() {
    let query = set()
        .expand("Friends", |f| f)
        .top(5)
        .skip(10)
        .select(["Id", "Name"])
        .order_by(OrderBy::asc("Name"))
        .then_by(OrderBy::desc("Id"))
        .filter(prop("Age").gt(18))
        .count();

    let keys: Vec<String> = query.to_query_params().into_iter().map(|(k, _)| k).collect();
    assert_eq!(
        keys,
        vec!["$count", "$filter", "$orderby", "$select", "$skip", "$top", "$expand"]
    );
    assert_eq!(param(&query, "$orderby").unwrap(), "Name asc, Id desc");
    assert_eq!(param(&query, "$select").unwrap(), "Id, Name");
}

/// Select replaces earlier selections.
#[test]
fn test_select_replaces() {
    let query = set().select(["a", "b"]).select(["c"]);
    assert_eq!(param(&query, "$select").unwrap(), "c");
}

/// An empty selection clears the selection instead of rendering an empty value.
#[test]
fn test_empty_select_clears() {
    let query = set().select(["a"]).select(Vec::<String>::new());
    assert_eq!(param(&query, "$select"), None);
    assert!(query.to_query_params().is_empty());
}

/// Nested expand options use "; " without a leading separator.
#[test]
fn test_expand_nested_options() {
    let query = set().expand("Orders", |o| {
        o.filter(prop("Total").gt(100))
            .order_by(OrderBy::desc("Total"))
            .expand("Lines", |l| l.select(["Sku"]).top(2))
    });

    assert_eq!(
        param(&query, "$expand").unwrap(),
        "Orders($filter=Total gt 100; $orderby=Total desc; $expand=Lines($select=Sku; $top=2))"
    );
}

/// Keys render as path segments.
#[test]
fn test_key_segment() {
    let key = EntityKey::composite([("OrderId", Constant::Int(7)), ("Sku", Constant::from("a'b"))]);
    assert_eq!(key.to_segment().unwrap(), "(OrderId=7,Sku='a''b')");
}

/// Textual parameters render like built ones.
#[test]
fn test_parsed_params_render_like_built() {
    let parsed = parse_params(
        [
            ("age", "gte.30"),
            ("order", "name.desc"),
            ("limit", "2"),
            ("select", "id"),
        ],
        1000,
    )
    .unwrap();

    let built = set()
        .filter(prop("age").ge(30))
        .order_by(OrderBy::desc("name"))
        .top(2)
        .select(["id"]);

    assert_eq!(to_query_params(&parsed), built.to_query_params());
}
