//! # Query Parameter Parser
//!
//! Parses PostgREST-style textual parameters (`select=id,name`,
//! `order=name.desc`, `limit=10`, `age=gte.30`) into [`QueryOptions`].
//! This is the input format of the command line front end.

use serde_json::Value;

use crate::errors::{ClientError, ClientResult};
use crate::expr::{prop, Constant, Expr};

use super::options::{Expand, OrderBy, QueryOptions, SortDirection};

/// Parse parameters in order; later keys override earlier ones except
/// filters, which accumulate
pub fn parse_params<I, K, V>(params: I, max_top: usize) -> ClientResult<QueryOptions>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut result = QueryOptions::new();

    for (key, value) in params {
        let value = value.as_ref();
        match key.as_ref() {
            "select" => {
                let fields = parse_select(value)?;
                result = if fields == ["*"] {
                    QueryOptions {
                        select: None,
                        ..result
                    }
                } else {
                    result.with_select(fields)
                };
            }
            "order" => {
                result.order_by = parse_order(value)?;
            }
            "limit" => {
                result = result.with_top(parse_number("limit", value)?);
            }
            "offset" => {
                result = result.with_skip(parse_number("offset", value)?);
            }
            "count" => {
                if parse_flag(value)? {
                    result = result.with_count();
                }
            }
            "expand" => {
                for property in parse_select(value)? {
                    result = result.with_expand(Expand::new(property));
                }
            }
            field => {
                result = result.with_filter(parse_filter(field, value)?);
            }
        }
    }

    if let Some(top) = result.top {
        if top > max_top {
            return Err(ClientError::LimitExceeded(top, max_top));
        }
    }

    Ok(result)
}

/// Parse select parameter (comma-separated field list)
fn parse_select(value: &str) -> ClientResult<Vec<String>> {
    let fields: Vec<String> = value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if fields.is_empty() {
        return Err(ClientError::InvalidQueryParam(
            "field list cannot be empty".to_string(),
        ));
    }

    Ok(fields)
}

/// Parse order parameter (comma-separated field.direction)
fn parse_order(value: &str) -> ClientResult<Vec<OrderBy>> {
    let mut orders = Vec::new();

    for part in value.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let (property, direction) = match part.rsplit_once('.') {
            Some((field, direction)) => {
                let direction = match direction.to_lowercase().as_str() {
                    "asc" => SortDirection::Asc,
                    "desc" => SortDirection::Desc,
                    _ => {
                        return Err(ClientError::InvalidQueryParam(format!(
                            "Invalid order direction: {}",
                            direction
                        )))
                    }
                };
                (field.to_string(), direction)
            }
            None => (part.to_string(), SortDirection::Asc),
        };

        orders.push(OrderBy {
            property,
            direction,
        });
    }

    Ok(orders)
}

fn parse_number(name: &str, value: &str) -> ClientResult<usize> {
    value
        .parse()
        .map_err(|_| ClientError::InvalidQueryParam(format!("Invalid {}: {}", name, value)))
}

fn parse_flag(value: &str) -> ClientResult<bool> {
    match value {
        "true" | "exact" => Ok(true),
        "false" => Ok(false),
        _ => Err(ClientError::InvalidQueryParam(format!(
            "Invalid count: {}",
            value
        ))),
    }
}

/// Parse a filter expression from `field=op.value`
fn parse_filter(field: &str, value: &str) -> ClientResult<Expr> {
    let Some((op, operand)) = value.split_once('.') else {
        return Ok(prop(field).equals(literal(&parse_filter_value(value))?));
    };

    let property = prop(field);
    let filter = match op {
        "eq" => property.equals(literal(&parse_filter_value(operand))?),
        "neq" | "ne" => property.not_equals(literal(&parse_filter_value(operand))?),
        "gt" => property.gt(literal(&parse_filter_value(operand))?),
        "gte" | "ge" => property.ge(literal(&parse_filter_value(operand))?),
        "lt" => property.lt(literal(&parse_filter_value(operand))?),
        "lte" | "le" => property.le(literal(&parse_filter_value(operand))?),
        "like" => parse_like(property, operand),
        "in" => {
            let Value::Array(items) = parse_filter_value(operand) else {
                return Err(ClientError::InvalidQueryParam(format!(
                    "in expects a list: {}",
                    operand
                )));
            };
            let mut alternatives = items
                .iter()
                .map(|item| Ok(prop(field).equals(literal(item)?)))
                .collect::<ClientResult<Vec<_>>>()?
                .into_iter();
            let first = alternatives.next().ok_or_else(|| {
                ClientError::InvalidQueryParam(format!("empty list for {}", field))
            })?;
            alternatives.fold(first, Expr::or)
        }
        "is" => match operand {
            "null" => property.equals(Constant::Null),
            "notnull" => property.not_equals(Constant::Null),
            other => {
                return Err(ClientError::InvalidQueryParam(format!(
                    "is expects null or notnull: {}",
                    other
                )))
            }
        },
        // No known operator, treat the whole value as an equality operand
        _ => property.equals(literal(&parse_filter_value(value))?),
    };

    Ok(filter)
}

/// Translates a `%` wildcard pattern into a string function
fn parse_like(property: Expr, pattern: &str) -> Expr {
    let leading = pattern.starts_with('%');
    let trailing = pattern.len() > 1 && pattern.ends_with('%');
    let needle = pattern.trim_matches('%').to_string();

    match (leading, trailing) {
        (true, true) => property.contains(needle),
        (true, false) => property.ends_with(needle),
        (false, true) => property.starts_with(needle),
        (false, false) => property.equals(needle),
    }
}

fn literal(value: &Value) -> ClientResult<Expr> {
    Constant::try_from(value)
        .map(Expr::Constant)
        .map_err(ClientError::InvalidQueryParam)
}

/// Parse a filter value (handles lists for 'in' operator)
fn parse_filter_value(value: &str) -> Value {
    // Check for list syntax: (a,b,c)
    if value.starts_with('(') && value.ends_with(')') && value.len() >= 2 {
        let inner = &value[1..value.len() - 1];
        let items = inner
            .split(',')
            .map(|s| parse_filter_value(s.trim()))
            .collect();
        return Value::Array(items);
    }

    match value {
        "null" => return Value::Null,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if let Ok(n) = value.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(n) = value.parse::<f64>() {
        if let Some(num) = serde_json::Number::from_f64(n) {
            return Value::Number(num);
        }
    }

    Value::String(value.to_string())
}
