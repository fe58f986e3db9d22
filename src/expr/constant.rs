//! # Literal Constants
//!
//! Leaf values of a filter expression and their protocol literal forms.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde_json::{Number, Value};
use uuid::Uuid;

/// A literal value embedded in an expression
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Guid(Uuid),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Time(NaiveTime),
}

impl Constant {
    /// Returns the value as it appears in a JSON record.
    ///
    /// Temporal values and GUIDs evaluate to their textual form, which is
    /// how the service serializes them.
    pub fn to_value(&self) -> Value {
        match self {
            Constant::Null => Value::Null,
            Constant::Bool(b) => Value::Bool(*b),
            Constant::Int(i) => Value::from(*i),
            Constant::Double(d) => Number::from_f64(*d).map(Value::Number).unwrap_or(Value::Null),
            Constant::String(s) => Value::String(s.clone()),
            Constant::Guid(g) => Value::String(g.to_string()),
            Constant::Date(d) => Value::String(format_date(d)),
            Constant::DateTime(dt) => Value::String(format_date_time(dt)),
            Constant::Time(t) => Value::String(format_time(t)),
        }
    }
}

fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn format_date_time(date_time: &DateTime<Utc>) -> String {
    date_time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn format_time(time: &NaiveTime) -> String {
    time.format("%H:%M:%S%.3f").to_string()
}

/// Writes `value` single-quoted with embedded quotes doubled
fn write_quoted(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    write!(f, "'{}'", value.replace('\'', "''"))
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Null => write!(f, "null"),
            Constant::Bool(b) => write!(f, "{}", b),
            Constant::Int(i) => write!(f, "{}", i),
            Constant::Double(d) if d.is_nan() => write!(f, "NaN"),
            Constant::Double(d) if d.is_infinite() => {
                write!(f, "{}", if *d > 0.0 { "INF" } else { "-INF" })
            }
            Constant::Double(d) => write!(f, "{}", d),
            Constant::String(s) => write_quoted(f, s),
            Constant::Guid(g) => write_quoted(f, &g.to_string()),
            Constant::Date(d) => write!(f, "{}", format_date(d)),
            Constant::DateTime(dt) => write!(f, "{}", format_date_time(dt)),
            Constant::Time(t) => write!(f, "{}", format_time(t)),
        }
    }
}

impl From<bool> for Constant {
    fn from(value: bool) -> Self {
        Constant::Bool(value)
    }
}

impl From<i32> for Constant {
    fn from(value: i32) -> Self {
        Constant::Int(value.into())
    }
}

impl From<i64> for Constant {
    fn from(value: i64) -> Self {
        Constant::Int(value)
    }
}

impl From<f64> for Constant {
    fn from(value: f64) -> Self {
        Constant::Double(value)
    }
}

impl From<&str> for Constant {
    fn from(value: &str) -> Self {
        Constant::String(value.to_string())
    }
}

impl From<String> for Constant {
    fn from(value: String) -> Self {
        Constant::String(value)
    }
}

impl From<Uuid> for Constant {
    fn from(value: Uuid) -> Self {
        Constant::Guid(value)
    }
}

impl From<NaiveDate> for Constant {
    fn from(value: NaiveDate) -> Self {
        Constant::Date(value)
    }
}

impl From<DateTime<Utc>> for Constant {
    fn from(value: DateTime<Utc>) -> Self {
        Constant::DateTime(value)
    }
}

impl From<NaiveTime> for Constant {
    fn from(value: NaiveTime) -> Self {
        Constant::Time(value)
    }
}

impl TryFrom<&Value> for Constant {
    type Error = String;

    /// Converts a scalar JSON value; arrays and objects have no literal form
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(Constant::Null),
            Value::Bool(b) => Ok(Constant::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Constant::Int(i)),
                None => Ok(Constant::Double(n.as_f64().unwrap_or(0.0))),
            },
            Value::String(s) => Ok(Constant::String(s.clone())),
            other => Err(format!("no literal form for {}", other)),
        }
    }
}
