//! # Local Evaluation
//!
//! Evaluates expressions against in-memory JSON records. Evaluation never
//! fails: unresolvable properties yield `null`, mismatched operand types
//! make comparisons false and arithmetic `null`.

use std::cmp::Ordering;

use serde_json::{Number, Value};

use super::node::{ArithmeticOp, ComparisonOp, Expr, Function, LogicalOp, PropertyRef, Quantifier};

/// Variable bindings visible while evaluating a node
struct Scope<'a> {
    /// The record bare properties are read from
    record: Option<&'a Value>,
    /// Quantifier aliases bound to collection elements, innermost last
    bindings: Vec<(&'a str, &'a Value)>,
}

impl<'a> Scope<'a> {
    fn lookup(&self, alias: &str) -> Option<&'a Value> {
        self.bindings
            .iter()
            .rev()
            .find(|(name, _)| *name == alias)
            .map(|(_, v)| *v)
    }

    fn bind(&self, alias: &'a str, element: &'a Value) -> Scope<'a> {
        let mut bindings = self.bindings.clone();
        bindings.push((alias, element));
        Scope {
            record: self.record,
            bindings,
        }
    }

    /// Resolves a property reference, starting from a bound alias when the
    /// first segment names one
    fn resolve(&self, property: &PropertyRef) -> Option<&'a Value> {
        let mut segments = property.segments();
        let first = segments.next()?;

        let mut current = match self.lookup(first) {
            Some(bound) => bound,
            None => self.record?.as_object()?.get(first)?,
        };
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

impl Expr {
    /// Evaluates this expression against an optional record
    pub fn eval(&self, record: Option<&Value>) -> Value {
        let scope = Scope {
            record,
            bindings: Vec::new(),
        };
        self.eval_in(&scope)
    }

    /// Returns true when this expression evaluates truthy for `record`
    pub fn matches(&self, record: &Value) -> bool {
        truthy(&self.eval(Some(record)))
    }

    fn eval_in(&self, scope: &Scope<'_>) -> Value {
        match self {
            Expr::Constant(c) => c.to_value(),
            Expr::Property(p) => scope.resolve(p).cloned().unwrap_or(Value::Null),
            Expr::Comparison { op, left, right } => {
                let left = fold_case(left.eval_in(scope));
                let right = fold_case(right.eval_in(scope));
                Value::Bool(compare(*op, &left, &right))
            }
            Expr::Logical { op, operands } => {
                let result = match op {
                    LogicalOp::And => operands.iter().all(|o| truthy(&o.eval_in(scope))),
                    LogicalOp::Or => operands.iter().any(|o| truthy(&o.eval_in(scope))),
                };
                Value::Bool(result)
            }
            Expr::Not(inner) => Value::Bool(!truthy(&inner.eval_in(scope))),
            Expr::Function { function, args } => {
                let args: Vec<Value> = args.iter().map(|a| a.eval_in(scope)).collect();
                apply_function(*function, &args)
            }
            Expr::Arithmetic { op, left, right } => {
                arithmetic(*op, &left.eval_in(scope), &right.eval_in(scope))
            }
            Expr::Quantifier {
                kind,
                collection,
                alias,
                condition,
            } => {
                let Some(Value::Array(elements)) = scope.resolve(collection) else {
                    return Value::Bool(false);
                };
                let holds = |element| truthy(&condition.eval_in(&scope.bind(alias, element)));
                let result = match kind {
                    Quantifier::All => elements.iter().all(holds),
                    Quantifier::Any => elements.iter().any(holds),
                };
                Value::Bool(result)
            }
        }
    }
}

/// Truthiness of an evaluated value
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn fold_case(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.to_lowercase()),
        other => other,
    }
}

/// Orders two JSON values of the same kind; `None` when incomparable
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare_values(a, b) == Some(Ordering::Equal),
        _ => a == b,
    }
}

fn compare(op: ComparisonOp, left: &Value, right: &Value) -> bool {
    match op {
        ComparisonOp::Eq => values_equal(left, right),
        ComparisonOp::Ne => !values_equal(left, right),
        ComparisonOp::Lt => compare_values(left, right) == Some(Ordering::Less),
        ComparisonOp::Le => matches!(
            compare_values(left, right),
            Some(Ordering::Less | Ordering::Equal)
        ),
        ComparisonOp::Gt => compare_values(left, right) == Some(Ordering::Greater),
        ComparisonOp::Ge => matches!(
            compare_values(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        ),
    }
}

/// Builds a JSON number, preferring an integer for whole values
fn number(value: f64) -> Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_992.0;
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_SAFE {
        Value::from(value as i64)
    } else {
        Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn arithmetic(op: ArithmeticOp, left: &Value, right: &Value) -> Value {
    let (Value::Number(l), Value::Number(r)) = (left, right) else {
        return Value::Null;
    };

    if let (Some(a), Some(b), false) = (l.as_i64(), r.as_i64(), op == ArithmeticOp::Div) {
        let result = match op {
            ArithmeticOp::Add => a.checked_add(b),
            ArithmeticOp::Sub => a.checked_sub(b),
            ArithmeticOp::Mul => a.checked_mul(b),
            ArithmeticOp::Mod => a.checked_rem(b),
            ArithmeticOp::Div => None,
        };
        if let Some(result) = result {
            return Value::from(result);
        }
        if op == ArithmeticOp::Mod {
            return Value::Null;
        }
    }

    let (Some(a), Some(b)) = (l.as_f64(), r.as_f64()) else {
        return Value::Null;
    };
    let result = match op {
        ArithmeticOp::Add => a + b,
        ArithmeticOp::Sub => a - b,
        ArithmeticOp::Mul => a * b,
        ArithmeticOp::Div => a / b,
        ArithmeticOp::Mod => a % b,
    };
    number(result)
}

fn apply_function(function: Function, args: &[Value]) -> Value {
    let text = |i: usize| args.get(i).and_then(Value::as_str);
    let num = |i: usize| args.get(i).and_then(Value::as_f64);

    match function {
        Function::Contains => match (text(0), text(1)) {
            (Some(s), Some(sub)) => Value::Bool(s.contains(sub)),
            _ => Value::Bool(false),
        },
        Function::StartsWith => match (text(0), text(1)) {
            (Some(s), Some(prefix)) => Value::Bool(s.starts_with(prefix)),
            _ => Value::Bool(false),
        },
        Function::EndsWith => match (text(0), text(1)) {
            (Some(s), Some(suffix)) => Value::Bool(s.ends_with(suffix)),
            _ => Value::Bool(false),
        },
        Function::Concat => match (text(0), text(1)) {
            (Some(a), Some(b)) => Value::String(format!("{}{}", a, b)),
            _ => Value::Null,
        },
        Function::IndexOf => match (text(0), text(1)) {
            (Some(s), Some(sub)) => {
                let index = s
                    .find(sub)
                    .map(|byte| s[..byte].chars().count() as i64)
                    .unwrap_or(-1);
                Value::from(index)
            }
            _ => Value::Null,
        },
        Function::Length => text(0)
            .map(|s| Value::from(s.chars().count() as u64))
            .unwrap_or(Value::Null),
        Function::Substring => {
            let (Some(s), Some(start)) = (text(0), args.get(1).and_then(Value::as_i64)) else {
                return Value::Null;
            };
            let start = start.max(0) as usize;
            let chars = s.chars().skip(start);
            let result: String = match args.get(2).and_then(Value::as_i64) {
                Some(len) => chars.take(len.max(0) as usize).collect(),
                None => chars.collect(),
            };
            Value::String(result)
        }
        Function::ToLower => text(0)
            .map(|s| Value::String(s.to_lowercase()))
            .unwrap_or(Value::Null),
        Function::ToUpper => text(0)
            .map(|s| Value::String(s.to_uppercase()))
            .unwrap_or(Value::Null),
        Function::Trim => text(0)
            .map(|s| Value::String(s.trim().to_string()))
            .unwrap_or(Value::Null),
        Function::Ceiling => num(0).map(|n| number(n.ceil())).unwrap_or(Value::Null),
        Function::Floor => num(0).map(|n| number(n.floor())).unwrap_or(Value::Null),
        Function::Round => num(0).map(|n| number(n.round())).unwrap_or(Value::Null),
    }
}
