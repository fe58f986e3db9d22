//! # Expression Builders
//!
//! Fluent constructors for filter expressions.
//!
//! ```ignore
//! use odatakit::expr::{any, prop};
//!
//! let filter = prop("Age").ge(30).and(any("Orders", |o| o.prop("Total").gt(100)));
//! assert_eq!(filter.to_string(), "(Age ge 30 and Orders/any(e0: e0/Total gt 100))");
//! ```

use std::ops;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use super::constant::Constant;
use super::node::{ArithmeticOp, ComparisonOp, Expr, Function, LogicalOp, PropertyRef, Quantifier};

/// Process-wide alias counter; nested quantifiers never share an alias
static NEXT_ALIAS: AtomicUsize = AtomicUsize::new(0);

/// A quantifier's bound variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    name: String,
}

impl Alias {
    /// Allocates the next alias (`e0`, `e1`, ...)
    pub fn next() -> Self {
        Self {
            name: format!("e{}", NEXT_ALIAS.fetch_add(1, Ordering::Relaxed)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// A property of the bound element
    pub fn prop(&self, name: impl Into<String>) -> Expr {
        Expr::Property(PropertyRef::with_path(self.name.clone(), name))
    }

    /// The bound element itself, for collections of primitives
    pub fn it(&self) -> Expr {
        Expr::Property(PropertyRef::new(self.name.clone()))
    }

    /// `any` over a collection property of the bound element
    pub fn any(&self, collection: impl Into<String>, condition: impl FnOnce(&Alias) -> Expr) -> Expr {
        quantify(
            Quantifier::Any,
            PropertyRef::with_path(self.name.clone(), collection),
            condition,
        )
    }

    /// `all` over a collection property of the bound element
    pub fn all(&self, collection: impl Into<String>, condition: impl FnOnce(&Alias) -> Expr) -> Expr {
        quantify(
            Quantifier::All,
            PropertyRef::with_path(self.name.clone(), collection),
            condition,
        )
    }
}

/// A property of the current record
pub fn prop(name: impl Into<String>) -> Expr {
    Expr::Property(PropertyRef::new(name))
}

/// A literal value
pub fn lit(value: impl Into<Constant>) -> Expr {
    Expr::Constant(value.into())
}

/// `collection/any(alias: condition)`
pub fn any(collection: impl Into<PropertyRef>, condition: impl FnOnce(&Alias) -> Expr) -> Expr {
    quantify(Quantifier::Any, collection.into(), condition)
}

/// `collection/all(alias: condition)`
pub fn all(collection: impl Into<PropertyRef>, condition: impl FnOnce(&Alias) -> Expr) -> Expr {
    quantify(Quantifier::All, collection.into(), condition)
}

fn quantify(
    kind: Quantifier,
    collection: PropertyRef,
    condition: impl FnOnce(&Alias) -> Expr,
) -> Expr {
    // Outer alias is taken before the condition builds any nested quantifier
    let alias = Alias::next();
    let condition = condition(&alias);
    Expr::Quantifier {
        kind,
        collection,
        alias: alias.name,
        condition: Box::new(condition),
    }
}

/// Combines operands under `op`, flattening nested nodes of the same kind
fn connect(op: LogicalOp, left: Expr, right: Expr) -> Expr {
    let mut operands = Vec::new();
    for side in [left, right] {
        match side {
            Expr::Logical { op: inner, operands: nested } if inner == op => operands.extend(nested),
            other => operands.push(other),
        }
    }
    Expr::Logical { op, operands }
}

impl Expr {
    /// `and` over every expression in `exprs`; a single expression is returned bare
    pub fn and_all(exprs: impl IntoIterator<Item = Expr>) -> Option<Expr> {
        let mut operands: Vec<Expr> = exprs.into_iter().collect();
        match operands.len() {
            0 => None,
            1 => operands.pop(),
            _ => Some(Expr::Logical {
                op: LogicalOp::And,
                operands,
            }),
        }
    }

    fn compare(self, op: ComparisonOp, rhs: impl Into<Expr>) -> Expr {
        Expr::Comparison {
            op,
            left: Box::new(self),
            right: Box::new(rhs.into()),
        }
    }

    pub fn equals(self, rhs: impl Into<Expr>) -> Expr {
        self.compare(ComparisonOp::Eq, rhs)
    }

    pub fn not_equals(self, rhs: impl Into<Expr>) -> Expr {
        self.compare(ComparisonOp::Ne, rhs)
    }

    pub fn lt(self, rhs: impl Into<Expr>) -> Expr {
        self.compare(ComparisonOp::Lt, rhs)
    }

    pub fn le(self, rhs: impl Into<Expr>) -> Expr {
        self.compare(ComparisonOp::Le, rhs)
    }

    pub fn gt(self, rhs: impl Into<Expr>) -> Expr {
        self.compare(ComparisonOp::Gt, rhs)
    }

    pub fn ge(self, rhs: impl Into<Expr>) -> Expr {
        self.compare(ComparisonOp::Ge, rhs)
    }

    pub fn and(self, rhs: impl Into<Expr>) -> Expr {
        connect(LogicalOp::And, self, rhs.into())
    }

    pub fn or(self, rhs: impl Into<Expr>) -> Expr {
        connect(LogicalOp::Or, self, rhs.into())
    }

    fn call(function: Function, args: Vec<Expr>) -> Expr {
        Expr::Function { function, args }
    }

    pub fn contains(self, needle: impl Into<Expr>) -> Expr {
        Self::call(Function::Contains, vec![self, needle.into()])
    }

    pub fn starts_with(self, prefix: impl Into<Expr>) -> Expr {
        Self::call(Function::StartsWith, vec![self, prefix.into()])
    }

    pub fn ends_with(self, suffix: impl Into<Expr>) -> Expr {
        Self::call(Function::EndsWith, vec![self, suffix.into()])
    }

    pub fn concat(self, other: impl Into<Expr>) -> Expr {
        Self::call(Function::Concat, vec![self, other.into()])
    }

    pub fn index_of(self, needle: impl Into<Expr>) -> Expr {
        Self::call(Function::IndexOf, vec![self, needle.into()])
    }

    pub fn length(self) -> Expr {
        Self::call(Function::Length, vec![self])
    }

    /// `substring(self,start)` or `substring(self,start,length)`
    pub fn substring(self, start: impl Into<Expr>, length: Option<Expr>) -> Expr {
        let mut args = vec![self, start.into()];
        args.extend(length);
        Self::call(Function::Substring, args)
    }

    pub fn to_lower(self) -> Expr {
        Self::call(Function::ToLower, vec![self])
    }

    pub fn to_upper(self) -> Expr {
        Self::call(Function::ToUpper, vec![self])
    }

    pub fn trim(self) -> Expr {
        Self::call(Function::Trim, vec![self])
    }

    pub fn ceiling(self) -> Expr {
        Self::call(Function::Ceiling, vec![self])
    }

    pub fn floor(self) -> Expr {
        Self::call(Function::Floor, vec![self])
    }

    pub fn round(self) -> Expr {
        Self::call(Function::Round, vec![self])
    }

    fn arithmetic(self, op: ArithmeticOp, rhs: Expr) -> Expr {
        Expr::Arithmetic {
            op,
            left: Box::new(self),
            right: Box::new(rhs),
        }
    }
}

impl ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }
}

macro_rules! impl_arithmetic {
    ($($trait:ident :: $method:ident => $op:expr),* $(,)?) => {
        $(
            impl<R: Into<Expr>> ops::$trait<R> for Expr {
                type Output = Expr;

                fn $method(self, rhs: R) -> Expr {
                    self.arithmetic($op, rhs.into())
                }
            }
        )*
    };
}

impl_arithmetic! {
    Add::add => ArithmeticOp::Add,
    Sub::sub => ArithmeticOp::Sub,
    Mul::mul => ArithmeticOp::Mul,
    Div::div => ArithmeticOp::Div,
    Rem::rem => ArithmeticOp::Mod,
}

macro_rules! impl_from_literal {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Expr {
                fn from(value: $ty) -> Self {
                    Expr::Constant(Constant::from(value))
                }
            }
        )*
    };
}

impl_from_literal!(bool, i32, i64, f64, &str, String, Uuid, NaiveDate, DateTime<Utc>, NaiveTime);

impl From<Constant> for Expr {
    fn from(value: Constant) -> Self {
        Expr::Constant(value)
    }
}

impl From<PropertyRef> for Expr {
    fn from(value: PropertyRef) -> Self {
        Expr::Property(value)
    }
}
