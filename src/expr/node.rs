//! # Expression Nodes
//!
//! The closed set of filter expression variants and their protocol rendering.

use std::fmt;

use super::constant::Constant;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl ComparisonOp {
    /// Get the operator string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "eq",
            ComparisonOp::Ne => "ne",
            ComparisonOp::Lt => "lt",
            ComparisonOp::Le => "le",
            ComparisonOp::Gt => "gt",
            ComparisonOp::Ge => "ge",
        }
    }
}

/// N-ary logical connectives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
        }
    }
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl ArithmeticOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Sub => "sub",
            ArithmeticOp::Mul => "mul",
            ArithmeticOp::Div => "div",
            ArithmeticOp::Mod => "mod",
        }
    }
}

/// Built-in string and number functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Contains,
    StartsWith,
    EndsWith,
    Concat,
    IndexOf,
    Length,
    Substring,
    ToLower,
    ToUpper,
    Trim,
    Ceiling,
    Floor,
    Round,
}

impl Function {
    /// Get the protocol function name
    pub fn as_str(&self) -> &'static str {
        match self {
            Function::Contains => "contains",
            Function::StartsWith => "startswith",
            Function::EndsWith => "endswith",
            Function::Concat => "concat",
            Function::IndexOf => "indexof",
            Function::Length => "length",
            Function::Substring => "substring",
            Function::ToLower => "tolower",
            Function::ToUpper => "toupper",
            Function::Trim => "trim",
            Function::Ceiling => "ceiling",
            Function::Floor => "floor",
            Function::Round => "round",
        }
    }
}

/// Collection quantifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    All,
    Any,
}

impl Quantifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quantifier::All => "all",
            Quantifier::Any => "any",
        }
    }
}

/// A reference to a property, optionally below a path
///
/// The path is either a navigation path (`Address`) or a quantifier alias
/// (`e0`), rendered as `path/name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyRef {
    pub path: Option<String>,
    pub name: String,
}

impl PropertyRef {
    /// Create a bare property reference
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            path: None,
            name: name.into(),
        }
    }

    /// Create a property reference below `path`
    pub fn with_path(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            name: name.into(),
        }
    }

    /// Iterates path segments followed by the property name
    pub(crate) fn segments(&self) -> impl Iterator<Item = &str> {
        self.path
            .iter()
            .flat_map(|p| p.split('/'))
            .filter(|s| !s.is_empty())
            .chain(std::iter::once(self.name.as_str()))
    }
}

impl From<&str> for PropertyRef {
    fn from(name: &str) -> Self {
        PropertyRef::new(name)
    }
}

impl From<String> for PropertyRef {
    fn from(name: String) -> Self {
        PropertyRef::new(name)
    }
}

impl fmt::Display for PropertyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}/{}", path, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A filter expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    Constant(Constant),

    /// Property accessor
    Property(PropertyRef),

    /// Binary comparison, string operands compared case-insensitively
    Comparison {
        op: ComparisonOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `and`/`or` over any number of operands
    Logical { op: LogicalOp, operands: Vec<Expr> },

    /// Negation
    Not(Box<Expr>),

    /// Function call
    Function { function: Function, args: Vec<Expr> },

    /// Binary arithmetic
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `any`/`all` over a collection property with a bound alias
    Quantifier {
        kind: Quantifier,
        collection: PropertyRef,
        alias: String,
        condition: Box<Expr>,
    },
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Expr], separator: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(c) => write!(f, "{}", c),
            Expr::Property(p) => write!(f, "{}", p),
            Expr::Comparison { op, left, right } => {
                write!(f, "{} {} {}", left, op.as_str(), right)
            }
            Expr::Logical { op, operands } => {
                f.write_str("(")?;
                write_joined(f, operands, &format!(" {} ", op.as_str()))?;
                f.write_str(")")
            }
            Expr::Not(inner) => write!(f, "not {}", inner),
            Expr::Function { function, args } => {
                write!(f, "{}(", function.as_str())?;
                write_joined(f, args, ",")?;
                f.write_str(")")
            }
            Expr::Arithmetic { op, left, right } => {
                write!(f, "({} {} {})", left, op.as_str(), right)
            }
            Expr::Quantifier {
                kind,
                collection,
                alias,
                condition,
            } => write!(f, "{}/{}({}: {})", collection, kind.as_str(), alias, condition),
        }
    }
}
