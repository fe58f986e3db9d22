//! # Filter Expression AST
//!
//! Every node renders to protocol filter syntax through `Display` and can be
//! evaluated against an in-memory JSON record through [`Expr::eval`], so the
//! same condition drives both the remote request and the mock engine.

mod builder;
mod constant;
mod eval;
mod node;

pub use builder::{all, any, lit, prop, Alias};
pub use constant::Constant;
pub use eval::{compare_values, truthy};
pub use node::{ArithmeticOp, ComparisonOp, Expr, Function, LogicalOp, PropertyRef, Quantifier};
