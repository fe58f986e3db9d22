//! # Query Option Model
//!
//! Immutable query options, their rendering to protocol parameters, the
//! select/expand shape handed to validators, entity keys and the builders
//! tying them to an executor.

mod builder;
mod key;
mod options;
mod params;
mod parser;
mod shape;

pub use builder::{EntitySet, EntitySingle, ExpandBuilder};
pub use key::EntityKey;
pub use options::{Expand, OrderBy, QueryOptions, SortDirection, DEFAULT_TOP};
pub use params::{to_query_params, to_query_string};
pub use parser::parse_params;
pub use shape::SelectExpandShape;
