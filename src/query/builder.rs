//! # Query Builders
//!
//! Immutable builders over an entity set, a single entity and an expansion.
//! Each call returns a new builder carrying the previous options plus the
//! change; the executor behind them is shared through an `Arc`.

use std::sync::Arc;

use crate::errors::ClientResult;
use crate::execution::{CollectionResult, Executor, SingleResult};
use crate::expr::Expr;

use super::key::EntityKey;
use super::options::{Expand, OrderBy, QueryOptions};
use super::params::to_query_params;

/// Builder for a query over a whole entity set
pub struct EntitySet<E: Executor + ?Sized = dyn Executor> {
    executor: Arc<E>,
    options: QueryOptions,
}

impl<E: Executor + ?Sized> Clone for EntitySet<E> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            options: self.options.clone(),
        }
    }
}

impl<E: Executor + ?Sized> EntitySet<E> {
    pub fn new(executor: Arc<E>) -> Self {
        Self {
            executor,
            options: QueryOptions::new(),
        }
    }

    /// Builder starting from already assembled options
    pub fn from_options(executor: Arc<E>, options: QueryOptions) -> Self {
        Self { executor, options }
    }

    fn with_options(&self, options: QueryOptions) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            options,
        }
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn filter(&self, filter: Expr) -> Self {
        self.with_options(self.options.with_filter(filter))
    }

    pub fn order_by(&self, order: OrderBy) -> Self {
        self.with_options(self.options.with_order_by(order))
    }

    pub fn then_by(&self, order: OrderBy) -> Self {
        self.with_options(self.options.with_then_by(order))
    }

    /// Replaces any earlier selection
    pub fn select<I, S>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_options(self.options.with_select(fields))
    }

    pub fn skip(&self, skip: usize) -> Self {
        self.with_options(self.options.with_skip(skip))
    }

    pub fn top(&self, top: usize) -> Self {
        self.with_options(self.options.with_top(top))
    }

    pub fn count(&self) -> Self {
        self.with_options(self.options.with_count())
    }

    /// Expands a navigation property, shaping it with `build`
    pub fn expand(
        &self,
        property: impl Into<String>,
        build: impl FnOnce(ExpandBuilder) -> ExpandBuilder,
    ) -> Self {
        let expand = build(ExpandBuilder::new(property)).into_expand();
        self.with_options(self.options.with_expand(expand))
    }

    /// Narrows to one entity; select and expand carry over
    pub fn key(&self, key: EntityKey) -> EntitySingle<E> {
        EntitySingle {
            executor: Arc::clone(&self.executor),
            key,
            options: QueryOptions {
                select: self.options.select.clone(),
                expand: self.options.expand.clone(),
                ..QueryOptions::default()
            },
        }
    }

    pub fn to_query_params(&self) -> Vec<(String, String)> {
        to_query_params(&self.options)
    }

    pub fn execute(&self) -> ClientResult<CollectionResult> {
        self.executor.execute_collection(&self.options)
    }
}

/// Builder for a query addressing one entity by key
pub struct EntitySingle<E: Executor + ?Sized = dyn Executor> {
    executor: Arc<E>,
    key: EntityKey,
    options: QueryOptions,
}

impl<E: Executor + ?Sized> Clone for EntitySingle<E> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            key: self.key.clone(),
            options: self.options.clone(),
        }
    }
}

impl<E: Executor + ?Sized> EntitySingle<E> {
    fn with_options(&self, options: QueryOptions) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            key: self.key.clone(),
            options,
        }
    }

    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn select<I, S>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_options(self.options.with_select(fields))
    }

    pub fn expand(
        &self,
        property: impl Into<String>,
        build: impl FnOnce(ExpandBuilder) -> ExpandBuilder,
    ) -> Self {
        let expand = build(ExpandBuilder::new(property)).into_expand();
        self.with_options(self.options.with_expand(expand))
    }

    pub fn to_query_params(&self) -> Vec<(String, String)> {
        to_query_params(&self.options)
    }

    pub fn execute(&self) -> ClientResult<SingleResult> {
        self.executor.execute_single(&self.key, &self.options)
    }
}

/// Options of one expanded navigation property
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandBuilder {
    property: String,
    options: QueryOptions,
}

impl ExpandBuilder {
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            options: QueryOptions::new(),
        }
    }

    fn with_options(&self, options: QueryOptions) -> Self {
        Self {
            property: self.property.clone(),
            options,
        }
    }

    pub fn filter(&self, filter: Expr) -> Self {
        self.with_options(self.options.with_filter(filter))
    }

    pub fn order_by(&self, order: OrderBy) -> Self {
        self.with_options(self.options.with_order_by(order))
    }

    pub fn then_by(&self, order: OrderBy) -> Self {
        self.with_options(self.options.with_then_by(order))
    }

    pub fn select<I, S>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_options(self.options.with_select(fields))
    }

    pub fn skip(&self, skip: usize) -> Self {
        self.with_options(self.options.with_skip(skip))
    }

    pub fn top(&self, top: usize) -> Self {
        self.with_options(self.options.with_top(top))
    }

    pub fn count(&self) -> Self {
        self.with_options(self.options.with_count())
    }

    pub fn expand(
        &self,
        property: impl Into<String>,
        build: impl FnOnce(ExpandBuilder) -> ExpandBuilder,
    ) -> Self {
        let expand = build(ExpandBuilder::new(property)).into_expand();
        self.with_options(self.options.with_expand(expand))
    }

    pub fn into_expand(self) -> Expand {
        Expand {
            property: self.property,
            options: self.options,
        }
    }
}
