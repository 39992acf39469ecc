//! The query expression compiler.
//!
//! Turns the string-based descriptions in [`crate::types`] into typed,
//! backend-neutral expression values:
//!
//! | Description      | Compiled value                           |
//! |------------------|------------------------------------------|
//! | `FilterSpec`     | [`Predicate`]                            |
//! | `CombinedFilter` | [`Predicate`] (folded AND/OR tree)       |
//! | `SelectSpec`     | [`Projection`]                           |
//! | `OrderSpec`      | [`OrderKey`]                             |
//! | `GroupSpec`      | [`GroupKey`] + [`GroupRepresentative`]   |
//! | `MutationSpec`   | [`Mutation`]                             |
//!
//! Compilation is synchronous and pure: every property name, operator and
//! literal is validated here, before any backend is involved. The compiled
//! values are immutable and `Send + Sync`.

mod coerce;
mod mutation;
mod ordering;
mod predicate;
mod projection;

pub use coerce::coerce;
pub use mutation::{Mutation, SetProperty};
pub use ordering::{Group, GroupKey, GroupRepresentative, OrderKey, SortDirection};
pub use predicate::{CompareOp, Expr, Predicate};
pub use projection::{ProjectedColumn, Projection, Record, Row};

use crate::error::QueryResult;
use crate::schema::Entity;
use crate::types::{CombinedFilter, FilterSpec, GroupSpec, OrderSpec, PropertyUpdate, SelectSpec};

/// Compiles one filter into a predicate.
pub fn build_predicate<E: Entity>(spec: &FilterSpec) -> QueryResult<Predicate<E>> {
    Predicate::from_filter(spec)
}

/// Compiles a filter list and its combinator into one predicate.
pub fn combine_predicates<E: Entity>(spec: &CombinedFilter) -> QueryResult<Predicate<E>> {
    Predicate::combine(spec)
}

/// Compiles a selector list into a projection.
pub fn build_projection<E: Entity>(spec: &SelectSpec) -> QueryResult<Projection<E>> {
    Projection::from_spec(spec)
}

/// Compiles a single-key ordering.
pub fn build_order_key<E: Entity>(spec: &OrderSpec) -> QueryResult<OrderKey<E>> {
    OrderKey::from_spec(spec)
}

/// Compiles a single-key grouping function.
pub fn build_group_key<E: Entity>(property: &str) -> QueryResult<GroupKey<E>> {
    GroupKey::from_name(property)
}

/// Compiles the in-group ordering and projection of a grouping description.
pub fn build_group_representative<E: Entity>(
    spec: &GroupSpec,
) -> QueryResult<GroupRepresentative<E>> {
    GroupRepresentative::from_spec(spec)
}

/// Compiles an ordered update list into a mutation.
pub fn build_mutation<E: Entity>(updates: &[PropertyUpdate]) -> QueryResult<Mutation<E>> {
    Mutation::from_updates(updates)
}
