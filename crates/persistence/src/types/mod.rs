//! Core types for query descriptions and values.
//!
//! This module contains the request-scoped value objects consumed by the
//! expression compiler:
//!
//! - [`FilterSpec`] / [`CombinedFilter`] - comparisons and their combination
//! - [`SelectSpec`] - projections
//! - [`OrderSpec`] / [`GroupSpec`] - ordering and grouping
//! - [`PropertyUpdate`] - bulk update assignments
//! - [`Pagination`] - skip/take windows
//! - [`Value`] - typed constants and field values

mod filter;
mod order;
mod pagination;
mod request;
mod select;
mod update;
mod value;

pub use filter::{Combinator, CombinedFilter, FilterOperator, FilterSpec};
pub use order::{GroupSpec, OrderSpec};
pub use pagination::Pagination;
pub use request::{GetItemsRequest, GetSelectRequest, GroupByRequest, UpdateWhereRequest};
pub use select::{PropertySelector, SelectSpec};
pub use update::{MutationSpec, PropertyUpdate};
pub use value::{EnumValue, FromValue, Value, ValueTypeError};
