//! Core execution traits and abstractions.
//!
//! - [`QueryBackend`] - a store that hands out sessions
//! - [`BackendSession`] - one unit of work: fetch, count, insert, replace,
//!   bulk update and bulk delete
//! - [`QueryPlan`] - a compiled query bundling predicate, ordering or
//!   grouping, projection, pagination and eager-load hints
//! - [`CancellationHandle`] - cooperative cancellation observed by sessions
//!
//! # Backend Capabilities
//!
//! Not every backend supports every stage of a plan. The repository compares
//! [`QueryPlan::required_capabilities`] with [`QueryBackend::supports`] and
//! fails with [`BackendError::UnsupportedCapability`] before acquiring a
//! session.
//!
//! [`BackendError::UnsupportedCapability`]: crate::error::BackendError::UnsupportedCapability

mod backend;
mod cancel;
mod plan;

pub use backend::{BackendCapability, BackendKind, BackendSession, QueryBackend};
pub use cancel::CancellationHandle;
pub use plan::{PlanShape, QueryPlan};
