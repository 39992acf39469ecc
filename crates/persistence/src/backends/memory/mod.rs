//! In-memory backend.
//!
//! Keeps entities in a `Vec` behind a `parking_lot::RwLock` and evaluates
//! compiled plans directly: predicates are walked row by row, groups are
//! formed in first-appearance order, and navigations that were not requested
//! are unloaded from the returned copies.
//!
//! Sessions are bounded by a semaphore sized by
//! [`MemoryBackendConfig::max_sessions`](crate::config::MemoryBackendConfig);
//! a session that cannot be acquired within the configured timeout fails with
//! [`BackendError::PoolExhausted`](crate::error::BackendError::PoolExhausted).
//!
//! Writes (insert, replace, bulk update, bulk delete) are atomic: they run
//! under the write lock and are rolled back on a uniqueness violation.

mod backend;
mod executor;

pub use backend::{MemoryBackend, MemorySession};

pub(crate) const BACKEND_NAME: &str = "memory";
