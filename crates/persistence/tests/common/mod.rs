//! Test infrastructure for the persistence layer.
//!
//! This module provides the fixture entity, a seeded test context over the
//! in-memory backend, and backend doubles for capability and cancellation
//! tests.

#![allow(dead_code)]

pub mod fixtures;
pub mod harness;

// Re-export commonly used items
pub use fixtures::*;
pub use harness::*;
