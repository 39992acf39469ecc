//! Backend implementations.
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | In-memory | [`memory`] | Evaluates compiled plans over a locked `Vec`, bounded session pool |
//! | SQL | [`sql`] | Renders compiled plans as parameterised SQLite statements |
//!
//! # Example
//!
//! ```ignore
//! use sieve_persistence::backends::memory::MemoryBackend;
//! use sieve_persistence::config::MemoryBackendConfig;
//!
//! let backend: MemoryBackend<Person> =
//!     MemoryBackend::new(MemoryBackendConfig::default().with_max_sessions(4));
//! ```

pub mod memory;
pub mod sql;
