//! Sieve persistence layer
//!
//! This crate compiles declarative, string-based query descriptions (property
//! name, operator, literal, as received over the wire) into strongly-typed
//! expressions over an entity type, and executes them through a generic
//! repository and pluggable query backends.
//!
//! # Features
//!
//! - **Filters**: `Equal`, `NotEqual`, ordering comparisons, `Contains`,
//!   `IsNull`/`IsNotNull`, combined by one AND/OR per request
//! - **Projections**: insertion-ordered rows, optionally decoding embedded
//!   JSON documents
//! - **Ordering and grouping**: single-key ordering, distinct-by-key with an
//!   ordered, projected representative per group
//! - **Bulk updates**: chained set-property mutations applied atomically
//! - **Backends**: in-memory execution and SQL translation of the same
//!   expression trees
//!
//! # Architecture
//!
//! - [`types`] - Request value objects (filters, selectors, orderings, updates)
//! - [`schema`] - Per-entity metadata tables
//! - [`query`] - The expression compiler
//! - [`core`] - Backend traits, query plans and cancellation
//! - [`backends`] - Backend implementations
//! - [`repository`] - Repository operations over a backend
//! - [`config`] - Repository and backend configuration
//! - [`error`] - Error types for all operations
//!
//! # Quick Start
//!
//! ```
//! use std::sync::OnceLock;
//!
//! use sieve_persistence::query::{build_predicate, build_projection};
//! use sieve_persistence::schema::{BaseFields, Entity, EntitySchema, FieldType};
//! use sieve_persistence::types::{FilterOperator, FilterSpec, FromValue, SelectSpec, Value};
//!
//! #[derive(Debug, Clone)]
//! struct Person {
//!     base: BaseFields,
//!     name: String,
//!     age: i64,
//! }
//!
//! impl Entity for Person {
//!     fn schema() -> &'static EntitySchema<Self> {
//!         static SCHEMA: OnceLock<EntitySchema<Person>> = OnceLock::new();
//!         SCHEMA.get_or_init(|| {
//!             EntitySchema::<Self>::builder("Person")
//!                 .base_fields()
//!                 .field("Name", FieldType::text(), |p| p.name.clone().into(), |p, v| {
//!                     p.name = String::from_value(v)?;
//!                     Ok(())
//!                 })
//!                 .field("Age", FieldType::int(), |p| p.age.into(), |p, v| {
//!                     p.age = i64::from_value(v)?;
//!                     Ok(())
//!                 })
//!                 .build()
//!         })
//!     }
//!
//!     fn base(&self) -> &BaseFields {
//!         &self.base
//!     }
//!
//!     fn base_mut(&mut self) -> &mut BaseFields {
//!         &mut self.base
//!     }
//! }
//!
//! let adult = build_predicate::<Person>(&FilterSpec::new(
//!     "age",
//!     FilterOperator::GreaterThanOrEqual,
//!     Some("18"),
//! ))
//! .unwrap();
//!
//! let ada = Person { base: BaseFields::default(), name: "Ada".into(), age: 36 };
//! assert!(adult.evaluate(&ada));
//!
//! let row = build_projection::<Person>(&SelectSpec::of(["Name"]))
//!     .unwrap()
//!     .apply(&ada)
//!     .unwrap();
//! assert_eq!(row.get("Name"), Some(&Value::Text("Ada".into())));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod config;
pub mod core;
pub mod error;
pub mod query;
pub mod repository;
pub mod schema;
pub mod types;

// Re-export commonly used types at crate root
pub use config::{MemoryBackendConfig, RepositoryConfig};
pub use error::{ErrorClass, QueryError, StorageError, StorageResult};
pub use repository::Repository;
pub use schema::{BaseFields, Entity, EntitySchema};
pub use types::{CombinedFilter, FilterOperator, FilterSpec, Pagination, SelectSpec};

// Re-export core traits
pub use core::{BackendCapability, BackendKind, BackendSession, CancellationHandle, QueryBackend};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
