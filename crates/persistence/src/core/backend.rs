//! Backend abstraction for query execution.
//!
//! A [`QueryBackend`] hands out [`BackendSession`]s. A session is the unit of
//! work for one repository operation: it is acquired immediately before the
//! backend call and released when dropped, on every exit path.

use std::fmt::{self, Debug};

use async_trait::async_trait;

use crate::error::{BackendError, StorageResult};
use crate::query::{Mutation, Predicate, Record};
use crate::schema::Entity;

use super::cancel::CancellationHandle;
use super::plan::QueryPlan;

/// Identifies the type of query backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// In-process collection.
    Memory,
    /// Custom or unknown backend.
    Custom(&'static str),
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Memory => write!(f, "memory"),
            BackendKind::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Capabilities that a backend may support.
///
/// The repository checks the capabilities a plan needs before acquiring a
/// session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendCapability {
    /// Predicate push-down.
    Filtering,
    /// Row projections.
    Projection,
    /// Single-key ordering.
    Ordering,
    /// Grouping with a representative per group.
    Grouping,
    /// Skip/take windows.
    Pagination,
    /// In-place bulk mutation.
    BulkUpdate,
    /// Bulk deletion by predicate.
    BulkDelete,
    /// Eager loading of navigations.
    EagerLoading,
    /// Enforcement of uniqueness constraints.
    UniqueConstraints,
    /// Cooperative cancellation during execution.
    Cancellation,
}

impl fmt::Display for BackendCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendCapability::Filtering => "filtering",
            BackendCapability::Projection => "projection",
            BackendCapability::Ordering => "ordering",
            BackendCapability::Grouping => "grouping",
            BackendCapability::Pagination => "pagination",
            BackendCapability::BulkUpdate => "bulk-update",
            BackendCapability::BulkDelete => "bulk-delete",
            BackendCapability::EagerLoading => "eager-loading",
            BackendCapability::UniqueConstraints => "unique-constraints",
            BackendCapability::Cancellation => "cancellation",
        };
        write!(f, "{}", name)
    }
}

/// A store that executes compiled queries over entities of type `E`.
///
/// # Example
///
/// ```ignore
/// use sieve_persistence::core::{BackendCapability, QueryBackend};
///
/// if !backend.supports(BackendCapability::Grouping) {
///     // reject group-by requests up front
/// }
/// let mut session = backend.acquire().await?;
/// let rows = session.fetch(&plan, None).await?;
/// // session released here
/// ```
#[async_trait]
pub trait QueryBackend<E: Entity>: Send + Sync + Debug {
    /// The session type; dropping it releases the session.
    type Session: BackendSession<E>;

    /// Returns the kind of backend.
    fn kind(&self) -> BackendKind;

    /// Returns a human-readable name for this backend.
    fn name(&self) -> &'static str;

    /// Checks if this backend supports the given capability.
    fn supports(&self, capability: BackendCapability) -> bool;

    /// Returns all capabilities supported by this backend.
    fn capabilities(&self) -> Vec<BackendCapability>;

    /// Acquires a session.
    async fn acquire(&self) -> Result<Self::Session, BackendError>;
}

/// One acquired unit of work against a backend.
///
/// Operations that take a [`CancellationHandle`] check it cooperatively and
/// fail with [`BackendError::Interrupted`] once it is signalled. Uniqueness
/// violations are reported as [`BackendError::UniqueViolation`]; errors
/// raised while projecting rows are passed through as query errors.
#[async_trait]
pub trait BackendSession<E: Entity>: Send {
    /// Executes a query plan and materialises its records.
    async fn fetch(
        &mut self,
        plan: &QueryPlan<E>,
        cancel: Option<&CancellationHandle>,
    ) -> StorageResult<Vec<Record<E>>>;

    /// Counts entities matching `filter` (all entities when `None`).
    async fn count(
        &mut self,
        filter: Option<&Predicate<E>>,
        cancel: Option<&CancellationHandle>,
    ) -> StorageResult<u64>;

    /// Inserts entities atomically: either all are stored or none.
    async fn insert(&mut self, entities: Vec<E>) -> StorageResult<()>;

    /// Replaces the stored entity with the same id.
    ///
    /// Returns `false` when no such entity exists.
    async fn replace(&mut self, entity: E) -> StorageResult<bool>;

    /// Applies `mutation` to every entity matching `filter`, returning the
    /// number of entities changed.
    async fn update_where(
        &mut self,
        filter: Option<&Predicate<E>>,
        mutation: &Mutation<E>,
        cancel: Option<&CancellationHandle>,
    ) -> StorageResult<u64>;

    /// Removes every entity matching `filter`, returning the number removed.
    async fn delete_where(
        &mut self,
        filter: Option<&Predicate<E>>,
        cancel: Option<&CancellationHandle>,
    ) -> StorageResult<u64>;
}
