//! Generic repository over a query backend.
//!
//! The [`Repository`] compiles request models into typed expressions, checks
//! that the backend can execute them, then runs them in a session acquired
//! for that one operation. Errors are surfaced as follows:
//!
//! - compile errors are returned before a session is acquired
//! - a uniqueness violation becomes [`StorageError::Conflict`]
//! - any failure observed after the caller signalled its
//!   [`CancellationHandle`] becomes [`StorageError::Cancelled`]
//! - everything else is passed through unchanged
//!
//! # Example
//!
//! ```ignore
//! use sieve_persistence::backends::memory::MemoryBackend;
//! use sieve_persistence::repository::Repository;
//! use sieve_persistence::types::{CombinedFilter, FilterOperator, FilterSpec, GetItemsRequest};
//!
//! let repo = Repository::new(MemoryBackend::<Person>::default());
//! let request = GetItemsRequest {
//!     combined_filters: Some(CombinedFilter::all(vec![
//!         FilterSpec::eq("Name", "Bob"),
//!         FilterSpec::new("Age", FilterOperator::GreaterThan, Some("30")),
//!     ])),
//!     ..Default::default()
//! };
//! let people = repo.get_items(&request, None).await?;
//! ```

mod query;

use std::fmt;
use std::marker::PhantomData;

use chrono::Utc;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::config::RepositoryConfig;
use crate::core::{BackendCapability, BackendSession, CancellationHandle, QueryBackend, QueryPlan};
use crate::error::{BackendError, ResourceError, StorageError, StorageResult};
use crate::query::{Predicate, Record};
use crate::schema::Entity;
use crate::types::{
    CombinedFilter, FilterSpec, GetItemsRequest, GetSelectRequest, GroupByRequest,
    UpdateWhereRequest,
};

pub use query::{GroupQuery, ItemsQuery, SelectQuery, UpdateWhere, resolve_includes};

/// Data access for entities of type `E` stored in backend `B`.
pub struct Repository<E, B> {
    backend: B,
    config: RepositoryConfig,
    _entity: PhantomData<fn() -> E>,
}

impl<E, B> Repository<E, B>
where
    E: Entity,
    B: QueryBackend<E>,
{
    /// Creates a repository with the default configuration.
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, RepositoryConfig::default())
    }

    /// Creates a repository with the given configuration.
    pub fn with_config(backend: B, config: RepositoryConfig) -> Self {
        Self {
            backend,
            config,
            _entity: PhantomData,
        }
    }

    /// Returns the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Starts a programmatic listing query with the configured page size.
    pub fn items(&self) -> ItemsQuery<E> {
        ItemsQuery::new(self.config.default_take)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Executes a compiled plan.
    pub async fn query(
        &self,
        plan: QueryPlan<E>,
        cancel: Option<&CancellationHandle>,
    ) -> StorageResult<Vec<Record<E>>> {
        plan.validate()?;
        self.require(&plan.required_capabilities())?;
        debug!(
            entity = E::schema().name(),
            backend = self.backend.name(),
            plan = %plan,
            "Executing query"
        );
        let mut session = self.acquire().await?;
        let result = session.fetch(&plan, cancel).await;
        self.finish("query", result, cancel)
    }

    /// Executes a listing query.
    pub async fn query_items(
        &self,
        query: ItemsQuery<E>,
        cancel: Option<&CancellationHandle>,
    ) -> StorageResult<Vec<Record<E>>> {
        self.query(query.into_plan(&self.config), cancel).await
    }

    /// Compiles and executes a listing request.
    pub async fn get_items(
        &self,
        request: &GetItemsRequest,
        cancel: Option<&CancellationHandle>,
    ) -> StorageResult<Vec<Record<E>>> {
        let query = ItemsQuery::compile(request)?;
        self.query_items(query, cancel).await
    }

    /// Returns one representative record per distinct value of the group
    /// column.
    pub async fn group_by_distinct(
        &self,
        request: &GroupByRequest,
        cancel: Option<&CancellationHandle>,
    ) -> StorageResult<Vec<Record<E>>> {
        let query = GroupQuery::compile(request)?;
        self.query(query.into_plan(&self.config), cancel).await
    }

    /// Loads one entity with the requested navigations.
    pub async fn get(&self, id: Uuid, includes: &[String]) -> StorageResult<E> {
        let mut plan = QueryPlan::new().filter(by_id(id)?);
        plan.includes = resolve_includes::<E>(includes)?;
        let record = self.query(plan, None).await?.into_iter().next();
        record
            .and_then(Record::into_entity)
            .ok_or_else(|| not_found::<E>(id))
    }

    /// Loads one entity projected as requested.
    pub async fn get_select(&self, id: Uuid, request: &GetSelectRequest) -> StorageResult<Record<E>> {
        let plan = SelectQuery::compile(request)?.into_plan(by_id(id)?);
        self.query(plan, None)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| not_found::<E>(id))
    }

    /// Loads every entity in backend order.
    pub async fn get_all(&self, cancel: Option<&CancellationHandle>) -> StorageResult<Vec<E>> {
        let records = self.query(QueryPlan::new(), cancel).await?;
        Ok(records.into_iter().filter_map(Record::into_entity).collect())
    }

    /// Loads the first entity matching `filter`, newest first when the
    /// default ordering applies.
    pub async fn first(
        &self,
        filter: Option<&CombinedFilter>,
        cancel: Option<&CancellationHandle>,
    ) -> StorageResult<Option<E>> {
        let mut query = self.items().page(0, 1);
        if let Some(filter) = filter {
            query = query.filter(Predicate::combine(filter)?);
        }
        let records = self.query_items(query, cancel).await?;
        Ok(records.into_iter().next().and_then(Record::into_entity))
    }

    /// Counts entities matching `filter`, or all entities.
    pub async fn count(
        &self,
        filter: Option<&CombinedFilter>,
        cancel: Option<&CancellationHandle>,
    ) -> StorageResult<u64> {
        let filter = filter.map(Predicate::<E>::combine).transpose()?;
        if filter.is_some() {
            self.require(&[BackendCapability::Filtering])?;
        }
        let mut session = self.acquire().await?;
        let result = session.count(filter.as_ref(), cancel).await;
        self.finish("count", result, cancel)
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Stores a new entity.
    ///
    /// A nil id is replaced with a fresh v4 id; creation and modification
    /// timestamps are set to now.
    pub async fn insert(&self, entity: E) -> StorageResult<E> {
        let mut inserted = self.bulk_insert(vec![entity]).await?;
        inserted.pop().ok_or_else(|| {
            StorageError::Backend(BackendError::Internal {
                backend_name: self.backend.name().to_string(),
                message: "insert returned no entity".to_string(),
                source: None,
            })
        })
    }

    /// Stores several new entities atomically.
    pub async fn bulk_insert(&self, mut entities: Vec<E>) -> StorageResult<Vec<E>> {
        let now = Utc::now();
        for entity in &mut entities {
            let base = entity.base_mut();
            if base.id.is_nil() {
                base.id = Uuid::new_v4();
            }
            base.created_at = now;
            base.modified_at = now;
        }
        debug!(entity = E::schema().name(), count = entities.len(), "Inserting entities");

        let mut session = self.acquire().await?;
        let result = session.insert(entities.clone()).await;
        self.finish("insert", result, None)?;
        Ok(entities)
    }

    /// Replaces the entity with `id`.
    ///
    /// The stored `Id`, `CreatedAt`, `IsDeleted` and `CreatorId` are kept;
    /// `ModifiedAt` is set to now.
    pub async fn update(&self, id: Uuid, mut entity: E) -> StorageResult<E> {
        let filter = by_id(id)?;
        let mut session = self.acquire().await?;

        let result = session.fetch(&QueryPlan::new().filter(filter), None).await;
        let existing = self
            .finish("update", result, None)?
            .into_iter()
            .next()
            .and_then(Record::into_entity)
            .ok_or_else(|| not_found::<E>(id))?;

        let stored = existing.base();
        let base = entity.base_mut();
        base.id = id;
        base.created_at = stored.created_at;
        base.is_deleted = stored.is_deleted;
        base.creator_id = stored.creator_id;
        base.modified_at = Utc::now();

        debug!(entity = E::schema().name(), %id, "Updating entity");
        let result = session.replace(entity.clone()).await;
        if !self.finish("update", result, None)? {
            return Err(not_found::<E>(id));
        }
        Ok(entity)
    }

    /// Compiles and applies a bulk update, returning the number of rows
    /// changed.
    pub async fn update_where(
        &self,
        request: &UpdateWhereRequest,
        cancel: Option<&CancellationHandle>,
    ) -> StorageResult<u64> {
        let update = UpdateWhere::compile(request)?;
        self.execute_update(&update, cancel).await
    }

    /// Applies a compiled bulk update.
    pub async fn execute_update(
        &self,
        update: &UpdateWhere<E>,
        cancel: Option<&CancellationHandle>,
    ) -> StorageResult<u64> {
        self.require(&[BackendCapability::BulkUpdate])?;
        debug!(entity = E::schema().name(), update = %update, "Applying bulk update");
        let mut session = self.acquire().await?;
        let result = session
            .update_where(update.filter.as_ref(), &update.mutation, cancel)
            .await;
        self.finish("update_where", result, cancel)
    }

    /// Removes the entity with `id`.
    pub async fn delete(&self, id: Uuid) -> StorageResult<()> {
        let filter = by_id(id)?;
        let mut session = self.acquire().await?;
        let result = session.delete_where(Some(&filter), None).await;
        match self.finish("delete", result, None)? {
            0 => Err(not_found::<E>(id)),
            _ => Ok(()),
        }
    }

    /// Removes every entity matching `filter`, returning how many were
    /// removed. `None` removes everything.
    pub async fn delete_where(
        &self,
        filter: Option<&CombinedFilter>,
        cancel: Option<&CancellationHandle>,
    ) -> StorageResult<u64> {
        let filter = filter.map(Predicate::<E>::combine).transpose()?;
        self.require(&[BackendCapability::BulkDelete])?;
        debug!(
            entity = E::schema().name(),
            filter = ?filter.as_ref().map(ToString::to_string),
            "Applying bulk delete"
        );
        let mut session = self.acquire().await?;
        let result = session.delete_where(filter.as_ref(), cancel).await;
        self.finish("delete_where", result, cancel)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn require(&self, capabilities: &[BackendCapability]) -> StorageResult<()> {
        match capabilities.iter().find(|c| !self.backend.supports(**c)) {
            Some(missing) => Err(BackendError::UnsupportedCapability {
                backend_name: self.backend.name().to_string(),
                capability: missing.to_string(),
            }
            .into()),
            None => Ok(()),
        }
    }

    async fn acquire(&self) -> StorageResult<B::Session> {
        self.backend.acquire().await.map_err(|err| {
            error!(backend = self.backend.name(), error = %err, "Failed to acquire session");
            StorageError::from(err)
        })
    }

    fn finish<T>(
        &self,
        operation: &'static str,
        result: StorageResult<T>,
        cancel: Option<&CancellationHandle>,
    ) -> StorageResult<T> {
        let err = match result {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        let entity = E::schema().name();

        if cancel.is_some_and(CancellationHandle::is_cancelled) {
            error!(entity, operation, error = %err, "Operation cancelled");
            return Err(StorageError::Cancelled);
        }

        match err {
            StorageError::Backend(BackendError::UniqueViolation {
                backend_name,
                entity: violated,
                constraint,
            }) => {
                warn!(entity, operation, constraint = %constraint, "Unique constraint violated");
                Err(StorageError::Conflict {
                    entity: violated.clone(),
                    constraint: constraint.clone(),
                    source: BackendError::UniqueViolation {
                        backend_name,
                        entity: violated,
                        constraint,
                    },
                })
            }
            StorageError::Backend(backend) => {
                error!(entity, operation, error = %backend, "Backend operation failed");
                Err(StorageError::Backend(backend))
            }
            other => Err(other),
        }
    }
}

impl<E, B: fmt::Debug> fmt::Debug for Repository<E, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("backend", &self.backend)
            .field("config", &self.config)
            .finish()
    }
}

fn by_id<E: Entity>(id: Uuid) -> StorageResult<Predicate<E>> {
    Ok(Predicate::from_filter(&FilterSpec::eq("Id", &id.to_string()))?)
}

fn not_found<E: Entity>(id: Uuid) -> StorageError {
    ResourceError::NotFound {
        entity: E::schema().name().to_string(),
        id: id.to_string(),
    }
    .into()
}
