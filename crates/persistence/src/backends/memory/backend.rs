//! In-memory backend implementation.

use std::fmt::{self, Debug};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::MemoryBackendConfig;
use crate::core::{
    BackendCapability, BackendKind, BackendSession, CancellationHandle, QueryBackend, QueryPlan,
};
use crate::error::{BackendError, StorageResult};
use crate::query::{Mutation, Predicate, Record};
use crate::schema::Entity;

use super::BACKEND_NAME;
use super::executor;

/// In-process store of entities of type `E`.
///
/// Clones share the same store and session pool.
pub struct MemoryBackend<E> {
    store: Arc<RwLock<Vec<E>>>,
    sessions: Arc<Semaphore>,
    config: MemoryBackendConfig,
}

impl<E: Entity> MemoryBackend<E> {
    /// Creates an empty backend.
    pub fn new(config: MemoryBackendConfig) -> Self {
        Self {
            store: Arc::new(RwLock::new(Vec::new())),
            sessions: Arc::new(Semaphore::new(config.max_sessions)),
            config,
        }
    }

    /// Returns the backend configuration.
    pub fn config(&self) -> &MemoryBackendConfig {
        &self.config
    }

    /// Number of stored entities.
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    /// Number of sessions that can be acquired right now.
    pub fn available_sessions(&self) -> usize {
        self.sessions.available_permits()
    }

    /// Copies the stored entities in storage order.
    pub fn snapshot(&self) -> Vec<E> {
        self.store.read().clone()
    }
}

impl<E: Entity> Default for MemoryBackend<E> {
    fn default() -> Self {
        Self::new(MemoryBackendConfig::default())
    }
}

impl<E> Clone for MemoryBackend<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            sessions: Arc::clone(&self.sessions),
            config: self.config.clone(),
        }
    }
}

impl<E> Debug for MemoryBackend<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("config", &self.config)
            .field("len", &self.store.read().len())
            .field("available_sessions", &self.sessions.available_permits())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<E: Entity> QueryBackend<E> for MemoryBackend<E> {
    type Session = MemorySession<E>;

    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn supports(&self, _capability: BackendCapability) -> bool {
        true
    }

    fn capabilities(&self) -> Vec<BackendCapability> {
        vec![
            BackendCapability::Filtering,
            BackendCapability::Projection,
            BackendCapability::Ordering,
            BackendCapability::Grouping,
            BackendCapability::Pagination,
            BackendCapability::BulkUpdate,
            BackendCapability::BulkDelete,
            BackendCapability::EagerLoading,
            BackendCapability::UniqueConstraints,
            BackendCapability::Cancellation,
        ]
    }

    async fn acquire(&self) -> Result<Self::Session, BackendError> {
        let permit = tokio::time::timeout(
            self.config.acquire_timeout(),
            Arc::clone(&self.sessions).acquire_owned(),
        )
        .await
        .map_err(|_| BackendError::PoolExhausted {
            backend_name: BACKEND_NAME.to_string(),
        })?
        .map_err(|_| BackendError::Unavailable {
            backend_name: BACKEND_NAME.to_string(),
            message: "session pool closed".to_string(),
        })?;

        tracing::trace!(
            available = self.sessions.available_permits(),
            "Acquired memory session"
        );
        Ok(MemorySession {
            store: Arc::clone(&self.store),
            _permit: permit,
        })
    }
}

/// A session on a [`MemoryBackend`]. Dropping it frees its pool slot.
pub struct MemorySession<E> {
    store: Arc<RwLock<Vec<E>>>,
    _permit: OwnedSemaphorePermit,
}

impl<E> Debug for MemorySession<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySession").finish_non_exhaustive()
    }
}

#[async_trait]
impl<E: Entity> BackendSession<E> for MemorySession<E> {
    async fn fetch(
        &mut self,
        plan: &QueryPlan<E>,
        cancel: Option<&CancellationHandle>,
    ) -> StorageResult<Vec<Record<E>>> {
        tokio::task::yield_now().await;
        let rows = self.store.read();
        executor::execute(&rows, plan, cancel)
    }

    async fn count(
        &mut self,
        filter: Option<&Predicate<E>>,
        cancel: Option<&CancellationHandle>,
    ) -> StorageResult<u64> {
        tokio::task::yield_now().await;
        let rows = self.store.read();
        let matched = executor::matching(&rows, filter, cancel)?;
        Ok(matched.len() as u64)
    }

    async fn insert(&mut self, entities: Vec<E>) -> StorageResult<()> {
        let mut rows = self.store.write();
        let start = rows.len();
        rows.extend(entities);
        let added: Vec<usize> = (start..rows.len()).collect();
        if let Err(err) = executor::check_unique(&rows, &added) {
            rows.truncate(start);
            return Err(err.into());
        }
        Ok(())
    }

    async fn replace(&mut self, entity: E) -> StorageResult<bool> {
        let mut rows = self.store.write();
        let Some(index) = rows.iter().position(|row| row.id() == entity.id()) else {
            return Ok(false);
        };
        let previous = std::mem::replace(&mut rows[index], entity);
        if let Err(err) = executor::check_unique(&rows, &[index]) {
            rows[index] = previous;
            return Err(err.into());
        }
        Ok(true)
    }

    async fn update_where(
        &mut self,
        filter: Option<&Predicate<E>>,
        mutation: &Mutation<E>,
        cancel: Option<&CancellationHandle>,
    ) -> StorageResult<u64> {
        tokio::task::yield_now().await;
        let mut rows = self.store.write();
        let selected = executor::matching(&rows, filter, cancel)?;
        executor::update_rows(&mut rows, &selected, mutation)
    }

    async fn delete_where(
        &mut self,
        filter: Option<&Predicate<E>>,
        cancel: Option<&CancellationHandle>,
    ) -> StorageResult<u64> {
        tokio::task::yield_now().await;
        let mut rows = self.store.write();
        let selected = executor::matching(&rows, filter, cancel)?;
        let mut position = 0;
        let mut next = selected.iter().peekable();
        rows.retain(|_| {
            let keep = next.peek() != Some(&&position);
            if !keep {
                next.next();
            }
            position += 1;
            keep
        });
        Ok(selected.len() as u64)
    }
}
