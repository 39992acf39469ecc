//! Test harness: contexts over the in-memory backend and backend doubles.
//!
//! [`TestContext`] owns a seeded [`MemoryBackend`] and a repository over it.
//! [`CountingBackend`] wraps the memory backend to record session
//! acquisitions and restrict capabilities; [`StallingBackend`] never finishes
//! a read until the caller cancels it.

use std::sync::Arc;
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing_subscriber::EnvFilter;

use sieve_persistence::backends::memory::{MemoryBackend, MemorySession};
use sieve_persistence::config::{MemoryBackendConfig, RepositoryConfig};
use sieve_persistence::core::{
    BackendCapability, BackendKind, BackendSession, CancellationHandle, QueryBackend, QueryPlan,
};
use sieve_persistence::error::{BackendError, StorageResult};
use sieve_persistence::query::{Mutation, Predicate, Record};
use sieve_persistence::repository::Repository;

use super::fixtures::{Person, people};

static TRACING: Once = Once::new();

/// Installs a test subscriber honouring `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Stores `entities` directly, bypassing the repository's id and timestamp
/// stamping.
pub async fn seed<B: QueryBackend<Person>>(backend: &B, entities: Vec<Person>) {
    let mut session = backend.acquire().await.expect("Failed to acquire session");
    session
        .insert(entities)
        .await
        .expect("Failed to seed backend");
}

/// A repository over a seeded in-memory backend.
pub struct TestContext {
    /// The backend, shared with the repository.
    pub backend: MemoryBackend<Person>,

    /// The repository under test.
    pub repo: Repository<Person, MemoryBackend<Person>>,
}

impl TestContext {
    /// A context with no stored entities.
    pub fn empty() -> Self {
        Self::with_config(RepositoryConfig::default(), MemoryBackendConfig::default())
    }

    /// A context with custom configuration and no stored entities.
    pub fn with_config(config: RepositoryConfig, backend_config: MemoryBackendConfig) -> Self {
        init_tracing();
        let backend = MemoryBackend::new(backend_config);
        Self {
            repo: Repository::with_config(backend.clone(), config),
            backend,
        }
    }

    /// A context seeded with [`people`].
    pub async fn with_people() -> Self {
        Self::seeded(people()).await
    }

    /// A context seeded with `entities`.
    pub async fn seeded(entities: Vec<Person>) -> Self {
        let ctx = Self::empty();
        seed(&ctx.backend, entities).await;
        ctx
    }

    /// Names of the stored people, in storage order.
    pub fn stored_names(&self) -> Vec<String> {
        self.backend.snapshot().into_iter().map(|p| p.name).collect()
    }
}

/// Extracts the entity names from query results.
pub fn names(records: &[Record<Person>]) -> Vec<&str> {
    records
        .iter()
        .filter_map(Record::as_entity)
        .map(|p| p.name.as_str())
        .collect()
}

// ============================================================================
// Counting backend
// ============================================================================

/// Delegates to a [`MemoryBackend`], counting session acquisitions.
#[derive(Debug, Clone)]
pub struct CountingBackend {
    inner: MemoryBackend<Person>,
    capabilities: Vec<BackendCapability>,
    acquired: Arc<AtomicUsize>,
}

impl CountingBackend {
    /// Wraps `inner` with every capability it supports.
    pub fn new(inner: MemoryBackend<Person>) -> Self {
        let capabilities = inner.capabilities();
        Self::with_capabilities(inner, capabilities)
    }

    /// Wraps `inner`, advertising only `capabilities`.
    pub fn with_capabilities(
        inner: MemoryBackend<Person>,
        capabilities: Vec<BackendCapability>,
    ) -> Self {
        Self {
            inner,
            capabilities,
            acquired: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of sessions acquired so far.
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryBackend<Person> for CountingBackend {
    type Session = MemorySession<Person>;

    fn kind(&self) -> BackendKind {
        BackendKind::Custom("counting")
    }

    fn name(&self) -> &'static str {
        "counting"
    }

    fn supports(&self, capability: BackendCapability) -> bool {
        self.capabilities.contains(&capability)
    }

    fn capabilities(&self) -> Vec<BackendCapability> {
        self.capabilities.clone()
    }

    async fn acquire(&self) -> Result<Self::Session, BackendError> {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        self.inner.acquire().await
    }
}

// ============================================================================
// Stalling backend
// ============================================================================

/// Backend whose reads and bulk writes only finish once cancelled, and
/// whose inserts always fail.
#[derive(Debug, Clone, Default)]
pub struct StallingBackend;

/// Session of a [`StallingBackend`].
#[derive(Debug)]
pub struct StallingSession;

const STALLING: &str = "stalling";

async fn stall<T>(cancel: Option<&CancellationHandle>) -> StorageResult<T> {
    match cancel {
        Some(cancel) => {
            cancel.cancelled().await;
            Err(BackendError::Interrupted {
                backend_name: STALLING.to_string(),
            }
            .into())
        }
        None => std::future::pending().await,
    }
}

#[async_trait]
impl QueryBackend<Person> for StallingBackend {
    type Session = StallingSession;

    fn kind(&self) -> BackendKind {
        BackendKind::Custom(STALLING)
    }

    fn name(&self) -> &'static str {
        STALLING
    }

    fn supports(&self, _capability: BackendCapability) -> bool {
        true
    }

    fn capabilities(&self) -> Vec<BackendCapability> {
        Vec::new()
    }

    async fn acquire(&self) -> Result<Self::Session, BackendError> {
        Ok(StallingSession)
    }
}

#[async_trait]
impl BackendSession<Person> for StallingSession {
    async fn fetch(
        &mut self,
        _plan: &QueryPlan<Person>,
        cancel: Option<&CancellationHandle>,
    ) -> StorageResult<Vec<Record<Person>>> {
        stall(cancel).await
    }

    async fn count(
        &mut self,
        _filter: Option<&Predicate<Person>>,
        cancel: Option<&CancellationHandle>,
    ) -> StorageResult<u64> {
        stall(cancel).await
    }

    async fn insert(&mut self, _entities: Vec<Person>) -> StorageResult<()> {
        Err(BackendError::Unavailable {
            backend_name: STALLING.to_string(),
            message: "writes are disabled".to_string(),
        }
        .into())
    }

    async fn replace(&mut self, _entity: Person) -> StorageResult<bool> {
        Ok(false)
    }

    async fn update_where(
        &mut self,
        _filter: Option<&Predicate<Person>>,
        _mutation: &Mutation<Person>,
        cancel: Option<&CancellationHandle>,
    ) -> StorageResult<u64> {
        stall(cancel).await
    }

    async fn delete_where(
        &mut self,
        _filter: Option<&Predicate<Person>>,
        cancel: Option<&CancellationHandle>,
    ) -> StorageResult<u64> {
        stall(cancel).await
    }
}
