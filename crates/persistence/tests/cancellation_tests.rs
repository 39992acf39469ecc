//! Cancellation and session pool tests.

mod common;

use std::time::Duration;

use common::*;
use sieve_persistence::config::{MemoryBackendConfig, RepositoryConfig};
use sieve_persistence::core::{CancellationHandle, QueryBackend};
use sieve_persistence::error::{BackendError, ErrorClass, StorageError};
use sieve_persistence::repository::Repository;
use sieve_persistence::types::{CombinedFilter, FilterSpec, GetItemsRequest};

fn cancel_after(handle: &CancellationHandle, delay: Duration) {
    let handle = handle.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        handle.cancel();
    });
}

#[tokio::test]
async fn test_cancelled_read_is_reported_as_cancelled() {
    init_tracing();
    let repo: Repository<Person, _> = Repository::new(StallingBackend);
    let cancel = CancellationHandle::new();
    cancel_after(&cancel, Duration::from_millis(10));

    let err = repo
        .get_items(&GetItemsRequest::default(), Some(&cancel))
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Cancelled));
    assert_eq!(err.class(), ErrorClass::Cancelled);
}

#[tokio::test]
async fn test_cancelled_bulk_delete_is_reported_as_cancelled() {
    let repo: Repository<Person, _> = Repository::new(StallingBackend);
    let cancel = CancellationHandle::new();
    cancel_after(&cancel, Duration::from_millis(10));

    let filter = CombinedFilter::all(vec![FilterSpec::eq("Name", "Bob")]);
    let err = repo.delete_where(Some(&filter), Some(&cancel)).await.unwrap_err();
    assert!(matches!(err, StorageError::Cancelled));
}

#[tokio::test]
async fn test_backend_failure_without_cancellation_passes_through() {
    let repo: Repository<Person, _> = Repository::new(StallingBackend);

    let err = repo.insert(Person::new("Eve", 28)).await.unwrap_err();

    assert!(matches!(
        err,
        StorageError::Backend(BackendError::Unavailable { .. })
    ));
    assert_eq!(err.class(), ErrorClass::Internal);
}

#[tokio::test]
async fn test_pre_cancelled_handle_stops_memory_query() {
    let ctx = TestContext::with_people().await;
    let cancel = CancellationHandle::new();
    cancel.cancel();

    let err = ctx
        .repo
        .get_items(&GetItemsRequest::default(), Some(&cancel))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Cancelled));

    let err = ctx.repo.count(None, Some(&cancel)).await.unwrap_err();
    assert!(matches!(err, StorageError::Cancelled));
    assert_eq!(ctx.backend.len(), 5);
}

#[tokio::test]
async fn test_session_released_after_cancellation() {
    let ctx = TestContext::with_config(
        RepositoryConfig::default(),
        MemoryBackendConfig {
            max_sessions: 1,
            acquire_timeout_ms: 100,
        },
    );
    seed(&ctx.backend, people()).await;
    assert_eq!(ctx.backend.available_sessions(), 1);

    let cancel = CancellationHandle::new();
    cancel.cancel();
    let err = ctx.repo.get_all(Some(&cancel)).await.unwrap_err();
    assert!(matches!(err, StorageError::Cancelled));

    assert_eq!(ctx.backend.available_sessions(), 1);
    assert_eq!(ctx.repo.count(None, None).await.unwrap(), 5);
}

#[tokio::test]
async fn test_exhausted_pool_times_out() {
    let ctx = TestContext::with_config(
        RepositoryConfig::default(),
        MemoryBackendConfig {
            max_sessions: 1,
            acquire_timeout_ms: 20,
        },
    );
    seed(&ctx.backend, people()).await;

    let held = ctx.backend.acquire().await.unwrap();
    let err = ctx.repo.count(None, None).await.unwrap_err();
    assert!(matches!(
        err,
        StorageError::Backend(BackendError::PoolExhausted { .. })
    ));

    drop(held);
    assert_eq!(ctx.repo.count(None, None).await.unwrap(), 5);
}
