//! Cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// A cloneable cancellation signal shared between a caller and a backend.
///
/// Cancellation is cooperative: backends check [`is_cancelled`] between
/// units of work. Once signalled, a handle stays signalled.
///
/// [`is_cancelled`]: CancellationHandle::is_cancelled
#[derive(Debug, Clone, Default)]
pub struct CancellationHandle {
    inner: Arc<Inner>,
}

impl CancellationHandle {
    /// Creates an unsignalled handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals cancellation and wakes every waiter.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Returns true once [`cancel`](Self::cancel) has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Completes when the handle is signalled.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}
