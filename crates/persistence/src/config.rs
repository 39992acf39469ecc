//! Repository and backend configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::Pagination;

fn default_take() -> u32 {
    10
}

fn default_apply_default_order() -> bool {
    true
}

fn default_max_sessions() -> usize {
    16
}

fn default_acquire_timeout_ms() -> u64 {
    5000
}

/// Repository-level query defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Page size of programmatic listings started with
    /// [`Repository::items`](crate::Repository::items). Wire requests carry
    /// their own take.
    #[serde(default = "default_take")]
    pub default_take: u32,

    /// Upper bound applied to every requested page size. `None` keeps
    /// requested sizes, including unbounded ones.
    #[serde(default)]
    pub max_take: Option<u32>,

    /// Order unordered, ungrouped listings by the entity's modification
    /// timestamp, newest first.
    #[serde(default = "default_apply_default_order")]
    pub apply_default_order: bool,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            default_take: default_take(),
            max_take: None,
            apply_default_order: default_apply_default_order(),
        }
    }
}

impl RepositoryConfig {
    /// Sets the default page size.
    pub fn with_default_take(mut self, take: u32) -> Self {
        self.default_take = take;
        self
    }

    /// Caps every page size at `max`.
    pub fn with_max_take(mut self, max: u32) -> Self {
        self.max_take = Some(max);
        self
    }

    /// Enables or disables the newest-first default ordering.
    pub fn with_default_order(mut self, enabled: bool) -> Self {
        self.apply_default_order = enabled;
        self
    }

    /// Builds the pagination window for a request, applying `max_take`.
    pub fn pagination(&self, skip: u32, take: u32) -> Pagination {
        Pagination::new(skip, take).capped(self.max_take)
    }
}

/// Configuration for the in-memory backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryBackendConfig {
    /// Maximum number of concurrently held sessions.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// How long `acquire` waits for a free session, in milliseconds.
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
}

impl Default for MemoryBackendConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
        }
    }
}

impl MemoryBackendConfig {
    /// Sets the maximum number of concurrent sessions.
    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }

    /// Sets the acquire timeout.
    pub fn with_acquire_timeout_ms(mut self, timeout: u64) -> Self {
        self.acquire_timeout_ms = timeout;
        self
    }

    /// The acquire timeout as a [`Duration`].
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}
