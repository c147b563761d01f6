//! Cache configuration.

use std::{num::NonZeroUsize, time::Duration};

use crate::config::{CacheBackendKind, CacheSettings};

const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/0";
const DEFAULT_LIST_TTL: Duration = Duration::from_secs(60);
const DEFAULT_DETAIL_TTL: Duration = Duration::from_secs(300);
const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(2);
const DEFAULT_SCAN_BATCH: usize = 100;
const DEFAULT_MEMORY_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// When false the store never connects and every read is a miss.
    pub enabled: bool,
    pub backend: CacheBackendKind,
    pub redis_url: String,
    /// TTL for list pages. `None` stores without expiry.
    pub list_ttl: Option<Duration>,
    /// TTL for article details. `None` stores without expiry.
    pub detail_ttl: Option<Duration>,
    /// Upper bound for any single backend round trip.
    pub operation_timeout: Duration,
    /// `COUNT` hint for each `SCAN` step during pattern deletes.
    pub scan_batch: usize,
    /// Entry limit of the in-memory backend.
    pub memory_capacity: NonZeroUsize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackendKind::Redis,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            list_ttl: Some(DEFAULT_LIST_TTL),
            detail_ttl: Some(DEFAULT_DETAIL_TTL),
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            scan_batch: DEFAULT_SCAN_BATCH,
            memory_capacity: NonZeroUsize::new(DEFAULT_MEMORY_CAPACITY).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl From<&CacheSettings> for CacheConfig {
    fn from(settings: &CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            backend: settings.backend,
            redis_url: settings.redis_url.clone(),
            list_ttl: settings.list_ttl,
            detail_ttl: settings.detail_ttl,
            operation_timeout: settings.operation_timeout,
            scan_batch: settings.scan_batch.get() as usize,
            memory_capacity: settings.memory_capacity,
        }
    }
}

impl CacheConfig {
    /// In-memory configuration, used by tests and single-node deployments.
    pub fn memory() -> Self {
        Self {
            backend: CacheBackendKind::Memory,
            ..Self::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}
