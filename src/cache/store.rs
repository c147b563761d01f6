//! Failure-tolerant cache adapter.
//!
//! Every backend failure is absorbed here: reads degrade to a miss, writes
//! and purges to a logged no-op. Callers branch on the returned outcome and
//! never see a [`CacheError`].

use std::{
    future::Future,
    sync::{
        Arc, RwLock,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use metrics::counter;
use quillpost_api_types::CacheInfo;
use tracing::{debug, info, warn};

use crate::config::CacheBackendKind;

use super::{
    backend::{CacheBackend, CacheError},
    config::CacheConfig,
    keys::CacheKey,
    lock::{rw_read, rw_write},
    memory::MemoryBackend,
    payload::{CachedResult, CachedValue},
    redis_backend::RedisBackend,
};

const SOURCE: &str = "cache::store";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissReason {
    Absent,
    Disabled,
    Unavailable,
    Undecodable,
}

impl MissReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Disabled => "disabled",
            Self::Unavailable => "unavailable",
            Self::Undecodable => "undecodable",
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum CacheLookup<T> {
    Hit(T),
    Miss(MissReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheWrite {
    Stored,
    Disabled,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePurge {
    Purged(usize),
    Disabled,
    Failed,
}

/// Result of [`CacheStore::connect`]; never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Connected(&'static str),
    Disabled,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Percentage with one decimal, ties to even, `0.0` before the first access.
    pub hit_rate: f64,
}

impl CacheStats {
    fn compute(hits: u64, misses: u64) -> Self {
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64 * 1000.0).round_ties_even() / 10.0
        };
        Self {
            hits,
            misses,
            hit_rate,
        }
    }

    pub fn to_info(self) -> CacheInfo {
        CacheInfo {
            hits: self.hits,
            misses: self.misses,
            hit_rate: self.hit_rate,
        }
    }
}

pub struct CacheStore {
    backend: RwLock<Option<Arc<dyn CacheBackend>>>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStore {
    /// A store that stays inactive until [`connect`](Self::connect) succeeds.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            backend: RwLock::new(None),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// A store already bound to `backend`, unless caching is disabled.
    pub fn with_backend(config: CacheConfig, backend: Arc<dyn CacheBackend>) -> Self {
        let store = Self::new(config);
        if store.config.enabled {
            *rw_write(&store.backend, SOURCE, "with_backend") = Some(backend);
        }
        store
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.active().is_some()
    }

    pub async fn connect(&self) -> CacheStatus {
        if !self.config.enabled {
            info!("cache disabled by configuration");
            return CacheStatus::Disabled;
        }

        let backend: Arc<dyn CacheBackend> = match self.config.backend {
            CacheBackendKind::Memory => Arc::new(MemoryBackend::new(&self.config)),
            CacheBackendKind::Redis => {
                match self.bounded(RedisBackend::connect(&self.config)).await {
                    Ok(backend) => Arc::new(backend),
                    Err(err) => {
                        warn!(
                            error = %err,
                            url = %self.config.redis_url,
                            "cache connect failed; caching disabled"
                        );
                        return CacheStatus::Unavailable;
                    }
                }
            }
        };

        if let Err(err) = self.bounded(backend.ping()).await {
            warn!(
                backend = backend.name(),
                error = %err,
                "cache ping failed; caching disabled"
            );
            return CacheStatus::Unavailable;
        }

        let name = backend.name();
        *rw_write(&self.backend, SOURCE, "connect") = Some(backend);
        info!(backend = name, "cache connected");
        CacheStatus::Connected(name)
    }

    /// Drop the backend handle. Safe to call any number of times.
    pub fn disconnect(&self) {
        if let Some(backend) = rw_write(&self.backend, SOURCE, "disconnect").take() {
            info!(backend = backend.name(), "cache disconnected");
        }
    }

    pub async fn get<T: CachedValue>(&self, key: &CacheKey) -> CacheLookup<T> {
        let lookup = self.lookup(key).await;
        match &lookup {
            CacheLookup::Hit(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                counter!("quillpost_cache_hit_total").increment(1);
            }
            CacheLookup::Miss(reason) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                counter!("quillpost_cache_miss_total", "reason" => reason.as_str()).increment(1);
            }
        }
        lookup
    }

    async fn lookup<T: CachedValue>(&self, key: &CacheKey) -> CacheLookup<T> {
        let Some(backend) = self.active() else {
            return CacheLookup::Miss(MissReason::Disabled);
        };
        let key = key.to_string();

        let bytes = match self.bounded(backend.get(&key)).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return CacheLookup::Miss(MissReason::Absent),
            Err(err) => {
                debug!(key = %key, error = %err, "cache get failed");
                return CacheLookup::Miss(MissReason::Unavailable);
            }
        };

        let decoded = serde_json::from_slice::<CachedResult>(&bytes)
            .map_err(CacheError::Decode)
            .map(T::from_cached);
        match decoded {
            Ok(Some(value)) => CacheLookup::Hit(value),
            Ok(None) => {
                debug!(key = %key, "cached payload has a different kind");
                CacheLookup::Miss(MissReason::Undecodable)
            }
            Err(err) => {
                debug!(key = %key, error = %err, "cache payload undecodable");
                CacheLookup::Miss(MissReason::Undecodable)
            }
        }
    }

    pub async fn set<T: CachedValue>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: Option<Duration>,
    ) -> CacheWrite {
        let Some(backend) = self.active() else {
            return CacheWrite::Disabled;
        };
        let key = key.to_string();

        let result = match serde_json::to_vec(&value.as_cached()).map_err(CacheError::Encode) {
            Ok(bytes) => self.bounded(backend.set(&key, bytes, ttl)).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => CacheWrite::Stored,
            Err(err) => {
                counter!("quillpost_cache_write_failed_total").increment(1);
                debug!(key = %key, error = %err, "cache set failed");
                CacheWrite::Failed
            }
        }
    }

    pub async fn delete(&self, key: &CacheKey) -> CachePurge {
        let key = key.to_string();
        let keys = std::slice::from_ref(&key);
        self.purge(&key, |backend| async move { backend.delete(keys).await })
            .await
    }

    /// Remove every key matching a glob pattern: incremental scan, then one batch delete.
    pub async fn delete_pattern(&self, pattern: &str) -> CachePurge {
        self.purge(pattern, |backend| async move {
            let keys = backend.scan(pattern).await?;
            if keys.is_empty() {
                return Ok(0);
            }
            backend.delete(&keys).await
        })
        .await
    }

    async fn purge<F, Fut>(&self, target: &str, run: F) -> CachePurge
    where
        F: FnOnce(Arc<dyn CacheBackend>) -> Fut,
        Fut: Future<Output = Result<usize, CacheError>>,
    {
        let Some(backend) = self.active() else {
            return CachePurge::Disabled;
        };

        match self.bounded(run(backend)).await {
            Ok(removed) => {
                counter!("quillpost_cache_invalidated_keys_total").increment(removed as u64);
                debug!(pattern = target, removed, "cache invalidated");
                CachePurge::Purged(removed)
            }
            Err(err) => {
                warn!(pattern = target, error = %err, "cache invalidation failed");
                CachePurge::Failed
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats::compute(
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    fn active(&self) -> Option<Arc<dyn CacheBackend>> {
        rw_read(&self.backend, SOURCE, "active").clone()
    }

    async fn bounded<T, Fut>(&self, fut: Fut) -> Result<T, CacheError>
    where
        Fut: Future<Output = Result<T, CacheError>>,
    {
        let limit = self.config.operation_timeout;
        tokio::time::timeout(limit, fut)
            .await
            .unwrap_or(Err(CacheError::Timeout(limit)))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use quillpost_api_types::{ArticleResponse, PaginatedResponse};

    use super::*;
    use crate::{application::pagination::ListParams, cache::keys::list_pattern};

    fn page(total: u64) -> PaginatedResponse<ArticleResponse> {
        PaginatedResponse {
            items: Vec::new(),
            total,
            page: 1,
            page_size: 20,
            pages: 0,
        }
    }

    fn memory_store() -> CacheStore {
        let config = CacheConfig::memory();
        let backend = Arc::new(MemoryBackend::new(&config));
        CacheStore::with_backend(config, backend)
    }

    struct BrokenBackend;

    #[async_trait]
    impl CacheBackend for BrokenBackend {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn ping(&self) -> Result<(), CacheError> {
            Err(CacheError::Timeout(Duration::ZERO))
        }

        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            Err(CacheError::Timeout(Duration::ZERO))
        }

        async fn set(&self, _: &str, _: Vec<u8>, _: Option<Duration>) -> Result<(), CacheError> {
            Err(CacheError::Timeout(Duration::ZERO))
        }

        async fn scan(&self, _pattern: &str) -> Result<Vec<String>, CacheError> {
            Err(CacheError::Timeout(Duration::ZERO))
        }

        async fn delete(&self, _keys: &[String]) -> Result<usize, CacheError> {
            Err(CacheError::Timeout(Duration::ZERO))
        }
    }

    struct StalledBackend;

    #[async_trait]
    impl CacheBackend for StalledBackend {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn ping(&self) -> Result<(), CacheError> {
            Ok(())
        }

        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            std::future::pending().await
        }

        async fn set(&self, _: &str, _: Vec<u8>, _: Option<Duration>) -> Result<(), CacheError> {
            std::future::pending().await
        }

        async fn scan(&self, _pattern: &str) -> Result<Vec<String>, CacheError> {
            std::future::pending().await
        }

        async fn delete(&self, _keys: &[String]) -> Result<usize, CacheError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn hit_after_set_and_miss_before() {
        let store = memory_store();
        let key = CacheKey::article_list(ListParams::default());

        let first: CacheLookup<PaginatedResponse<ArticleResponse>> = store.get(&key).await;
        assert_eq!(first, CacheLookup::Miss(MissReason::Absent));

        assert_eq!(store.set(&key, &page(0), None).await, CacheWrite::Stored);

        let second: CacheLookup<PaginatedResponse<ArticleResponse>> = store.get(&key).await;
        assert_eq!(second, CacheLookup::Hit(page(0)));

        let stats = store.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
        assert_eq!(stats.hit_rate, 50.0);
    }

    #[tokio::test]
    async fn disabled_store_misses_and_skips_writes() {
        let store = CacheStore::new(CacheConfig::disabled());
        assert_eq!(store.connect().await, CacheStatus::Disabled);

        let key = CacheKey::article_detail(1);
        let lookup: CacheLookup<PaginatedResponse<ArticleResponse>> = store.get(&key).await;
        assert_eq!(lookup, CacheLookup::Miss(MissReason::Disabled));
        assert_eq!(store.set(&key, &page(1), None).await, CacheWrite::Disabled);
        assert_eq!(store.delete_pattern("articles:*").await, CachePurge::Disabled);
        assert_eq!(store.stats().misses, 1);
    }

    #[tokio::test]
    async fn backend_failures_degrade_to_miss_and_noop() {
        let store = CacheStore::with_backend(CacheConfig::memory(), Arc::new(BrokenBackend));
        let key = CacheKey::article_detail(7);

        let lookup: CacheLookup<PaginatedResponse<ArticleResponse>> = store.get(&key).await;
        assert_eq!(lookup, CacheLookup::Miss(MissReason::Unavailable));
        assert_eq!(store.set(&key, &page(0), None).await, CacheWrite::Failed);
        assert_eq!(store.delete(&key).await, CachePurge::Failed);
    }

    #[tokio::test]
    async fn stalled_backend_is_bounded_by_operation_timeout() {
        let config = CacheConfig {
            operation_timeout: Duration::from_millis(20),
            ..CacheConfig::memory()
        };
        let store = CacheStore::with_backend(config, Arc::new(StalledBackend));
        let key = CacheKey::article_detail(3);

        let lookup: CacheLookup<PaginatedResponse<ArticleResponse>> = store.get(&key).await;
        assert_eq!(lookup, CacheLookup::Miss(MissReason::Unavailable));
        assert_eq!(store.set(&key, &page(0), None).await, CacheWrite::Failed);
        assert_eq!(store.delete_pattern("articles:list:*").await, CachePurge::Failed);
    }

    #[tokio::test]
    async fn garbage_payload_is_a_miss() {
        let config = CacheConfig::memory();
        let backend = Arc::new(MemoryBackend::new(&config));
        let key = CacheKey::article_detail(9);
        backend
            .set(&key.to_string(), b"not json".to_vec(), None)
            .await
            .unwrap();

        let store = CacheStore::with_backend(config, backend);
        let lookup: CacheLookup<PaginatedResponse<ArticleResponse>> = store.get(&key).await;
        assert_eq!(lookup, CacheLookup::Miss(MissReason::Undecodable));
    }

    #[tokio::test]
    async fn delete_pattern_removes_only_matching_keys() {
        let store = memory_store();
        for page_no in 1..=3 {
            let params = ListParams {
                page: page_no,
                ..ListParams::default()
            };
            store
                .set(&CacheKey::article_list(params), &page(0), None)
                .await;
        }
        let detail = CacheKey::article_detail(1);
        store.set(&detail, &page(0), None).await;

        assert_eq!(
            store.delete_pattern(&list_pattern("articles")).await,
            CachePurge::Purged(3)
        );
        assert_eq!(store.delete_pattern(&list_pattern("articles")).await, CachePurge::Purged(0));
        assert_eq!(store.delete(&detail).await, CachePurge::Purged(1));
    }

    #[tokio::test]
    async fn connect_and_disconnect_memory_backend() {
        let store = CacheStore::new(CacheConfig::memory());
        assert!(!store.is_active());
        assert_eq!(store.connect().await, CacheStatus::Connected("memory"));
        assert!(store.is_active());

        store.disconnect();
        store.disconnect();
        assert!(!store.is_active());
    }

    #[tokio::test]
    async fn unreachable_redis_leaves_store_inactive() {
        let config = CacheConfig {
            redis_url: "redis://127.0.0.1:1/0".to_string(),
            operation_timeout: Duration::from_millis(500),
            ..CacheConfig::default()
        };
        let store = CacheStore::new(config);
        assert_eq!(store.connect().await, CacheStatus::Unavailable);
        assert!(!store.is_active());
    }

    #[test]
    fn hit_rate_rounds_to_one_decimal() {
        assert_eq!(CacheStats::compute(0, 0).hit_rate, 0.0);
        assert_eq!(CacheStats::compute(1, 2).hit_rate, 33.3);
        assert_eq!(CacheStats::compute(2, 1).hit_rate, 66.7);
        assert_eq!(CacheStats::compute(5, 0).hit_rate, 100.0);
    }

    #[test]
    fn hit_rate_ties_round_to_even() {
        assert_eq!(CacheStats::compute(1, 15).hit_rate, 6.2);
        assert_eq!(CacheStats::compute(3, 13).hit_rate, 18.8);
        assert_eq!(CacheStats::compute(1, 7).hit_rate, 12.5);
    }
}
