//! Key/value store abstraction behind the cache adapter.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to encode cache payload: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode cache payload: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Byte-level operations the adapter needs from a cache server.
///
/// Implementations report failures; deciding that failures degrade to a
/// miss or a no-op is the adapter's job.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn ping(&self) -> Result<(), CacheError>;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store `value`; `ttl` of `None` keeps it until evicted or deleted.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>)
    -> Result<(), CacheError>;

    /// All live keys matching a glob pattern, collected incrementally.
    async fn scan(&self, pattern: &str) -> Result<Vec<String>, CacheError>;

    /// Delete `keys` in one batch, returning how many existed.
    async fn delete(&self, keys: &[String]) -> Result<usize, CacheError>;
}
