//! Cache-aside layer for article reads.
//!
//! - [`CacheStore`] wraps a [`CacheBackend`] (Redis or in-process LRU) and
//!   turns every backend failure into a miss or a no-op.
//! - [`CacheKey`] encodes every dimension of a cached result.
//! - [`read_through`] and [`read_through_value`] serve reads from the cache or the database.
//! - [`invalidate`] purges entries after a committed write.
//!
//! Values are stored as the tagged [`CachedResult`] schema in JSON.

mod backend;
mod config;
mod invalidation;
mod keys;
mod lock;
mod memory;
mod payload;
mod read_through;
mod redis_backend;
mod store;

pub use backend::{CacheBackend, CacheError};
pub use config::CacheConfig;
pub use invalidation::{Invalidation, Purge, WriteEvent, invalidate, purges_for};
pub use keys::{ARTICLES, CacheKey, list_pattern};
pub use memory::MemoryBackend;
pub use payload::{CachedResult, CachedResultRef, CachedValue};
pub use read_through::{Fetched, Source, read_through, read_through_value};
pub use redis_backend::RedisBackend;
pub use store::{
    CacheLookup, CachePurge, CacheStats, CacheStatus, CacheStore, CacheWrite, MissReason,
};
