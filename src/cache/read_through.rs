//! Get-or-load-and-populate flow for cached reads.

use std::{future::Future, time::Duration};

use super::{
    keys::CacheKey,
    payload::CachedValue,
    store::{CacheLookup, CacheStore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Database,
}

#[derive(Debug)]
pub struct Fetched<T> {
    pub value: T,
    pub source: Source,
}

/// Serve `key` from the cache, or run `load` and store what it returns.
///
/// `load` returning `Ok(None)` means the entity does not exist; absence is
/// never cached. Load errors propagate untouched and leave the cache as it was.
pub async fn read_through<T, E, F, Fut>(
    store: &CacheStore,
    key: CacheKey,
    ttl: Option<Duration>,
    load: F,
) -> Result<Option<Fetched<T>>, E>
where
    T: CachedValue,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    if let Some(hit) = cached(store, &key).await {
        return Ok(Some(hit));
    }

    let Some(value) = load().await? else {
        return Ok(None);
    };
    Ok(Some(populate(store, &key, ttl, value).await))
}

/// [`read_through`] for loads that always yield a value, such as list pages.
/// Empty collections are ordinary values and are cached.
pub async fn read_through_value<T, E, F, Fut>(
    store: &CacheStore,
    key: CacheKey,
    ttl: Option<Duration>,
    load: F,
) -> Result<Fetched<T>, E>
where
    T: CachedValue,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if let Some(hit) = cached(store, &key).await {
        return Ok(hit);
    }

    let value = load().await?;
    Ok(populate(store, &key, ttl, value).await)
}

async fn cached<T: CachedValue>(store: &CacheStore, key: &CacheKey) -> Option<Fetched<T>> {
    match store.get::<T>(key).await {
        CacheLookup::Hit(value) => Some(Fetched {
            value,
            source: Source::Cache,
        }),
        CacheLookup::Miss(_) => None,
    }
}

async fn populate<T: CachedValue>(
    store: &CacheStore,
    key: &CacheKey,
    ttl: Option<Duration>,
    value: T,
) -> Fetched<T> {
    store.set(key, &value, ttl).await;
    Fetched {
        value,
        source: Source::Database,
    }
}

#[cfg(test)]
mod tests {
    use std::{
        convert::Infallible,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use quillpost_api_types::{ArticleResponse, PaginatedResponse};

    use super::*;
    use crate::{
        application::pagination::ListParams,
        cache::{CacheConfig, memory::MemoryBackend},
    };

    type Page = PaginatedResponse<ArticleResponse>;

    fn store() -> CacheStore {
        let config = CacheConfig::memory();
        CacheStore::with_backend(config.clone(), Arc::new(MemoryBackend::new(&config)))
    }

    fn empty() -> Page {
        PaginatedResponse {
            items: Vec::new(),
            total: 0,
            page: 1,
            page_size: 20,
            pages: 0,
        }
    }

    #[tokio::test]
    async fn empty_page_is_cached_and_served_on_the_second_read() {
        let store = store();
        let key = CacheKey::article_list(ListParams::default());
        let loads = AtomicUsize::new(0);

        for expected in [Source::Database, Source::Cache] {
            let fetched = read_through_value(&store, key, None, || async {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Infallible>(empty())
            })
            .await
            .unwrap();
            assert_eq!(fetched.source, expected);
            assert_eq!(fetched.value.total, 0);
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn absent_entity_is_not_cached() {
        let store = store();
        let key = CacheKey::article_detail(404);
        let loads = AtomicUsize::new(0);

        for _ in 0..2 {
            let fetched = read_through(&store, key, None, || async {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok::<Option<Page>, Infallible>(None)
            })
            .await
            .unwrap();
            assert!(fetched.is_none());
        }

        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn present_detail_is_cached_once_loaded() {
        let store = store();
        let key = CacheKey::article_detail(7);
        let loads = AtomicUsize::new(0);

        for expected in [Source::Database, Source::Cache] {
            let fetched = read_through(&store, key, None, || async {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Infallible>(Some(empty()))
            })
            .await
            .unwrap()
            .expect("value");
            assert_eq!(fetched.source, expected);
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn load_error_propagates_and_caches_nothing() {
        let store = store();
        let key = CacheKey::article_detail(1);

        let result = read_through(&store, key, None, || async { Err::<Option<Page>, _>("db down") })
            .await;
        assert_eq!(result.err(), Some("db down"));
        assert!(matches!(
            store.get::<Page>(&key).await,
            CacheLookup::Miss(_)
        ));
    }
}
