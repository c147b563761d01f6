//! In-process cache backend: an LRU map with per-entry expiry.

use std::{
    sync::Mutex,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use lru::LruCache;

use super::{
    backend::{CacheBackend, CacheError},
    config::CacheConfig,
    lock::mutex_lock,
};

const SOURCE: &str = "cache::memory";

struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|deadline| deadline > now)
    }
}

pub struct MemoryBackend {
    entries: Mutex<LruCache<String, Entry>>,
}

impl MemoryBackend {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(config.memory_capacity)),
        }
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut entries = mutex_lock(&self.entries, SOURCE, "get");
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.pop(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        mutex_lock(&self.entries, SOURCE, "set").put(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let entries = mutex_lock(&self.entries, SOURCE, "scan");
        let now = Instant::now();
        Ok(entries
            .iter()
            .filter(|(key, entry)| entry.is_live(now) && glob_match(pattern, key))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn delete(&self, keys: &[String]) -> Result<usize, CacheError> {
        let mut entries = mutex_lock(&self.entries, SOURCE, "delete");
        Ok(keys.iter().filter(|key| entries.pop(*key).is_some()).count())
    }
}

/// Redis-style glob matching for `*` (any run) and `?` (one character).
fn glob_match(pattern: &str, candidate: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let candidate: Vec<char> = candidate.chars().collect();

    let (mut p, mut c) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while c < candidate.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, c));
                p += 1;
            }
            Some(&ch) if ch == '?' || ch == candidate[c] => {
                p += 1;
                c += 1;
            }
            _ => match backtrack {
                Some((star_p, star_c)) => {
                    p = star_p + 1;
                    c = star_c + 1;
                    backtrack = Some((star_p, star_c + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|ch| *ch == '*')
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;

    fn backend(capacity: usize) -> MemoryBackend {
        MemoryBackend::new(&CacheConfig {
            memory_capacity: NonZeroUsize::new(capacity).expect("non-zero"),
            ..CacheConfig::memory()
        })
    }

    #[test]
    fn glob_supports_star_and_question_mark() {
        assert!(glob_match("articles:list:*", "articles:list:1:20:created_at:desc"));
        assert!(glob_match("articles:detail:?", "articles:detail:7"));
        assert!(glob_match("*:detail:*", "articles:detail:42"));
        assert!(!glob_match("articles:list:*", "articles:detail:1"));
        assert!(!glob_match("articles:detail:?", "articles:detail:42"));
        assert!(glob_match("articles:detail:42", "articles:detail:42"));
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let backend = backend(8);
        backend
            .set("short", b"1".to_vec(), Some(Duration::from_millis(20)))
            .await
            .unwrap();
        backend.set("forever", b"2".to_vec(), None).await.unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(backend.get("short").await.unwrap(), None);
        assert_eq!(backend.get("forever").await.unwrap(), Some(b"2".to_vec()));
        assert_eq!(backend.scan("*").await.unwrap(), vec!["forever".to_string()]);
    }

    #[tokio::test]
    async fn capacity_evicts_least_recently_used() {
        let backend = backend(2);
        backend.set("a", b"a".to_vec(), None).await.unwrap();
        backend.set("b", b"b".to_vec(), None).await.unwrap();
        backend.get("a").await.unwrap();
        backend.set("c", b"c".to_vec(), None).await.unwrap();

        assert!(backend.get("b").await.unwrap().is_none());
        assert!(backend.get("a").await.unwrap().is_some());
        assert_eq!(backend.len(), 2);
    }

    #[tokio::test]
    async fn delete_reports_existing_keys_only() {
        let backend = backend(8);
        backend.set("articles:list:1", b"x".to_vec(), None).await.unwrap();
        backend.set("articles:list:2", b"y".to_vec(), None).await.unwrap();

        let keys = backend.scan("articles:list:*").await.unwrap();
        assert_eq!(keys.len(), 2);

        let mut batch = keys.clone();
        batch.push("articles:list:missing".to_string());
        assert_eq!(backend.delete(&batch).await.unwrap(), 2);
        assert!(backend.is_empty());
    }
}
