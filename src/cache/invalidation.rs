//! Mapping from committed writes to the cache entries they make stale.

use super::{
    keys::{ARTICLES, CacheKey, list_pattern},
    store::{CachePurge, CacheStore},
};

/// A write that has already been committed to the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteEvent {
    ArticleCreated,
    ArticleUpdated { id: i64 },
    ArticleDeleted { id: i64 },
    CommentAdded { article_id: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Purge {
    Pattern(String),
    Key(CacheKey),
}

/// Entries to purge after `event`.
///
/// Any article change can move rows across every page and sort order, so
/// article writes drop the whole list namespace. Comments only show up in the
/// detail view.
pub fn purges_for(event: WriteEvent) -> Vec<Purge> {
    match event {
        WriteEvent::ArticleCreated => vec![Purge::Pattern(list_pattern(ARTICLES))],
        WriteEvent::ArticleUpdated { id } | WriteEvent::ArticleDeleted { id } => vec![
            Purge::Pattern(list_pattern(ARTICLES)),
            Purge::Key(CacheKey::article_detail(id)),
        ],
        WriteEvent::CommentAdded { article_id } => {
            vec![Purge::Key(CacheKey::article_detail(article_id))]
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Invalidation {
    pub removed: usize,
    pub failed: usize,
}

/// Apply every purge for `event`. Must run after commit and before the response.
pub async fn invalidate(store: &CacheStore, event: WriteEvent) -> Invalidation {
    let mut outcome = Invalidation::default();
    for purge in purges_for(event) {
        let result = match &purge {
            Purge::Pattern(pattern) => store.delete_pattern(pattern).await,
            Purge::Key(key) => store.delete(key).await,
        };
        match result {
            CachePurge::Purged(removed) => outcome.removed += removed,
            CachePurge::Failed => outcome.failed += 1,
            CachePurge::Disabled => {}
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quillpost_api_types::{ArticleResponse, PaginatedResponse};

    use super::*;
    use crate::{
        application::pagination::{ListParams, SortOrder},
        cache::{CacheConfig, memory::MemoryBackend},
    };

    fn list_purge() -> Purge {
        Purge::Pattern("articles:list:*".to_string())
    }

    #[test]
    fn create_purges_lists_only() {
        assert_eq!(purges_for(WriteEvent::ArticleCreated), vec![list_purge()]);
    }

    #[test]
    fn update_and_delete_purge_lists_and_detail() {
        let expected = vec![list_purge(), Purge::Key(CacheKey::article_detail(5))];
        assert_eq!(purges_for(WriteEvent::ArticleUpdated { id: 5 }), expected);
        assert_eq!(purges_for(WriteEvent::ArticleDeleted { id: 5 }), expected);
    }

    #[test]
    fn comment_purges_parent_detail_only() {
        assert_eq!(
            purges_for(WriteEvent::CommentAdded { article_id: 9 }),
            vec![Purge::Key(CacheKey::article_detail(9))]
        );
    }

    #[tokio::test]
    async fn invalidate_leaves_unrelated_entries() {
        let config = CacheConfig::memory();
        let store = CacheStore::with_backend(config.clone(), Arc::new(MemoryBackend::new(&config)));
        let value = PaginatedResponse::<ArticleResponse> {
            items: Vec::new(),
            total: 0,
            page: 1,
            page_size: 20,
            pages: 0,
        };

        let asc = ListParams {
            sort_order: SortOrder::Asc,
            ..ListParams::default()
        };
        store.set(&CacheKey::article_list(ListParams::default()), &value, None).await;
        store.set(&CacheKey::article_list(asc), &value, None).await;
        store.set(&CacheKey::article_detail(1), &value, None).await;
        store.set(&CacheKey::article_detail(2), &value, None).await;

        let outcome = invalidate(&store, WriteEvent::ArticleUpdated { id: 1 }).await;
        assert_eq!(outcome, Invalidation { removed: 3, failed: 0 });

        let outcome = invalidate(&store, WriteEvent::CommentAdded { article_id: 2 }).await;
        assert_eq!(outcome.removed, 1);
    }
}
