//! Cache key scheme.
//!
//! Keys are `{entity}:{view}:{dimensions...}` joined by `:`. Every dimension
//! is an integer or one of a closed set of sort names, so the delimiter can
//! never appear inside a segment and distinct inputs never share a key.

use std::fmt;

use crate::application::pagination::ListParams;

pub const ARTICLES: &str = "articles";
const DELIMITER: char = ':';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// One page of the published article list.
    ArticleList(ListParams),
    /// One article's detail view.
    ArticleDetail(i64),
}

impl CacheKey {
    pub fn article_list(params: ListParams) -> Self {
        Self::ArticleList(params)
    }

    pub fn article_detail(id: i64) -> Self {
        Self::ArticleDetail(id)
    }

    pub fn entity(&self) -> &'static str {
        match self {
            Self::ArticleList(_) | Self::ArticleDetail(_) => ARTICLES,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = DELIMITER;
        match self {
            Self::ArticleList(params) => write!(
                f,
                "{entity}{d}list{d}{page}{d}{size}{d}{sort_by}{d}{sort_order}",
                entity = self.entity(),
                page = params.page,
                size = params.page_size,
                sort_by = params.sort_by,
                sort_order = params.sort_order,
            ),
            Self::ArticleDetail(id) => write!(f, "{entity}{d}detail{d}{id}", entity = self.entity()),
        }
    }
}

/// Glob matching every list page of `entity`, whatever its dimensions.
pub fn list_pattern(entity: &str) -> String {
    format!("{entity}{DELIMITER}list{DELIMITER}*")
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::application::pagination::{SortField, SortOrder};

    fn params(page: u32, page_size: u32, sort_by: SortField, sort_order: SortOrder) -> ListParams {
        ListParams {
            page,
            page_size,
            sort_by,
            sort_order,
        }
    }

    #[test]
    fn list_key_encodes_every_dimension_in_order() {
        let key = CacheKey::article_list(params(2, 10, SortField::ViewCount, SortOrder::Asc));
        assert_eq!(key.to_string(), "articles:list:2:10:view_count:asc");
    }

    #[test]
    fn detail_key_uses_entity_id() {
        assert_eq!(CacheKey::article_detail(42).to_string(), "articles:detail:42");
    }

    #[test]
    fn keys_are_deterministic() {
        let a = CacheKey::article_list(params(3, 25, SortField::Title, SortOrder::Desc));
        let b = CacheKey::article_list(params(3, 25, SortField::Title, SortOrder::Desc));
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn distinct_tuples_never_collide() {
        let fields = [
            SortField::CreatedAt,
            SortField::PublishedAt,
            SortField::ViewCount,
            SortField::Title,
        ];
        let orders = [SortOrder::Asc, SortOrder::Desc];

        let mut seen = HashSet::new();
        let mut total = 0;
        for page in [1, 2, 11, 12] {
            for page_size in [1, 2, 21, 100] {
                for sort_by in fields {
                    for sort_order in orders {
                        let key =
                            CacheKey::article_list(params(page, page_size, sort_by, sort_order));
                        assert!(seen.insert(key.to_string()), "collision on {key}");
                        total += 1;
                    }
                }
            }
        }
        assert_eq!(seen.len(), total);
    }

    #[test]
    fn list_pattern_covers_list_keys_only() {
        let pattern = list_pattern(ARTICLES);
        assert_eq!(pattern, "articles:list:*");

        let prefix = pattern.trim_end_matches('*');
        assert!(
            CacheKey::article_list(ListParams::default())
                .to_string()
                .starts_with(prefix)
        );
        assert!(!CacheKey::article_detail(1).to_string().starts_with(prefix));
    }
}
