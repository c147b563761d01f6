//! Tagged schema for values stored in the cache.
//!
//! Every entry is serialized as `{"kind": ..., "data": ...}` so a payload
//! written for one view can never be decoded as another.

use quillpost_api_types::{ArticleDetailResponse, ArticleResponse, PaginatedResponse};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum CachedResultRef<'a> {
    ArticleList(&'a PaginatedResponse<ArticleResponse>),
    ArticleDetail(&'a ArticleDetailResponse),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum CachedResult {
    ArticleList(PaginatedResponse<ArticleResponse>),
    ArticleDetail(ArticleDetailResponse),
}

/// A value with a variant in the cached result schema.
pub trait CachedValue: Sized {
    fn as_cached(&self) -> CachedResultRef<'_>;

    /// `None` when the stored variant belongs to a different view.
    fn from_cached(cached: CachedResult) -> Option<Self>;
}

impl CachedValue for PaginatedResponse<ArticleResponse> {
    fn as_cached(&self) -> CachedResultRef<'_> {
        CachedResultRef::ArticleList(self)
    }

    fn from_cached(cached: CachedResult) -> Option<Self> {
        match cached {
            CachedResult::ArticleList(list) => Some(list),
            CachedResult::ArticleDetail(_) => None,
        }
    }
}

impl CachedValue for ArticleDetailResponse {
    fn as_cached(&self) -> CachedResultRef<'_> {
        CachedResultRef::ArticleDetail(self)
    }

    fn from_cached(cached: CachedResult) -> Option<Self> {
        match cached {
            CachedResult::ArticleDetail(detail) => Some(detail),
            CachedResult::ArticleList(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_page() -> PaginatedResponse<ArticleResponse> {
        PaginatedResponse {
            items: Vec::new(),
            total: 0,
            page: 1,
            page_size: 20,
            pages: 0,
        }
    }

    #[test]
    fn empty_list_is_a_tagged_value_not_null() {
        let page = empty_page();
        let json = serde_json::to_value(page.as_cached()).expect("serialize");
        assert_eq!(json["kind"], "article_list");
        assert_eq!(json["data"]["total"], 0);
        assert!(json["data"]["items"].as_array().is_some_and(Vec::is_empty));
    }

    #[test]
    fn list_payload_is_not_accepted_as_detail() {
        let bytes = serde_json::to_vec(&empty_page().as_cached()).expect("serialize");
        let cached: CachedResult = serde_json::from_slice(&bytes).expect("deserialize");
        assert!(ArticleDetailResponse::from_cached(cached).is_none());
    }

    #[test]
    fn untagged_payload_is_rejected() {
        let bytes = br#"{"items":[],"total":0,"page":1,"page_size":20,"pages":0}"#;
        assert!(serde_json::from_slice::<CachedResult>(bytes).is_err());
    }
}
