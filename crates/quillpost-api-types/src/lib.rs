//! Request and response bodies of the Quillpost HTTP API.
//!
//! The response types double as the payloads stored in the read cache, so
//! every response derives both `Serialize` and `Deserialize`.

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserCreateRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A user together with the articles they authored (newest first).
///
/// Embedded articles carry no author and no tags.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UserDetailResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub articles: Vec<ArticleResponse>,
}

// ---------------------------------------------------------------------------
// Tags and comments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TagResponse {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommentCreateRequest {
    pub content: String,
    pub author_name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CommentResponse {
    pub id: i64,
    pub content: String,
    pub author_name: String,
    pub article_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

// ---------------------------------------------------------------------------
// Articles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArticleCreateRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub user_id: i64,
}

/// Partial update. Absent fields stay untouched; `"summary": null` clears
/// the summary, which is why it is a nested option.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ArticleUpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub summary: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// List-view representation of an article.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArticleResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub view_count: i64,
    pub is_published: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub user_id: i64,
    pub author: Option<UserResponse>,
    pub tags: Vec<TagResponse>,
}

/// Detail-view representation: the list view plus content and comments.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArticleDetailResponse {
    #[serde(flatten)]
    pub article: ArticleResponse,
    pub content: String,
    pub comments: Vec<CommentResponse>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ArticleListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub pages: u64,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct CacheInfo {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MetricsResponse {
    pub total_articles: i64,
    pub total_comments: i64,
    pub total_users: i64,
    pub avg_comments_per_article: f64,
    pub cache_info: CacheInfo,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_distinguishes_null_from_absent() {
        let absent: ArticleUpdateRequest = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(absent.summary, None);

        let cleared: ArticleUpdateRequest = serde_json::from_str(r#"{"summary":null}"#).unwrap();
        assert_eq!(cleared.summary, Some(None));

        let set: ArticleUpdateRequest = serde_json::from_str(r#"{"summary":"s"}"#).unwrap();
        assert_eq!(set.summary, Some(Some("s".to_string())));
    }

    #[test]
    fn detail_response_flattens_article_fields() {
        let detail = ArticleDetailResponse {
            article: ArticleResponse {
                id: 7,
                title: "Hello".into(),
                slug: "hello".into(),
                summary: None,
                view_count: 3,
                is_published: true,
                published_at: None,
                created_at: time::macros::datetime!(2024-05-01 12:00 UTC),
                user_id: 1,
                author: None,
                tags: vec![],
            },
            content: "body".into(),
            comments: vec![],
        };

        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["content"], "body");
        assert_eq!(value["created_at"], "2024-05-01T12:00:00Z");
        assert!(value["published_at"].is_null());
    }
}
