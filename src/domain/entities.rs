//! Domain entities mirrored from persistent storage.

use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Article columns shared by list and detail views (everything but the body).
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRecord {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub view_count: i64,
    pub is_published: bool,
    pub published_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub user_id: i64,
}

/// An article row joined with its author.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthoredArticle {
    pub article: ArticleRecord,
    pub author: UserRecord,
}

/// Everything the detail view shows, loaded in bounded statements.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleAggregate {
    pub article: ArticleRecord,
    pub content: String,
    pub author: UserRecord,
    pub tags: Vec<TagRecord>,
    pub comments: Vec<CommentRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentRecord {
    pub id: i64,
    pub content: String,
    pub author_name: String,
    pub article_id: i64,
    pub created_at: OffsetDateTime,
}
