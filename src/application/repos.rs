//! Persistence error type and write parameters shared by the services and
//! the Postgres adapter.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateArticleParams {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub summary: Option<String>,
    pub is_published: bool,
    pub user_id: i64,
}

/// Full replacement row for an article update, computed by the service from
/// the stored row and the partial request.
#[derive(Debug, Clone)]
pub struct UpdateArticleParams {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub summary: Option<String>,
    pub is_published: bool,
    pub stamp_published_at: bool,
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub article_id: i64,
    pub content: String,
    pub author_name: String,
}
