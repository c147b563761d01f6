use std::sync::Arc;

use quillpost_api_types::{CommentCreateRequest, CommentResponse};
use thiserror::Error;

use crate::{
    application::{
        repos::{CreateCommentParams, RepoError},
        views,
    },
    cache::{CacheStore, WriteEvent, invalidate},
    domain::{
        error::DomainError,
        validation::{COMMENT_AUTHOR_MAX, max_chars, required},
    },
    infra::db::{PostgresRepositories, QueryCounter},
};

#[derive(Debug, Error)]
pub enum CommentError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Validation(#[from] DomainError),
}

#[derive(Clone)]
pub struct CommentService {
    repos: Arc<PostgresRepositories>,
    cache: Arc<CacheStore>,
}

impl CommentService {
    pub fn new(repos: Arc<PostgresRepositories>, cache: Arc<CacheStore>) -> Self {
        Self { repos, cache }
    }

    /// Attach a comment to an article; `None` when the article does not exist.
    /// Only the article's detail entry is purged, lists never show comments.
    pub async fn add(
        &self,
        queries: &QueryCounter,
        article_id: i64,
        request: CommentCreateRequest,
    ) -> Result<Option<CommentResponse>, CommentError> {
        required("content", &request.content)?;
        required("author_name", &request.author_name)?;
        max_chars("author_name", &request.author_name, COMMENT_AUTHOR_MAX)?;

        let mut session = self.repos.begin(queries).await?;
        if !session.article_exists(article_id).await? {
            return Ok(None);
        }
        let comment = session
            .insert_comment(&CreateCommentParams {
                article_id,
                content: request.content,
                author_name: request.author_name,
            })
            .await?;
        session.commit().await?;

        invalidate(&self.cache, WriteEvent::CommentAdded { article_id }).await;
        Ok(Some(views::comment_response(comment)))
    }
}
