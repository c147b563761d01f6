//! User accounts. Users are read straight from the database, never cached.

use std::sync::Arc;

use quillpost_api_types::{UserCreateRequest, UserDetailResponse, UserResponse};
use thiserror::Error;

use crate::{
    application::{
        repos::{CreateUserParams, RepoError},
        views,
    },
    domain::{
        error::DomainError,
        validation::{EMAIL_MAX, USERNAME_MAX, max_chars, required},
    },
    infra::db::{PostgresRepositories, QueryCounter},
};

#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Validation(#[from] DomainError),
}

#[derive(Clone)]
pub struct UserService {
    repos: Arc<PostgresRepositories>,
}

impl UserService {
    pub fn new(repos: Arc<PostgresRepositories>) -> Self {
        Self { repos }
    }

    /// All users, newest first.
    pub async fn list(&self, queries: &QueryCounter) -> Result<Vec<UserResponse>, UserError> {
        let mut session = self.repos.begin(queries).await?;
        let users = session.list_users().await?;
        session.commit().await?;
        Ok(users.into_iter().map(views::user_response).collect())
    }

    pub async fn get(
        &self,
        queries: &QueryCounter,
        id: i64,
    ) -> Result<Option<UserDetailResponse>, UserError> {
        let mut session = self.repos.begin(queries).await?;
        let Some(user) = session.find_user(id).await? else {
            return Ok(None);
        };
        let articles = session.articles_by_user(id).await?;
        session.commit().await?;
        Ok(Some(views::user_detail(user, articles)))
    }

    /// Duplicate usernames or emails surface as [`RepoError::Duplicate`].
    pub async fn create(
        &self,
        queries: &QueryCounter,
        request: UserCreateRequest,
    ) -> Result<UserResponse, UserError> {
        required("username", &request.username)?;
        max_chars("username", &request.username, USERNAME_MAX)?;
        required("email", &request.email)?;
        max_chars("email", &request.email, EMAIL_MAX)?;
        if !request.email.contains('@') {
            return Err(DomainError::validation("`email` must be an email address").into());
        }

        let mut session = self.repos.begin(queries).await?;
        let user = session
            .insert_user(&CreateUserParams {
                username: request.username.trim().to_string(),
                email: request.email.trim().to_string(),
                display_name: request.display_name,
                bio: request.bio,
            })
            .await?;
        session.commit().await?;
        Ok(views::user_response(user))
    }
}
