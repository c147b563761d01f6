//! API handlers organized by resource type.
//!
//! Error conversions shared by the resource modules live here.

mod articles;
mod comments;
mod metrics;
mod users;

pub use articles::*;
pub use comments::*;
pub use metrics::*;
pub use users::*;

use axum::http::StatusCode;

use crate::application::articles::ArticleError;
use crate::application::comments::CommentError;
use crate::application::repos::RepoError;
use crate::application::users::UserError;
use crate::domain::error::DomainError;
use crate::domain::slug::SlugError;

use super::error::{ApiError, codes};

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(msg) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(msg),
        ),
    }
}

pub(crate) fn domain_to_api(err: DomainError) -> ApiError {
    match err {
        DomainError::Validation { message } => {
            ApiError::bad_request("Validation failed", Some(message))
        }
    }
}

pub(crate) fn article_to_api(err: ArticleError) -> ApiError {
    match err {
        ArticleError::Repo(repo) => repo_to_api(repo),
        ArticleError::Validation(domain) => domain_to_api(domain),
        ArticleError::Pagination(p) => {
            ApiError::bad_request("Invalid pagination", Some(p.to_string()))
        }
        ArticleError::Slug(err @ SlugError::Exhausted { .. }) => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Slug unavailable",
            Some(err.to_string()),
        ),
        ArticleError::Slug(err) => ApiError::bad_request("Invalid title", Some(err.to_string())),
    }
}

pub(crate) fn comment_to_api(err: CommentError) -> ApiError {
    match err {
        CommentError::Repo(repo) => repo_to_api(repo),
        CommentError::Validation(domain) => domain_to_api(domain),
    }
}

pub(crate) fn user_to_api(err: UserError) -> ApiError {
    match err {
        UserError::Repo(repo) => repo_to_api(repo),
        UserError::Validation(domain) => domain_to_api(domain),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pagination::PaginationError;

    #[test]
    fn duplicate_maps_to_conflict() {
        let err = repo_to_api(RepoError::Duplicate {
            constraint: "users_username_key".to_string(),
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), codes::DUPLICATE);
    }

    #[test]
    fn foreign_key_violation_is_a_client_error() {
        let err = repo_to_api(RepoError::InvalidInput {
            message: "articles_user_id_fkey".to_string(),
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), codes::INVALID_INPUT);
    }

    #[test]
    fn article_errors_map_by_kind() {
        let sort = article_to_api(ArticleError::Pagination(PaginationError::InvalidSortOrder(
            "up".to_string(),
        )));
        assert_eq!(sort.status(), StatusCode::BAD_REQUEST);

        let blank = article_to_api(ArticleError::Slug(SlugError::EmptyInput));
        assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

        let exhausted = article_to_api(ArticleError::Slug(SlugError::Exhausted {
            base: "x".to_string(),
        }));
        assert_eq!(exhausted.status(), StatusCode::CONFLICT);

        let timeout = article_to_api(ArticleError::Repo(RepoError::Timeout));
        assert_eq!(timeout.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
