use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use quillpost_api_types::CommentCreateRequest;

use super::comment_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::{ApiJson, ApiPath};
use crate::infra::http::api::state::ApiState;
use crate::infra::http::middleware::RequestContext;

pub async fn add_comment(
    State(state): State<ApiState>,
    Extension(ctx): Extension<RequestContext>,
    ApiPath(article_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<CommentCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state
        .comments
        .add(&ctx.queries, article_id, payload)
        .await
        .map_err(comment_to_api)?;

    match comment {
        Some(comment) => Ok((StatusCode::CREATED, Json(comment))),
        None => Err(ApiError::not_found("Article not found")),
    }
}
