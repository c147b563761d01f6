//! Article handlers

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use quillpost_api_types::{ArticleCreateRequest, ArticleListQuery, ArticleUpdateRequest};

use super::article_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::infra::http::api::state::ApiState;
use crate::infra::http::middleware::RequestContext;

pub async fn list_articles(
    State(state): State<ApiState>,
    Extension(ctx): Extension<RequestContext>,
    ApiQuery(query): ApiQuery<ArticleListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let params = state.articles.list_params(&query).map_err(article_to_api)?;
    let page = state
        .articles
        .list(&ctx.queries, params)
        .await
        .map_err(article_to_api)?;

    Ok(Json(page))
}

pub async fn get_article(
    State(state): State<ApiState>,
    Extension(ctx): Extension<RequestContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let article = state
        .articles
        .get(&ctx.queries, id)
        .await
        .map_err(article_to_api)?;

    match article {
        Some(article) => Ok(Json(article)),
        None => Err(ApiError::not_found("Article not found")),
    }
}

pub async fn create_article(
    State(state): State<ApiState>,
    Extension(ctx): Extension<RequestContext>,
    ApiJson(payload): ApiJson<ArticleCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let article = state
        .articles
        .create(&ctx.queries, payload)
        .await
        .map_err(article_to_api)?;

    Ok((StatusCode::CREATED, Json(article)))
}

pub async fn update_article(
    State(state): State<ApiState>,
    Extension(ctx): Extension<RequestContext>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<ArticleUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let article = state
        .articles
        .update(&ctx.queries, id, payload)
        .await
        .map_err(article_to_api)?;

    match article {
        Some(article) => Ok(Json(article)),
        None => Err(ApiError::not_found("Article not found")),
    }
}

pub async fn delete_article(
    State(state): State<ApiState>,
    Extension(ctx): Extension<RequestContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .articles
        .delete(&ctx.queries, id)
        .await
        .map_err(article_to_api)?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Article not found"))
    }
}
