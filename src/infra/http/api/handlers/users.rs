//! User handlers

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use quillpost_api_types::UserCreateRequest;

use super::user_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::{ApiJson, ApiPath};
use crate::infra::http::api::state::ApiState;
use crate::infra::http::middleware::RequestContext;

pub async fn list_users(
    State(state): State<ApiState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<impl IntoResponse, ApiError> {
    let users = state.users.list(&ctx.queries).await.map_err(user_to_api)?;
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<ApiState>,
    Extension(ctx): Extension<RequestContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .users
        .get(&ctx.queries, id)
        .await
        .map_err(user_to_api)?;

    match user {
        Some(user) => Ok(Json(user)),
        None => Err(ApiError::not_found("User not found")),
    }
}

pub async fn create_user(
    State(state): State<ApiState>,
    Extension(ctx): Extension<RequestContext>,
    ApiJson(payload): ApiJson<UserCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .users
        .create(&ctx.queries, payload)
        .await
        .map_err(user_to_api)?;

    Ok((StatusCode::CREATED, Json(user)))
}
