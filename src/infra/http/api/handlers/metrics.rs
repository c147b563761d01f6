use axum::Json;
use axum::extract::{Extension, State};
use axum::response::IntoResponse;

use super::repo_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;
use crate::infra::http::middleware::RequestContext;

pub async fn get_metrics(
    State(state): State<ApiState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state
        .metrics
        .snapshot(&ctx.queries)
        .await
        .map_err(repo_to_api)?;

    Ok(Json(snapshot))
}
