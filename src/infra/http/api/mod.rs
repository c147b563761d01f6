pub mod error;
mod extract;
pub mod handlers;
pub mod state;

pub use state::ApiState;

use axum::{
    Router,
    routing::{get, post},
};

pub fn build_api_router(state: ApiState) -> Router {
    Router::new()
        .route(
            "/api/v1/articles",
            get(handlers::list_articles).post(handlers::create_article),
        )
        .route(
            "/api/v1/articles/{id}",
            get(handlers::get_article)
                .put(handlers::update_article)
                .delete(handlers::delete_article),
        )
        .route(
            "/api/v1/articles/{id}/comments",
            post(handlers::add_comment),
        )
        .route(
            "/api/v1/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route("/api/v1/users/{id}", get(handlers::get_user))
        .route("/api/v1/metrics", get(handlers::get_metrics))
        .with_state(state)
}
