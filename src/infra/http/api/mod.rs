pub mod error;
pub mod handlers;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::infra::http::middleware::log_responses;

pub fn build_api_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/charts", get(handlers::list_charts))
        .route("/api/charts/{dataset}", get(handlers::get_chart))
        .route("/api/charts/{dataset}/refresh", post(handlers::refresh_chart))
        .route("/api/admin/load-api-data", get(handlers::load_api_data))
        .route("/api/admin/save-api-data", post(handlers::save_api_data))
        .route("/api/blogs/save", post(handlers::save_blog))
        .route("/api/blogs/get/{slug}", get(handlers::get_blog))
        .route("/api/blogs/list", get(handlers::list_blogs))
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
}
