pub mod api;
mod middleware;

pub use api::{ApiState, build_api_router};
pub use middleware::RequestContext;

use axum::{Router, middleware as axum_middleware, routing::get};

/// Full application router: API routes plus the health check.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(api::handlers::health))
        .merge(build_api_router(state))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}
