//! API handlers organized by resource.

mod admin;
mod blogs;
mod charts;

pub use admin::*;
pub use blogs::*;
pub use charts::*;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub async fn health() -> Response {
    StatusCode::NO_CONTENT.into_response()
}
