//! Blog handlers

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use solstate_api_types::{BlogDocument, BlogListResponse, BlogSaveResponse};

use crate::application::error::AppError;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;

pub async fn save_blog(
    State(state): State<ApiState>,
    payload: Result<Json<BlogDocument>, JsonRejection>,
) -> Result<Json<BlogSaveResponse>, ApiError> {
    let Json(document) = payload.map_err(|rejection| AppError::validation(rejection.body_text()))?;
    let saved = state.blogs.save(document).await?;
    Ok(Json(BlogSaveResponse {
        success: true,
        slug: saved.blog_post.slug,
    }))
}

pub async fn get_blog(
    State(state): State<ApiState>,
    Path(slug): Path<String>,
) -> Result<Json<BlogDocument>, ApiError> {
    Ok(Json(state.blogs.get(&slug).await?))
}

pub async fn list_blogs(State(state): State<ApiState>) -> Result<Json<BlogListResponse>, ApiError> {
    let slugs = state.blogs.list().await?;
    Ok(Json(BlogListResponse { slugs }))
}
