//! Admin data handlers
//!
//! These answer with `{success, …}` bodies instead of the usual error envelope
//! and are never cacheable.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;
use solstate_api_types::{LoadApiDataResponse, SaveApiDataResponse};

use crate::application::error::{AppError, ErrorReport};
use crate::application::repos::StoreError;
use crate::infra::http::api::state::ApiState;

const SOURCE: &str = "infra::http::api::admin";

fn no_store<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    response
}

fn failure<T: Serialize>(error: &AppError, body: T) -> Response {
    let status = error.status_code();
    let mut response = no_store(status, body);
    ErrorReport::from_error(SOURCE, status, error).attach(&mut response);
    response
}

pub async fn load_api_data(State(state): State<ApiState>) -> Response {
    let source = state.admin.source();
    match state.admin.load().await {
        Ok(data) => no_store(
            StatusCode::OK,
            LoadApiDataResponse {
                success: true,
                has_data: data.is_some(),
                data,
                source: Some(source),
                error: None,
            },
        ),
        Err(error @ AppError::Store(StoreError::NotConfigured { .. })) => failure(
            &error,
            LoadApiDataResponse {
                success: false,
                has_data: false,
                data: None,
                source: None,
                error: Some(error.presentation_message().to_string()),
            },
        ),
        Err(error) => failure(
            &error,
            LoadApiDataResponse {
                success: false,
                has_data: false,
                data: None,
                source: Some(source),
                error: Some(error.presentation_message().to_string()),
            },
        ),
    }
}

pub async fn save_api_data(
    State(state): State<ApiState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let saved = match payload {
        Ok(Json(data)) => state.admin.save(data).await,
        Err(rejection) => Err(AppError::validation(rejection.body_text())),
    };
    match saved {
        Ok(()) => no_store(
            StatusCode::OK,
            SaveApiDataResponse {
                success: true,
                error: None,
            },
        ),
        Err(error) => failure(
            &error,
            SaveApiDataResponse {
                success: false,
                error: Some(error.to_string()),
            },
        ),
    }
}
