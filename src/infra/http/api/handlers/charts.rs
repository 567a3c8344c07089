//! Chart handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use solstate_api_types::{ChartSummary, ChartView, RefreshResponse};

use crate::application::catalog;
use crate::application::error::AppError;
use crate::domain::datasets::DatasetId;
use crate::domain::series::BrushInterval;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub percent: Option<bool>,
}

fn dataset_from_path(raw: &str) -> Result<DatasetId, ApiError> {
    raw.parse::<DatasetId>()
        .map_err(|err| ApiError::from(AppError::from(err)))
}

pub async fn list_charts() -> Json<Vec<ChartSummary>> {
    Json(catalog::all().map(|spec| spec.summary()).collect())
}

pub async fn get_chart(
    State(state): State<ApiState>,
    Path(dataset): Path<String>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<ChartView>, ApiError> {
    let dataset = dataset_from_path(&dataset)?;
    let brush = BrushInterval::from_bounds(query.start.as_deref(), query.end.as_deref())
        .map_err(AppError::from)?;

    let view = state.charts.view(dataset, brush, query.percent).await?;
    Ok(Json(view))
}

pub async fn refresh_chart(
    State(state): State<ApiState>,
    Path(dataset): Path<String>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let dataset = dataset_from_path(&dataset)?;
    let outcome = state.charts.refresh(dataset).await?;

    Ok(Json(RefreshResponse {
        dataset: dataset.as_str().to_string(),
        source: outcome.snapshot.source,
        records: outcome.snapshot.records.len(),
        applied: outcome.applied,
    }))
}
