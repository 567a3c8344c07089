//! Per-dataset chart state and the views built from it.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::join_all;
use metrics::counter;
use solstate_api_types::{ChartRow, ChartView, DataSource};
use time::{Date, OffsetDateTime};
use tracing::{debug, info};
use url::Url;

use crate::application::brush_session::BrushSession;
use crate::application::catalog::{self, DatasetSpec, fallback_rows};
use crate::application::error::AppError;
use crate::application::latest::{LatestWins, RequestToken};
use crate::application::pipeline::{
    aggregate_records, apply_brush, normalize, rank_and_color, to_percent,
};
use crate::application::sources::{RowSource, fetch_with_fallback};
use crate::domain::datasets::DatasetId;
use crate::domain::palette::DEFAULT_PALETTE;
use crate::domain::series::{BrushInterval, TimeSeriesRecord};

/// Upstream location shared by every dataset.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    pub base_url: Url,
    pub api_key: Option<String>,
}

/// Normalised records of one dataset, replaced wholesale on refresh.
#[derive(Debug, Clone)]
pub struct ChartSnapshot {
    pub dataset: DatasetId,
    pub records: Arc<Vec<TimeSeriesRecord>>,
    pub source: DataSource,
    token: RequestToken,
}

/// Result of a refresh: what was fetched and whether it was kept.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub snapshot: ChartSnapshot,
    /// `false` when a newer refresh was issued while this one was in flight.
    pub applied: bool,
}

pub struct ChartStore {
    source: Arc<dyn RowSource>,
    target: UpstreamTarget,
    today: fn() -> Date,
    brush_window: Duration,
    entries: DashMap<DatasetId, ChartSnapshot>,
    requests: LatestWins<DatasetId>,
}

impl ChartStore {
    pub fn new(source: Arc<dyn RowSource>, target: UpstreamTarget) -> Self {
        Self {
            source,
            target,
            today: || OffsetDateTime::now_utc().date(),
            brush_window: Duration::from_millis(100),
            entries: DashMap::new(),
            requests: LatestWins::default(),
        }
    }

    /// Override the date fallback datasets are anchored on.
    pub fn with_today(mut self, today: fn() -> Date) -> Self {
        self.today = today;
        self
    }

    /// Minimum spacing between re-aggregations in brush sessions.
    pub fn with_brush_window(mut self, window: Duration) -> Self {
        self.brush_window = window;
        self
    }

    /// Fetch `dataset` again and store the result unless a newer refresh for
    /// the same dataset was issued in the meantime.
    pub async fn refresh(&self, dataset: DatasetId) -> Result<RefreshOutcome, AppError> {
        let spec = catalog::dataset(dataset);
        let endpoint = spec.endpoint(&self.target.base_url, self.target.api_key.as_deref())?;
        let token = self.requests.issue(dataset);
        let today = (self.today)();

        let fetched =
            fetch_with_fallback(self.source.as_ref(), &endpoint, || fallback_rows(dataset, today))
                .await;
        let snapshot = ChartSnapshot {
            dataset,
            records: Arc::new(normalize(&fetched.rows, &spec.schema)),
            source: fetched.source,
            token,
        };

        let applied = self.apply(snapshot.clone());
        if applied {
            debug!(
                target = "solstate::charts",
                dataset = dataset.as_str(),
                token = token.value(),
                records = snapshot.records.len(),
                source = snapshot.source.as_str(),
                "chart data refreshed"
            );
        } else {
            counter!("solstate_refresh_stale_total", "dataset" => dataset.as_str()).increment(1);
            info!(
                target = "solstate::charts",
                dataset = dataset.as_str(),
                token = token.value(),
                "discarding superseded refresh"
            );
        }

        Ok(RefreshOutcome { snapshot, applied })
    }

    /// Refresh every dataset concurrently. Returns how many came from fallback data.
    pub async fn warm_all(&self) -> Result<usize, AppError> {
        let outcomes = join_all(DatasetId::ALL.map(|dataset| self.refresh(dataset))).await;
        let mut fallbacks = 0;
        for outcome in outcomes {
            if outcome?.snapshot.source == DataSource::Fallback {
                fallbacks += 1;
            }
        }
        Ok(fallbacks)
    }

    fn apply(&self, snapshot: ChartSnapshot) -> bool {
        let slot = self.entries.entry(snapshot.dataset);
        if !self.requests.is_latest(&snapshot.dataset, snapshot.token) {
            return false;
        }
        if matches!(&slot, Entry::Occupied(existing) if existing.get().token > snapshot.token) {
            return false;
        }
        slot.insert(snapshot);
        true
    }

    /// Current snapshot, loading the dataset on first use.
    pub async fn snapshot(&self, dataset: DatasetId) -> Result<ChartSnapshot, AppError> {
        let cached = self.entries.get(&dataset).map(|entry| entry.value().clone());
        if let Some(snapshot) = cached {
            return Ok(snapshot);
        }
        let outcome = self.refresh(dataset).await?;
        let current = self.entries.get(&dataset).map(|entry| entry.value().clone());
        Ok(current.unwrap_or(outcome.snapshot))
    }

    /// Brushed, aggregated and coloured view of `dataset`.
    ///
    /// `percent` defaults to the dataset's own preference.
    pub async fn view(
        &self,
        dataset: DatasetId,
        brush: Option<BrushInterval>,
        percent: Option<bool>,
    ) -> Result<ChartView, AppError> {
        let snapshot = self.snapshot(dataset).await?;
        Ok(build_view(
            catalog::dataset(dataset),
            &snapshot,
            brush.as_ref(),
            percent,
        ))
    }

    /// Start an interactive brushing session over the current snapshot.
    pub async fn brush_session(
        &self,
        dataset: DatasetId,
        percent: Option<bool>,
    ) -> Result<BrushSession, AppError> {
        let snapshot = self.snapshot(dataset).await?;
        Ok(BrushSession::spawn(snapshot, percent, self.brush_window))
    }
}

/// Run the shared pipeline over a snapshot.
///
/// Colours are ranked on absolute values, so a dimension keeps its colour
/// whether or not the view is a percent stack.
pub fn build_view(
    spec: &DatasetSpec,
    snapshot: &ChartSnapshot,
    brush: Option<&BrushInterval>,
    percent: Option<bool>,
) -> ChartView {
    let percent = percent.unwrap_or(spec.percent_default);
    let brushed = apply_brush(&snapshot.records, brush);
    let absolute = aggregate_records(&brushed);
    let colors = rank_and_color(&absolute, DEFAULT_PALETTE);
    let ordered = absolute.reorder_dimensions(&colors.ranked_dimensions());
    let matrix = if percent {
        to_percent(&ordered)
    } else {
        ordered
    };

    ChartView {
        dataset: spec.id.as_str().to_string(),
        title: spec.title.to_string(),
        granularity: spec.granularity(),
        source: snapshot.source,
        percent,
        brush: brush.copied().map(Into::into),
        dimensions: matrix.dimensions().to_vec(),
        rows: matrix
            .rows()
            .map(|(bucket, values)| ChartRow {
                bucket,
                values: values.to_vec(),
            })
            .collect(),
        colors: colors.to_api(),
    }
}
