//! The datasets the dashboard charts and how to fetch and read each of them.

mod fallback;

pub use fallback::fallback_rows;

use solstate_api_types::ChartSummary;
use url::Url;

use crate::application::pipeline::{DimensionSpec, RowSchema};
use crate::application::sources::Endpoint;
use crate::domain::datasets::DatasetId;
use crate::domain::error::DomainError;
use crate::domain::series::Granularity;

/// Envelope used by query-result endpoints.
pub const QUERY_RESULT_ROWS: &[&str] = &["query_result", "data", "rows"];

#[derive(Debug, Clone, Copy)]
pub struct DatasetSpec {
    pub id: DatasetId,
    pub title: &'static str,
    pub query_id: u32,
    pub rows_path: &'static [&'static str],
    pub schema: RowSchema,
    /// Whether the chart opens as a 100 % stack.
    pub percent_default: bool,
}

const DEX_TVL: DatasetSpec = DatasetSpec {
    id: DatasetId::DexTvl,
    title: "DEX TVL share",
    query_id: 4_281_133,
    rows_path: QUERY_RESULT_ROWS,
    schema: RowSchema {
        bucket: &["block_date", "date"],
        dimension: DimensionSpec::Field(&["dex", "project"]),
        value: &["TVL", "tvl"],
        granularity: Granularity::Day,
    },
    percent_default: true,
};

const AGGREGATOR_VOLUME: DatasetSpec = DatasetSpec {
    id: DatasetId::AggregatorVolume,
    title: "Aggregator volume",
    query_id: 4_281_157,
    rows_path: QUERY_RESULT_ROWS,
    schema: RowSchema {
        bucket: &["block_date", "date", "day"],
        dimension: DimensionSpec::Field(&["aggregator", "project"]),
        value: &["volume", "volume_usd", "Volume"],
        granularity: Granularity::Day,
    },
    percent_default: false,
};

const TRADER_CATEGORIES: DatasetSpec = DatasetSpec {
    id: DatasetId::TraderCategories,
    title: "Traders by volume tier",
    query_id: 4_281_190,
    rows_path: QUERY_RESULT_ROWS,
    schema: RowSchema {
        bucket: &["Month", "month"],
        dimension: DimensionSpec::Field(&["category", "trader_category", "tier"]),
        value: &["Traders", "traders", "active_wallet"],
        granularity: Granularity::Month,
    },
    percent_default: true,
};

const POOL_VOLUME: DatasetSpec = DatasetSpec {
    id: DatasetId::PoolVolume,
    title: "Top pool volume",
    query_id: 4_281_214,
    rows_path: &[],
    schema: RowSchema {
        bucket: &["block_date", "date"],
        dimension: DimensionSpec::Field(&["pool", "pool_name"]),
        value: &["volume", "volume_usd"],
        granularity: Granularity::Day,
    },
    percent_default: false,
};

const MONTHLY_ACTIVE_WALLETS: DatasetSpec = DatasetSpec {
    id: DatasetId::MonthlyActiveWallets,
    title: "Monthly active wallets",
    query_id: 4_281_236,
    rows_path: QUERY_RESULT_ROWS,
    schema: RowSchema {
        bucket: &["Month", "month"],
        dimension: DimensionSpec::Columns(&[
            ("active_wallet", "Active wallets"),
            ("new_wallet", "New wallets"),
        ]),
        value: &[],
        granularity: Granularity::Month,
    },
    percent_default: false,
};

pub fn dataset(id: DatasetId) -> &'static DatasetSpec {
    match id {
        DatasetId::DexTvl => &DEX_TVL,
        DatasetId::AggregatorVolume => &AGGREGATOR_VOLUME,
        DatasetId::TraderCategories => &TRADER_CATEGORIES,
        DatasetId::PoolVolume => &POOL_VOLUME,
        DatasetId::MonthlyActiveWallets => &MONTHLY_ACTIVE_WALLETS,
    }
}

pub fn all() -> impl Iterator<Item = &'static DatasetSpec> {
    DatasetId::ALL.into_iter().map(dataset)
}

impl DatasetSpec {
    pub fn granularity(&self) -> Granularity {
        self.schema.granularity
    }

    /// `{base_url}/api/queries/{query_id}/results.json`, with `api_key` appended
    /// when one is configured.
    pub fn endpoint(&self, base_url: &Url, api_key: Option<&str>) -> Result<Endpoint, DomainError> {
        let query_id = self.query_id.to_string();
        let mut url = base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DomainError::invariant(format!("`{base_url}` cannot be a base URL")))?
            .pop_if_empty()
            .extend(["api", "queries", query_id.as_str(), "results.json"]);
        if let Some(key) = api_key.filter(|key| !key.is_empty()) {
            url.query_pairs_mut().append_pair("api_key", key);
        }

        Ok(Endpoint {
            label: self.id.as_str(),
            url,
            rows_path: self.rows_path,
        })
    }

    pub fn summary(&self) -> ChartSummary {
        ChartSummary {
            dataset: self.id.as_str().to_string(),
            title: self.title.to_string(),
            granularity: self.granularity(),
            percent_default: self.percent_default,
        }
    }
}
