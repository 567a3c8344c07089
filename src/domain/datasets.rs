//! Identifiers for the datasets the dashboard charts.

use std::fmt;
use std::str::FromStr;

use super::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DatasetId {
    DexTvl,
    AggregatorVolume,
    TraderCategories,
    PoolVolume,
    MonthlyActiveWallets,
}

impl DatasetId {
    pub const ALL: [DatasetId; 5] = [
        DatasetId::DexTvl,
        DatasetId::AggregatorVolume,
        DatasetId::TraderCategories,
        DatasetId::PoolVolume,
        DatasetId::MonthlyActiveWallets,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DatasetId::DexTvl => "dex-tvl",
            DatasetId::AggregatorVolume => "aggregator-volume",
            DatasetId::TraderCategories => "trader-categories",
            DatasetId::PoolVolume => "pool-volume",
            DatasetId::MonthlyActiveWallets => "monthly-active-wallets",
        }
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetId {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        DatasetId::ALL
            .into_iter()
            .find(|id| id.as_str() == value)
            .ok_or(DomainError::not_found("dataset"))
    }
}
