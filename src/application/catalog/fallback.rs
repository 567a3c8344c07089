//! Bundled rows served when an endpoint cannot be reached.
//!
//! Each dataset's rows come back in the same shape its live endpoint uses so
//! they flow through the normal pipeline.

use serde_json::json;
use time::{Date, Month};

use crate::application::pipeline::RawRow;
use crate::domain::datasets::DatasetId;

const DEX_TVL: &[(&str, &str, f64)] = &[
    ("2024-03-01", "Raydium", 1_212_000_000.0),
    ("2024-03-01", "Orca", 548_000_000.0),
    ("2024-03-01", "Meteora", 312_000_000.0),
    ("2024-03-01", "Lifinity", 41_000_000.0),
    ("2024-03-02", "Raydium", 1_230_500_000.0),
    ("2024-03-02", "Orca", 551_200_000.0),
    ("2024-03-02", "Meteora", 318_900_000.0),
    ("2024-03-02", "Lifinity", 40_100_000.0),
    ("2024-03-03", "Raydium", 1_254_000_000.0),
    ("2024-03-03", "Orca", 560_700_000.0),
    ("2024-03-03", "Meteora", 330_400_000.0),
    ("2024-03-03", "Lifinity", 39_800_000.0),
];

const AGGREGATOR_VOLUME: &[(&str, &str, f64)] = &[
    ("2024-03-01", "Jupiter", 812_000_000.0),
    ("2024-03-01", "OKX", 46_000_000.0),
    ("2024-03-01", "DFlow", 21_500_000.0),
    ("2024-03-02", "Jupiter", 790_300_000.0),
    ("2024-03-02", "OKX", 49_800_000.0),
    ("2024-03-02", "DFlow", 19_900_000.0),
    ("2024-03-03", "Jupiter", 845_700_000.0),
    ("2024-03-03", "OKX", 44_200_000.0),
    ("2024-03-03", "DFlow", 23_100_000.0),
];

const TRADER_CATEGORIES: &[(&str, &str, f64)] = &[
    ("2024-01", "Under $1k", 1_920_000.0),
    ("2024-01", "$1k-$10k", 402_000.0),
    ("2024-01", "$10k-$100k", 88_000.0),
    ("2024-01", "Over $100k", 12_400.0),
    ("2024-02", "Under $1k", 2_310_000.0),
    ("2024-02", "$1k-$10k", 455_000.0),
    ("2024-02", "$10k-$100k", 97_500.0),
    ("2024-02", "Over $100k", 13_900.0),
    ("2024-03", "Under $1k", 2_780_000.0),
    ("2024-03", "$1k-$10k", 521_000.0),
    ("2024-03", "$10k-$100k", 110_200.0),
    ("2024-03", "Over $100k", 15_300.0),
];

const POOL_VOLUME: &[(&str, &str, f64)] = &[
    ("2024-03-01", "SOL-USDC", 402_000_000.0),
    ("2024-03-01", "SOL-USDT", 118_000_000.0),
    ("2024-03-01", "JUP-SOL", 36_000_000.0),
    ("2024-03-02", "SOL-USDC", 389_400_000.0),
    ("2024-03-02", "SOL-USDT", 121_700_000.0),
    ("2024-03-02", "JUP-SOL", 41_200_000.0),
    ("2024-03-03", "SOL-USDC", 415_900_000.0),
    ("2024-03-03", "SOL-USDT", 109_300_000.0),
    ("2024-03-03", "JUP-SOL", 38_800_000.0),
];

/// Active and new wallets for the twelve months ending with `today`'s month,
/// oldest first.
const MONTHLY_ACTIVE_WALLETS: [(u64, u64); 12] = [
    (1_480_000, 310_000),
    (1_520_000, 295_000),
    (1_610_000, 342_000),
    (1_590_000, 301_000),
    (1_720_000, 388_000),
    (1_840_000, 402_000),
    (1_905_000, 376_000),
    (2_010_000, 431_000),
    (2_150_000, 468_000),
    (2_080_000, 402_000),
    (2_240_000, 455_000),
    (2_390_000, 497_000),
];

/// Rows to serve for `dataset` when the live fetch fails.
///
/// Pure: the month-based dataset is anchored on `today` instead of on the
/// moment the process started.
pub fn fallback_rows(dataset: DatasetId, today: Date) -> Vec<RawRow> {
    match dataset {
        DatasetId::DexTvl => DEX_TVL
            .iter()
            .map(|(date, dex, tvl)| json!({"block_date": date, "dex": dex, "TVL": tvl}))
            .collect(),
        DatasetId::AggregatorVolume => AGGREGATOR_VOLUME
            .iter()
            .map(|(date, aggregator, volume)| {
                json!({"block_date": date, "aggregator": aggregator, "volume": volume})
            })
            .collect(),
        DatasetId::TraderCategories => TRADER_CATEGORIES
            .iter()
            .map(|(month, category, traders)| {
                json!({"Month": month, "category": category, "Traders": traders})
            })
            .collect(),
        DatasetId::PoolVolume => POOL_VOLUME
            .iter()
            .map(|(date, pool, volume)| json!({"block_date": date, "pool": pool, "volume": volume}))
            .collect(),
        DatasetId::MonthlyActiveWallets => trailing_months(today, MONTHLY_ACTIVE_WALLETS.len())
            .into_iter()
            .zip(MONTHLY_ACTIVE_WALLETS)
            .map(|((year, month), (active, new))| {
                json!({
                    "Month": format!("{year:04}-{:02}", u8::from(month)),
                    "active_wallet": active,
                    "new_wallet": new,
                })
            })
            .collect(),
    }
}

/// The `count` months ending with `today`'s month, oldest first.
fn trailing_months(today: Date, count: usize) -> Vec<(i32, Month)> {
    let mut months = Vec::with_capacity(count);
    let (mut year, mut month) = (today.year(), today.month());
    for _ in 0..count {
        months.push((year, month));
        if month == Month::January {
            year -= 1;
        }
        month = month.previous();
    }
    months.reverse();
    months
}
