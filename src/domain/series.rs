//! Normalised time-series records and the brush interval that filters them.

use solstate_api_types::BrushRange;
pub use solstate_api_types::Granularity;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use super::error::DomainError;

const DAY_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// A single `(bucket, dimension, value)` observation.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesRecord {
    pub bucket: Date,
    pub dimension: String,
    pub value: f64,
}

impl TimeSeriesRecord {
    pub fn new(bucket: Date, dimension: impl Into<String>, value: f64) -> Self {
        Self {
            bucket,
            dimension: dimension.into(),
            value,
        }
    }
}

/// Inclusive date range selected with the chart brush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrushInterval {
    start: Date,
    end: Date,
}

impl BrushInterval {
    pub fn new(start: Date, end: Date) -> Result<Self, DomainError> {
        if start > end {
            return Err(DomainError::validation(
                "brush",
                format!("start {start} is after end {end}"),
            ));
        }
        Ok(Self { start, end })
    }

    /// Build an optional interval from `YYYY-MM-DD` bounds supplied as text.
    ///
    /// Both bounds or neither must be present.
    pub fn from_bounds(start: Option<&str>, end: Option<&str>) -> Result<Option<Self>, DomainError> {
        let (start, end) = match (start, end) {
            (None, None) => return Ok(None),
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Err(DomainError::validation(
                    "brush",
                    "start and end must be supplied together",
                ));
            }
        };
        let start = parse_day(start)
            .ok_or_else(|| DomainError::validation("start", format!("`{start}` is not YYYY-MM-DD")))?;
        let end = parse_day(end)
            .ok_or_else(|| DomainError::validation("end", format!("`{end}` is not YYYY-MM-DD")))?;
        Self::new(start, end).map(Some)
    }

    pub fn start(&self) -> Date {
        self.start
    }

    pub fn end(&self) -> Date {
        self.end
    }

    pub fn contains(&self, bucket: Date) -> bool {
        self.start <= bucket && bucket <= self.end
    }
}

impl From<BrushInterval> for BrushRange {
    fn from(interval: BrushInterval) -> Self {
        BrushRange {
            start: interval.start,
            end: interval.end,
        }
    }
}

/// Snap a date onto the bucket grid of the given granularity.
pub fn truncate(date: Date, granularity: Granularity) -> Date {
    match granularity {
        Granularity::Day => date,
        Granularity::Month => date.replace_day(1).unwrap_or(date),
    }
}

/// Strict `YYYY-MM-DD`.
pub fn parse_day(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), DAY_FORMAT).ok()
}

/// Parse the date-ish strings analytics endpoints emit.
///
/// Accepts `YYYY-MM-DD`, anything that starts with `YYYY-MM-DD` followed by a
/// space or `T` (timestamps), and `YYYY-MM`.
pub fn parse_bucket(raw: &str, granularity: Granularity) -> Option<Date> {
    let raw = raw.trim();

    let day = match raw.get(..10) {
        Some(prefix) if raw.len() == 10 || matches!(raw.as_bytes()[10], b' ' | b'T') => {
            Date::parse(prefix, DAY_FORMAT).ok()
        }
        _ => None,
    };

    let date = match day {
        Some(date) => date,
        None if raw.len() == 7 => Date::parse(&format!("{raw}-01"), DAY_FORMAT).ok()?,
        None => return None,
    };

    Some(truncate(date, granularity))
}
