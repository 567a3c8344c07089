//! Mapping of endpoint-specific JSON rows onto [`TimeSeriesRecord`]s.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::series::{Granularity, TimeSeriesRecord, parse_bucket};

/// A row exactly as the analytics endpoint returned it.
pub type RawRow = Value;

/// How a row names its series.
#[derive(Debug, Clone, Copy)]
pub enum DimensionSpec {
    /// Read the dimension from the first present field.
    Field(&'static [&'static str]),
    /// Every row belongs to the same series.
    Fixed(&'static str),
    /// Wide rows: each `(field, dimension)` column becomes its own record.
    Columns(&'static [(&'static str, &'static str)]),
}

/// Field layout of one endpoint's rows. Field lists are aliases tried in order.
#[derive(Debug, Clone, Copy)]
pub struct RowSchema {
    pub bucket: &'static [&'static str],
    pub dimension: DimensionSpec,
    pub value: &'static [&'static str],
    pub granularity: Granularity,
}

/// Convert raw rows into records, dropping rows that lack a required field.
///
/// Output follows source order. Values that cannot be read as a finite number
/// become 0.
pub fn normalize(rows: &[RawRow], schema: &RowSchema) -> Vec<TimeSeriesRecord> {
    let mut records = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;

    for (index, row) in rows.iter().enumerate() {
        match normalize_row(row, schema, &mut records) {
            Ok(()) => {}
            Err(reason) => {
                dropped += 1;
                warn!(
                    target = "solstate::pipeline::normalize",
                    row = index,
                    reason,
                    "dropping row"
                );
            }
        }
    }

    debug!(
        target = "solstate::pipeline::normalize",
        rows = rows.len(),
        records = records.len(),
        dropped,
        "normalized rows"
    );

    records
}

fn normalize_row(
    row: &RawRow,
    schema: &RowSchema,
    records: &mut Vec<TimeSeriesRecord>,
) -> Result<(), &'static str> {
    let object = row.as_object().ok_or("row is not an object")?;

    let raw_bucket = first_present(object, schema.bucket)
        .and_then(text_of)
        .ok_or("missing bucket field")?;
    let bucket =
        parse_bucket(&raw_bucket, schema.granularity).ok_or("bucket is not a recognised date")?;

    match schema.dimension {
        DimensionSpec::Field(aliases) => {
            let dimension = first_present(object, aliases)
                .and_then(text_of)
                .filter(|name| !name.trim().is_empty())
                .ok_or("missing dimension field")?;
            let value = first_present(object, schema.value).map_or(0.0, coerce_value);
            records.push(TimeSeriesRecord::new(bucket, dimension.trim(), value));
        }
        DimensionSpec::Fixed(dimension) => {
            let value = first_present(object, schema.value).map_or(0.0, coerce_value);
            records.push(TimeSeriesRecord::new(bucket, dimension, value));
        }
        DimensionSpec::Columns(columns) => {
            let before = records.len();
            for (field, dimension) in columns {
                if let Some(raw) = object.get(*field).filter(|value| !value.is_null()) {
                    records.push(TimeSeriesRecord::new(bucket, *dimension, coerce_value(raw)));
                }
            }
            if records.len() == before {
                return Err("row has none of the value columns");
            }
        }
    }

    Ok(())
}

fn first_present<'a>(object: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .find_map(|alias| object.get(*alias).filter(|value| !value.is_null()))
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Read a JSON value as a finite number, defaulting to 0.
pub fn coerce_value(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|value| value.is_finite()).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    const DATED_VALUE: RowSchema = RowSchema {
        bucket: &["date"],
        dimension: DimensionSpec::Fixed("total"),
        value: &["value"],
        granularity: Granularity::Day,
    };

    const TVL_BY_DEX: RowSchema = RowSchema {
        bucket: &["block_date", "date"],
        dimension: DimensionSpec::Field(&["dex", "project"]),
        value: &["TVL", "tvl"],
        granularity: Granularity::Day,
    };

    #[test]
    fn drops_rows_missing_required_fields() {
        let rows = vec![
            json!({"date": "2024-01-01", "value": "10"}),
            json!({"value": "bad"}),
        ];
        let records = normalize(&rows, &DATED_VALUE);
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0],
            TimeSeriesRecord::new(date!(2024 - 01 - 01), "total", 10.0)
        );
    }

    #[test]
    fn accepts_field_aliases_and_coerces_values() {
        let rows = vec![
            json!({"block_date": "2024-01-01", "dex": "Orca", "TVL": "100"}),
            json!({"date": "2024-01-02 00:00:00.000 UTC", "project": "Raydium", "tvl": 250.5}),
            json!({"block_date": "2024-01-03", "dex": "Phoenix", "TVL": "n/a"}),
        ];
        let records = normalize(&rows, &TVL_BY_DEX);
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].dimension, "Raydium");
        assert_eq!(records[1].value, 250.5);
        assert_eq!(records[2].value, 0.0);
    }

    #[test]
    fn missing_dimension_drops_row() {
        let rows = vec![
            json!({"block_date": "2024-01-01", "TVL": "100"}),
            json!({"block_date": "2024-01-01", "dex": "  ", "TVL": "100"}),
            json!("not an object"),
        ];
        assert!(normalize(&rows, &TVL_BY_DEX).is_empty());
    }

    #[test]
    fn wide_rows_expand_into_one_record_per_column() {
        const TIERS: RowSchema = RowSchema {
            bucket: &["Month"],
            dimension: DimensionSpec::Columns(&[("whales", "Whales"), ("retail", "Retail")]),
            value: &[],
            granularity: Granularity::Month,
        };
        let rows = vec![
            json!({"Month": "2024-02-15", "whales": 3, "retail": "40"}),
            json!({"Month": "2024-03-01", "other": 1}),
        ];
        let records = normalize(&rows, &TIERS);
        assert_eq!(
            records,
            vec![
                TimeSeriesRecord::new(date!(2024 - 02 - 01), "Whales", 3.0),
                TimeSeriesRecord::new(date!(2024 - 02 - 01), "Retail", 40.0),
            ]
        );
    }

    #[test]
    fn coerce_rejects_non_finite() {
        assert_eq!(coerce_value(&json!("NaN")), 0.0);
        assert_eq!(coerce_value(&json!("inf")), 0.0);
        assert_eq!(coerce_value(&json!(true)), 0.0);
        assert_eq!(coerce_value(&json!(" 7.5 ")), 7.5);
    }
}
