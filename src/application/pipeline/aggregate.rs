//! Group-by-bucket-and-dimension into a [`DenseMatrix`].
//!
//! Every chart goes through the same code; what differs per chart is only how
//! a bucket, a dimension and a value are read from an item, so those are
//! passed in as extractor closures.

use std::collections::{HashMap, HashSet};

use time::Date;

use crate::domain::matrix::DenseMatrix;
use crate::domain::series::TimeSeriesRecord;

/// Sum `items` into a pre-shaped matrix.
///
/// Items whose bucket or dimension is not part of the matrix are ignored.
pub fn accumulate<T, B, D, V>(
    mut matrix: DenseMatrix,
    items: &[T],
    bucket_of: B,
    dimension_of: D,
    value_of: V,
) -> DenseMatrix
where
    B: Fn(&T) -> Date,
    D: Fn(&T) -> &str,
    V: Fn(&T) -> f64,
{
    let columns: HashMap<String, usize> = matrix
        .dimensions()
        .iter()
        .enumerate()
        .map(|(index, name)| (name.clone(), index))
        .collect();

    for item in items {
        let Some(row) = matrix.bucket_index(bucket_of(item)) else {
            continue;
        };
        let Some(column) = columns.get(dimension_of(item)).copied() else {
            continue;
        };
        matrix.add(row, column, value_of(item));
    }

    matrix
}

/// Aggregate arbitrary items, deriving the bucket and dimension keys from the
/// items themselves. Dimensions keep the order they are first seen in.
pub fn aggregate_by<T, B, D, V>(items: &[T], bucket_of: B, dimension_of: D, value_of: V) -> DenseMatrix
where
    B: Fn(&T) -> Date,
    D: Fn(&T) -> &str,
    V: Fn(&T) -> f64,
{
    let buckets: Vec<Date> = items.iter().map(&bucket_of).collect();
    let mut seen = HashSet::new();
    let dimensions: Vec<String> = items
        .iter()
        .map(|item| dimension_of(item))
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect();

    accumulate(
        DenseMatrix::zeroed(buckets, dimensions),
        items,
        bucket_of,
        dimension_of,
        value_of,
    )
}

/// Aggregate records over an explicit set of buckets and dimensions.
pub fn aggregate<B, D, S>(records: &[TimeSeriesRecord], all_buckets: B, all_dimensions: D) -> DenseMatrix
where
    B: IntoIterator<Item = Date>,
    D: IntoIterator<Item = S>,
    S: Into<String>,
{
    accumulate(
        DenseMatrix::zeroed(all_buckets, all_dimensions),
        records,
        |record| record.bucket,
        |record| record.dimension.as_str(),
        |record| record.value,
    )
}

/// Aggregate records over the keys they contain.
pub fn aggregate_records(records: &[TimeSeriesRecord]) -> DenseMatrix {
    aggregate_by(
        records,
        |record| record.bucket,
        |record| record.dimension.as_str(),
        |record| record.value,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn record(bucket: Date, dimension: &str, value: f64) -> TimeSeriesRecord {
        TimeSeriesRecord::new(bucket, dimension, value)
    }

    #[test]
    fn every_cell_is_materialised() {
        let records = vec![
            record(date!(2024 - 01 - 02), "Orca", 1.0),
            record(date!(2024 - 01 - 01), "Raydium", 2.0),
            record(date!(2024 - 01 - 03), "Phoenix", 3.0),
        ];
        let matrix = aggregate_records(&records);

        assert_eq!(matrix.buckets().len(), 3);
        assert_eq!(matrix.dimensions().len(), 3);
        assert_eq!(matrix.cell_count(), 9);
        for bucket in matrix.buckets() {
            for dimension in matrix.dimensions() {
                assert!(matrix.get(*bucket, dimension).is_some());
            }
        }
        assert_eq!(matrix.get(date!(2024 - 01 - 01), "Orca"), Some(0.0));
    }

    #[test]
    fn duplicates_are_summed() {
        let records = vec![
            record(date!(2024 - 01 - 01), "pool-a", 1.5),
            record(date!(2024 - 01 - 01), "pool-a", 2.5),
            record(date!(2024 - 01 - 01), "pool-b", 1.0),
        ];
        let matrix = aggregate_records(&records);
        assert_eq!(matrix.get(date!(2024 - 01 - 01), "pool-a"), Some(4.0));
    }

    #[test]
    fn buckets_ascend_and_dimensions_keep_discovery_order() {
        let records = vec![
            record(date!(2024 - 03 - 01), "Jupiter", 1.0),
            record(date!(2024 - 01 - 01), "1inch", 1.0),
            record(date!(2024 - 02 - 01), "Jupiter", 1.0),
        ];
        let matrix = aggregate_records(&records);
        assert_eq!(
            matrix.buckets(),
            &[date!(2024 - 01 - 01), date!(2024 - 02 - 01), date!(2024 - 03 - 01)]
        );
        assert_eq!(
            matrix.dimensions(),
            &["Jupiter".to_string(), "1inch".to_string()]
        );
    }

    #[test]
    fn explicit_keys_ignore_foreign_records() {
        let records = vec![
            record(date!(2024 - 01 - 01), "Orca", 5.0),
            record(date!(2024 - 01 - 01), "Lifinity", 7.0),
            record(date!(2023 - 12 - 31), "Orca", 9.0),
        ];
        let matrix = aggregate(&records, [date!(2024 - 01 - 01)], ["Orca", "Raydium"]);
        assert_eq!(matrix.cell_count(), 2);
        assert_eq!(matrix.get(date!(2024 - 01 - 01), "Orca"), Some(5.0));
        assert_eq!(matrix.get(date!(2024 - 01 - 01), "Raydium"), Some(0.0));
    }

    #[test]
    fn empty_input_is_empty_matrix() {
        let matrix = aggregate_records(&[]);
        assert!(matrix.is_empty());
        assert_eq!(matrix.cell_count(), 0);
    }

    #[test]
    fn custom_extractors_aggregate_foreign_shapes() {
        struct Swap {
            day: Date,
            venue: &'static str,
            usd: f64,
        }
        let swaps = [
            Swap {
                day: date!(2024 - 01 - 01),
                venue: "Jupiter",
                usd: 10.0,
            },
            Swap {
                day: date!(2024 - 01 - 01),
                venue: "Jupiter",
                usd: 5.0,
            },
        ];
        let matrix = aggregate_by(&swaps, |swap| swap.day, |swap| swap.venue, |swap| swap.usd);
        assert_eq!(matrix.get(date!(2024 - 01 - 01), "Jupiter"), Some(15.0));
    }
}
