use time::Date;

use crate::domain::series::{BrushInterval, TimeSeriesRecord};

/// Items inside the interval, or `None` when there is no interval or nothing
/// falls inside it.
pub fn filter_by_brush<T, B>(items: &[T], interval: Option<&BrushInterval>, bucket_of: B) -> Option<Vec<T>>
where
    T: Clone,
    B: Fn(&T) -> Date,
{
    let interval = interval?;
    let filtered: Vec<T> = items
        .iter()
        .filter(|item| interval.contains(bucket_of(item)))
        .cloned()
        .collect();
    (!filtered.is_empty()).then_some(filtered)
}

/// Narrow records to the brush interval.
///
/// An absent interval, or one that matches nothing, yields every record so
/// the chart never goes blank.
pub fn apply_brush(
    records: &[TimeSeriesRecord],
    interval: Option<&BrushInterval>,
) -> Vec<TimeSeriesRecord> {
    filter_by_brush(records, interval, |record| record.bucket).unwrap_or_else(|| records.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn records() -> Vec<TimeSeriesRecord> {
        vec![
            TimeSeriesRecord::new(date!(2024 - 01 - 01), "Orca", 1.0),
            TimeSeriesRecord::new(date!(2024 - 01 - 15), "Orca", 2.0),
            TimeSeriesRecord::new(date!(2024 - 02 - 01), "Orca", 3.0),
        ]
    }

    #[test]
    fn no_interval_returns_everything() {
        assert_eq!(apply_brush(&records(), None), records());
    }

    #[test]
    fn covering_interval_equals_no_interval() {
        let all = BrushInterval::new(date!(2023 - 12 - 01), date!(2024 - 03 - 01)).expect("brush");
        assert_eq!(apply_brush(&records(), Some(&all)), apply_brush(&records(), None));
    }

    #[test]
    fn bounds_are_inclusive() {
        let january =
            BrushInterval::new(date!(2024 - 01 - 01), date!(2024 - 01 - 15)).expect("brush");
        let brushed = apply_brush(&records(), Some(&january));
        assert_eq!(brushed.len(), 2);
        assert!(brushed.iter().all(|record| record.bucket.month() == time::Month::January));
    }

    #[test]
    fn empty_match_falls_back_to_all_records() {
        let nothing = BrushInterval::new(date!(2030 - 01 - 01), date!(2030 - 12 - 31)).expect("brush");
        assert_eq!(apply_brush(&records(), Some(&nothing)), records());
        assert_eq!(filter_by_brush(&records(), Some(&nothing), |r| r.bucket), None);
    }
}
