use crate::domain::matrix::DenseMatrix;
use crate::domain::palette::DimensionColorAssignment;

/// Rank dimensions by their total (largest first) and hand out palette
/// colours in that order, wrapping around when the palette runs out.
///
/// Equal totals keep the matrix's dimension order.
pub fn rank_and_color(matrix: &DenseMatrix, palette: &[&str]) -> DimensionColorAssignment {
    if palette.is_empty() {
        return DimensionColorAssignment::default();
    }

    let mut ranked: Vec<(&String, f64)> = matrix
        .dimensions()
        .iter()
        .zip(matrix.dimension_totals())
        .collect();
    ranked.sort_by(|left, right| right.1.total_cmp(&left.1));

    let entries = ranked
        .into_iter()
        .enumerate()
        .map(|(rank, (dimension, _))| (dimension.clone(), palette[rank % palette.len()].to_string()))
        .collect();

    DimensionColorAssignment::from_ranked(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pipeline::aggregate::aggregate_records;
    use crate::domain::series::TimeSeriesRecord;
    use time::macros::date;

    fn matrix() -> DenseMatrix {
        aggregate_records(&[
            TimeSeriesRecord::new(date!(2024 - 01 - 01), "small", 1.0),
            TimeSeriesRecord::new(date!(2024 - 01 - 01), "big", 10.0),
            TimeSeriesRecord::new(date!(2024 - 01 - 02), "tie-a", 5.0),
            TimeSeriesRecord::new(date!(2024 - 01 - 02), "tie-b", 5.0),
        ])
    }

    #[test]
    fn ranks_by_total_and_cycles_palette() {
        let colors = rank_and_color(&matrix(), &["red", "green", "blue"]);
        assert_eq!(
            colors.ranked_dimensions(),
            vec!["big", "tie-a", "tie-b", "small"]
        );
        assert_eq!(colors.color_of("big"), Some("red"));
        assert_eq!(colors.color_of("tie-b"), Some("blue"));
        assert_eq!(colors.color_of("small"), Some("red"));
    }

    #[test]
    fn assignment_is_idempotent() {
        let palette = ["red", "green"];
        assert_eq!(
            rank_and_color(&matrix(), &palette),
            rank_and_color(&matrix(), &palette)
        );
    }

    #[test]
    fn empty_palette_assigns_nothing() {
        assert!(rank_and_color(&matrix(), &[]).is_empty());
    }
}
