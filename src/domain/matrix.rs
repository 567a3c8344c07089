//! Dense bucket × dimension grid produced by the aggregator.

use std::collections::HashSet;

use time::Date;

/// A zero-filled grid of values.
///
/// Buckets are unique and ascending; dimensions are unique and keep the order
/// they were supplied in. Every `(bucket, dimension)` pair has a cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DenseMatrix {
    buckets: Vec<Date>,
    dimensions: Vec<String>,
    values: Vec<f64>,
}

impl DenseMatrix {
    /// Materialise every cell for the given keys, all set to 0.
    pub fn zeroed<B, D, S>(buckets: B, dimensions: D) -> Self
    where
        B: IntoIterator<Item = Date>,
        D: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut buckets: Vec<Date> = buckets.into_iter().collect();
        buckets.sort_unstable();
        buckets.dedup();

        let mut seen = HashSet::new();
        let dimensions: Vec<String> = dimensions
            .into_iter()
            .map(Into::into)
            .filter(|dimension: &String| seen.insert(dimension.clone()))
            .collect();

        let values = vec![0.0; buckets.len() * dimensions.len()];
        Self {
            buckets,
            dimensions,
            values,
        }
    }

    pub fn buckets(&self) -> &[Date] {
        &self.buckets
    }

    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    /// A matrix without buckets carries no data, regardless of its dimensions.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn cell_count(&self) -> usize {
        self.values.len()
    }

    pub fn bucket_index(&self, bucket: Date) -> Option<usize> {
        self.buckets.binary_search(&bucket).ok()
    }

    pub fn dimension_index(&self, dimension: &str) -> Option<usize> {
        self.dimensions.iter().position(|known| known == dimension)
    }

    pub fn get(&self, bucket: Date, dimension: &str) -> Option<f64> {
        let row = self.bucket_index(bucket)?;
        let column = self.dimension_index(dimension)?;
        Some(self.values[row * self.dimensions.len() + column])
    }

    pub fn row(&self, index: usize) -> &[f64] {
        let width = self.dimensions.len();
        &self.values[index * width..(index + 1) * width]
    }

    pub(crate) fn row_mut(&mut self, index: usize) -> &mut [f64] {
        let width = self.dimensions.len();
        &mut self.values[index * width..(index + 1) * width]
    }

    pub(crate) fn add(&mut self, row: usize, column: usize, value: f64) {
        let width = self.dimensions.len();
        self.values[row * width + column] += value;
    }

    /// Iterate `(bucket, values)` pairs in chronological order.
    pub fn rows(&self) -> impl Iterator<Item = (Date, &[f64])> + '_ {
        self.buckets
            .iter()
            .enumerate()
            .map(|(index, bucket)| (*bucket, self.row(index)))
    }

    /// Sum of each dimension across every bucket, aligned with [`Self::dimensions`].
    pub fn dimension_totals(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.dimensions.len()];
        for (_, row) in self.rows() {
            for (total, value) in totals.iter_mut().zip(row) {
                *total += value;
            }
        }
        totals
    }

    /// Copy of this matrix with dimensions in the requested order.
    ///
    /// Unknown names in `order` are skipped; dimensions missing from `order`
    /// keep their relative order after the listed ones.
    pub fn reorder_dimensions(&self, order: &[String]) -> Self {
        let mut placed = HashSet::new();
        let mut columns: Vec<usize> = order
            .iter()
            .filter_map(|name| self.dimension_index(name))
            .filter(|column| placed.insert(*column))
            .collect();
        for column in 0..self.dimensions.len() {
            if placed.insert(column) {
                columns.push(column);
            }
        }

        let dimensions: Vec<String> = columns
            .iter()
            .map(|column| self.dimensions[*column].clone())
            .collect();
        let mut values = Vec::with_capacity(self.values.len());
        for index in 0..self.buckets.len() {
            let row = self.row(index);
            values.extend(columns.iter().map(|column| row[*column]));
        }

        Self {
            buckets: self.buckets.clone(),
            dimensions,
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn zeroed_sorts_buckets_and_dedups_keys() {
        let matrix = DenseMatrix::zeroed(
            [date!(2024 - 01 - 02), date!(2024 - 01 - 01), date!(2024 - 01 - 02)],
            ["Orca", "Raydium", "Orca"],
        );
        assert_eq!(
            matrix.buckets(),
            &[date!(2024 - 01 - 01), date!(2024 - 01 - 02)]
        );
        assert_eq!(matrix.dimensions(), &["Orca".to_string(), "Raydium".to_string()]);
        assert_eq!(matrix.cell_count(), 4);
        assert_eq!(matrix.get(date!(2024 - 01 - 02), "Raydium"), Some(0.0));
    }

    #[test]
    fn empty_matrix_has_no_rows() {
        let matrix = DenseMatrix::zeroed(Vec::<Date>::new(), ["Orca"]);
        assert!(matrix.is_empty());
        assert_eq!(matrix.rows().count(), 0);
    }

    #[test]
    fn reorder_keeps_unlisted_dimensions() {
        let mut matrix = DenseMatrix::zeroed([date!(2024 - 01 - 01)], ["a", "b", "c"]);
        matrix.add(0, 0, 1.0);
        matrix.add(0, 1, 2.0);
        matrix.add(0, 2, 3.0);

        let reordered = matrix.reorder_dimensions(&["c".to_string(), "zzz".to_string()]);
        assert_eq!(
            reordered.dimensions(),
            &["c".to_string(), "a".to_string(), "b".to_string()]
        );
        assert_eq!(reordered.row(0), &[3.0, 1.0, 2.0]);
    }
}
