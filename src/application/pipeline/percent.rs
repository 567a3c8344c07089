use crate::domain::matrix::DenseMatrix;

/// Express every cell as a share of its bucket's total, in percent.
///
/// Buckets summing to zero stay all-zero.
pub fn to_percent(matrix: &DenseMatrix) -> DenseMatrix {
    let mut result = matrix.clone();
    for index in 0..result.buckets().len() {
        let row = result.row_mut(index);
        let sum: f64 = row.iter().sum();
        if sum == 0.0 {
            row.iter_mut().for_each(|value| *value = 0.0);
            continue;
        }
        row.iter_mut().for_each(|value| *value = *value / sum * 100.0);
    }
    result
}
