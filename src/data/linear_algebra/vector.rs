//! # Vector operations
//!
//! Operations on dense working vectors, possibly combined with a sparse column.
use num_traits::Float;

use crate::data::linear_algebra::SparseTuple;

/// Inner product of a dense vector with a sparse column.
///
/// # Arguments
///
/// * `dense`: Dense vector, every index of `column` should be in range.
/// * `column`: Sparse `(index, value)` pairs.
pub fn inner_product<F: Float>(dense: &[F], column: impl IntoIterator<Item = SparseTuple<F>>) -> F {
    column.into_iter()
        .fold(F::zero(), |total, (i, value)| total + dense[i] * value)
}

/// Sum of the squared values.
pub fn squared_norm<F: Float>(values: &[F]) -> F {
    values.iter().fold(F::zero(), |total, &value| total + value * value)
}

/// Whether any of the values is NaN.
pub fn contains_nan<F: Float>(values: &[F]) -> bool {
    values.iter().any(|value| value.is_nan())
}

/// Scatter a sparse column into a new dense vector of length `len`.
///
/// Indices that appear more than once are summed.
pub fn scatter<F: Float>(column: impl IntoIterator<Item = SparseTuple<F>>, len: usize) -> Vec<F> {
    let mut dense = vec![F::zero(); len];
    for (i, value) in column {
        debug_assert!(i < len);
        dense[i] = dense[i] + value;
    }
    dense
}

/// Collect the entries of a dense vector that are larger than a threshold in magnitude.
pub fn gather<F: Float>(dense: &[F], threshold: F) -> Vec<SparseTuple<F>> {
    dense.iter().enumerate()
        .filter(|(_, value)| value.abs() > threshold)
        .map(|(i, &value)| (i, value))
        .collect()
}
