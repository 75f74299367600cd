//! # Columns of the working problem
//!
//! Structural columns are read from the sparse constraint matrix, slack and artificial columns
//! are signed unit vectors that are never stored.
use crate::data::linear_algebra::matrix::ColumnIter;
use crate::data::linear_algebra::SparseTuple;
use crate::data::linear_algebra::vector::scatter;

/// Iterator over the `(row, value)` pairs of a column of the working problem.
pub enum Column<'a> {
    /// A column of the constraint matrix.
    Sparse(ColumnIter<'a>),
    /// A signed unit vector; `None` once it has been yielded.
    Unit(Option<SparseTuple<f64>>),
}

impl Column<'_> {
    /// Unit vector `value * e_row`.
    pub fn unit(row: usize, value: f64) -> Self {
        Column::Unit(Some((row, value)))
    }

    /// Expand into a dense vector of length `m`.
    pub fn into_dense(self, m: usize) -> Vec<f64> {
        scatter(self, m)
    }
}

impl Iterator for Column<'_> {
    type Item = SparseTuple<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Column::Sparse(iter) => iter.next(),
            Column::Unit(value) => value.take(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Column::Sparse(iter) => iter.size_hint(),
            Column::Unit(value) => {
                let len = usize::from(value.is_some());
                (len, Some(len))
            },
        }
    }
}

impl ExactSizeIterator for Column<'_> {}
