//! # Sparse matrix storage
//!
//! The constraint matrix is stored column major in compressed form, which is what the simplex
//! method needs: columns are read to price and to compute entering columns.
use std::fmt;
use std::fmt::{Display, Formatter};
use std::iter::Zip;
use std::slice::Iter;

use itertools::Itertools;

use crate::error::SolveError;

/// Compressed sparse column matrix.
///
/// Row indices are strictly increasing within each column and all values are finite. Explicit
/// zeros are allowed, but they are never created by this crate.
#[derive(Clone, Debug, PartialEq)]
pub struct CscMatrix {
    nr_rows: usize,
    /// Start of each column in `row_idx` and `values`, length is the number of columns plus one.
    col_ptr: Vec<usize>,
    row_idx: Vec<usize>,
    values: Vec<f64>,
}

/// Iterator over the `(row, value)` pairs of a single column.
pub struct ColumnIter<'a> {
    inner: Zip<Iter<'a, usize>, Iter<'a, f64>>,
}

impl<'a> Iterator for ColumnIter<'a> {
    type Item = (usize, f64);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(&i, &v)| (i, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for ColumnIter<'_> {}

impl CscMatrix {
    /// Create a new instance from raw compressed sparse column data.
    ///
    /// # Arguments
    ///
    /// * `nr_rows`: Number of rows `m`.
    /// * `col_ptr`: Column start offsets, of length `n + 1`, starting at `0` and ending at `nnz`.
    /// * `row_idx`: Row index of every stored value, strictly increasing per column.
    /// * `values`: The stored values, all finite.
    ///
    /// # Return value
    ///
    /// The matrix, or an `InvalidArgument` describing the first problem found.
    pub fn new(
        nr_rows: usize,
        col_ptr: Vec<usize>,
        row_idx: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<Self, SolveError> {
        if col_ptr.first() != Some(&0) {
            return Err(SolveError::InvalidArgument("column pointers should start at 0".into()));
        }
        if row_idx.len() != values.len() {
            return Err(SolveError::InvalidArgument(format!(
                "{} row indices but {} values", row_idx.len(), values.len(),
            )));
        }
        if col_ptr.last() != Some(&values.len()) {
            return Err(SolveError::InvalidArgument("last column pointer should equal nnz".into()));
        }
        if let Some((j, _)) = col_ptr.iter().tuple_windows().find_position(|(a, b)| a > b) {
            return Err(SolveError::InvalidArgument(format!("column pointers decrease at column {}", j)));
        }
        for j in 0..(col_ptr.len() - 1) {
            let rows = &row_idx[col_ptr[j]..col_ptr[j + 1]];
            if rows.iter().any(|&i| i >= nr_rows) {
                return Err(SolveError::InvalidArgument(format!(
                    "row index out of range in column {}", j,
                )));
            }
            if !rows.iter().tuple_windows().all(|(a, b)| a < b) {
                return Err(SolveError::InvalidArgument(format!(
                    "row indices in column {} are not strictly increasing", j,
                )));
            }
        }
        if let Some(position) = values.iter().position(|v| !v.is_finite()) {
            return Err(SolveError::InvalidArgument(format!(
                "value at position {} is not finite", position,
            )));
        }

        Ok(Self { nr_rows, col_ptr, row_idx, values })
    }

    /// Create a matrix from `(row, column, value)` triplets in any order.
    ///
    /// Duplicate coordinates are summed, zero values are dropped.
    pub fn from_triplets(
        nr_rows: usize,
        nr_columns: usize,
        triplets: Vec<(usize, usize, f64)>,
    ) -> Result<Self, SolveError> {
        if let Some(&(i, j, _)) = triplets.iter().find(|&&(i, j, _)| i >= nr_rows || j >= nr_columns) {
            return Err(SolveError::InvalidArgument(format!(
                "triplet ({}, {}) out of range for a {} x {} matrix", i, j, nr_rows, nr_columns,
            )));
        }

        let merged = triplets.into_iter()
            .sorted_unstable_by_key(|&(i, j, _)| (j, i))
            .coalesce(|(i1, j1, v1), (i2, j2, v2)| {
                if (i1, j1) == (i2, j2) {
                    Ok((i1, j1, v1 + v2))
                } else {
                    Err(((i1, j1, v1), (i2, j2, v2)))
                }
            })
            .filter(|&(_, _, v)| v != 0.0)
            .collect::<Vec<_>>();

        let mut counts = vec![0; nr_columns];
        for &(_, j, _) in &merged {
            counts[j] += 1;
        }
        let col_ptr = std::iter::once(0)
            .chain(counts.iter().scan(0, |total, &count| {
                *total += count;
                Some(*total)
            }))
            .collect();
        let (row_idx, values) = merged.into_iter().map(|(i, _, v)| (i, v)).unzip();

        Self::new(nr_rows, col_ptr, row_idx, values)
    }

    /// Create a matrix from dense rows.
    ///
    /// Mostly useful for small problems and tests.
    pub fn from_dense(rows: &[Vec<f64>]) -> Result<Self, SolveError> {
        let nr_columns = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != nr_columns) {
            return Err(SolveError::InvalidArgument("dense rows have different lengths".into()));
        }

        let triplets = rows.iter().enumerate()
            .flat_map(|(i, row)| row.iter().enumerate().map(move |(j, &v)| (i, j, v)))
            .filter(|&(_, _, v)| v != 0.0)
            .collect();
        Self::from_triplets(rows.len(), nr_columns, triplets)
    }

    /// Iterate over the nonzero values of column `j` in increasing row order.
    pub fn column(&self, j: usize) -> ColumnIter<'_> {
        debug_assert!(j < self.nr_columns());

        let range = self.col_ptr[j]..self.col_ptr[j + 1];
        ColumnIter {
            inner: self.row_idx[range.clone()].iter().zip(self.values[range].iter()),
        }
    }

    /// Number of stored values in column `j`.
    pub fn column_nnz(&self, j: usize) -> usize {
        debug_assert!(j < self.nr_columns());

        self.col_ptr[j + 1] - self.col_ptr[j]
    }

    /// Number of stored values in each row.
    pub fn row_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.nr_rows];
        for &i in &self.row_idx {
            counts[i] += 1;
        }
        counts
    }

    /// Largest absolute value in column `j`, zero for an empty column.
    pub fn column_max_abs(&self, j: usize) -> f64 {
        self.column(j).map(|(_, v)| v.abs()).fold(0.0, f64::max)
    }

    /// Value at `(i, j)`, zero if not stored.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        debug_assert!(i < self.nr_rows);

        let range = self.col_ptr[j]..self.col_ptr[j + 1];
        match self.row_idx[range.clone()].binary_search(&i) {
            Ok(offset) => self.values[range.start + offset],
            Err(_) => 0.0,
        }
    }

    /// Number of rows.
    pub fn nr_rows(&self) -> usize {
        self.nr_rows
    }

    /// Number of columns.
    pub fn nr_columns(&self) -> usize {
        self.col_ptr.len() - 1
    }

    /// Number of stored values.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }
}

impl Display for CscMatrix {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for i in 0..self.nr_rows {
            let row = (0..self.nr_columns())
                .map(|j| format!("{:>10.4}", self.get(i, j)))
                .join(" ");
            writeln!(f, "{}", row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::data::linear_algebra::matrix::CscMatrix;

    #[test]
    fn from_dense() {
        let matrix = CscMatrix::from_dense(&[
            vec![1.0, 0.0, 2.0],
            vec![0.0, 3.0, 0.0],
        ]).unwrap();
        assert_eq!(matrix.nr_rows(), 2);
        assert_eq!(matrix.nr_columns(), 3);
        assert_eq!(matrix.nnz(), 3);
        assert_eq!(matrix.column(2).collect::<Vec<_>>(), vec![(0, 2.0)]);
        assert_eq!(matrix.get(1, 1), 3.0);
        assert_eq!(matrix.get(1, 0), 0.0);
        assert_eq!(matrix.row_counts(), vec![2, 1]);
    }

    #[test]
    fn triplets_are_merged() {
        let matrix = CscMatrix::from_triplets(2, 2, vec![
            (1, 1, 4.0), (0, 0, 1.0), (1, 1, -1.0), (0, 1, 2.0), (1, 0, 0.0),
        ]).unwrap();
        assert_eq!(matrix.column(0).collect::<Vec<_>>(), vec![(0, 1.0)]);
        assert_eq!(matrix.column(1).collect::<Vec<_>>(), vec![(0, 2.0), (1, 3.0)]);
        assert_eq!(matrix.column_nnz(1), 2);
        assert_eq!(matrix.column_max_abs(1), 3.0);
    }

    #[test]
    fn empty_columns() {
        let matrix = CscMatrix::from_triplets(3, 4, vec![(2, 3, 1.5)]).unwrap();
        assert_eq!(matrix.column_nnz(0), 0);
        assert_eq!(matrix.column(0).count(), 0);
        assert_eq!(matrix.column_max_abs(0), 0.0);
        assert_eq!(matrix.column(3).collect::<Vec<_>>(), vec![(2, 1.5)]);
    }

    #[test]
    fn invalid() {
        // Row index out of range
        assert!(CscMatrix::new(2, vec![0, 1], vec![2], vec![1.0]).is_err());
        // Unsorted rows
        assert!(CscMatrix::new(3, vec![0, 2], vec![2, 1], vec![1.0, 1.0]).is_err());
        // Pointer doesn't end at nnz
        assert!(CscMatrix::new(3, vec![0, 1], vec![0, 1], vec![1.0, 1.0]).is_err());
        // Decreasing pointers
        assert!(CscMatrix::new(3, vec![0, 2, 1, 2], vec![0, 1], vec![1.0, 1.0]).is_err());
        // NaN
        assert!(CscMatrix::new(1, vec![0, 1], vec![0], vec![f64::NAN]).is_err());
        // Out of range triplet
        assert!(CscMatrix::from_triplets(1, 1, vec![(0, 1, 1.0)]).is_err());
    }
}
