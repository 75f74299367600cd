//! # Pivoting during reinversion
//!
//! Choosing the right column and row while rebuilding the inverse reduces fill-in of the eta
//! factors and supports numerical stability. Choosing the "best" order is an intractable problem,
//! so a heuristic is used: counts of the nonzero pattern of the original columns.
use crate::data::linear_algebra::SparseTuple;

/// Markowitz-style ordering on a static nonzero pattern.
///
/// Columns with the fewest nonzeros in the rows that are still available go first, and each is
/// pivoted on a row that is numerically acceptable and has the fewest nonzeros in the columns that
/// are still to be processed.
#[derive(Clone, Debug)]
pub(super) struct Markowitz {
    /// Rows of the pattern of each column.
    column_rows: Vec<Vec<usize>>,
    /// Columns of the pattern of each row.
    row_columns: Vec<Vec<usize>>,

    /// Nonzeros of each column in rows that are not yet assigned.
    column_count: Vec<usize>,
    /// Nonzeros of each row in columns that are not yet processed.
    row_count: Vec<usize>,

    column_done: Vec<bool>,
    row_done: Vec<bool>,
}

impl Markowitz {
    /// Conduct an initial count of the number of nonzero values in each row and column.
    ///
    /// # Arguments
    ///
    /// * `columns`: Columns that need to be pivoted in.
    /// * `row_done`: Rows that are already taken by a unit column.
    pub(super) fn new(columns: &[Vec<SparseTuple<f64>>], row_done: Vec<bool>) -> Self {
        let m = row_done.len();

        let column_rows = columns.iter()
            .map(|column| column.iter().filter(|&&(_, v)| v != 0.0).map(|&(i, _)| i).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        let mut row_columns = vec![Vec::new(); m];
        for (k, rows) in column_rows.iter().enumerate() {
            for &i in rows {
                row_columns[i].push(k);
            }
        }

        let column_count = column_rows.iter()
            .map(|rows| rows.iter().filter(|&&i| !row_done[i]).count())
            .collect();
        let row_count = row_columns.iter().map(Vec::len).collect();

        Self {
            column_done: vec![false; column_rows.len()],
            column_rows,
            row_columns,
            column_count,
            row_count,
            row_done,
        }
    }

    /// Column to process next, ties broken by the lowest index.
    pub(super) fn next_column(&self) -> Option<usize> {
        (0..self.column_count.len())
            .filter(|&k| !self.column_done[k])
            .min_by_key(|&k| (self.column_count[k], k))
    }

    /// Choose the pivot row for a transformed column.
    ///
    /// # Arguments
    ///
    /// * `alpha`: The column, transformed by the factors written so far.
    /// * `threshold`: Relative size a pivot should at least have, compared to the largest
    /// candidate.
    /// * `pivot_tolerance`: Absolute size a pivot should at least have.
    ///
    /// # Return value
    ///
    /// The available row with the fewest nonzeros among the acceptable ones, or `None` if the
    /// column is dependent on the columns that were already processed.
    pub(super) fn choose_row(&self, alpha: &[f64], threshold: f64, pivot_tolerance: f64) -> Option<usize> {
        debug_assert_eq!(alpha.len(), self.row_done.len());

        let largest = self.available_rows()
            .map(|i| alpha[i].abs())
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max);
        if largest < pivot_tolerance {
            return None;
        }

        let minimum = f64::max(threshold * largest, pivot_tolerance);
        self.available_rows()
            .filter(|&i| alpha[i].abs() >= minimum && alpha[i].is_finite())
            .min_by(|&a, &b| {
                self.row_count[a].cmp(&self.row_count[b])
                    .then(alpha[b].abs().total_cmp(&alpha[a].abs()))
            })
    }

    /// Update the counts after processing a column.
    ///
    /// # Arguments
    ///
    /// * `k`: Column that was processed.
    /// * `row`: Row that it was pivoted on, `None` if the column was rejected.
    pub(super) fn eliminate(&mut self, k: usize, row: Option<usize>) {
        debug_assert!(!self.column_done[k]);

        self.column_done[k] = true;
        for &i in &self.column_rows[k] {
            self.row_count[i] -= 1;
        }

        if let Some(row) = row {
            debug_assert!(!self.row_done[row]);

            self.row_done[row] = true;
            for &other in &self.row_columns[row] {
                if !self.column_done[other] && self.column_count[other] > 0 {
                    self.column_count[other] -= 1;
                }
            }
        }
    }

    fn available_rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.row_done.iter().enumerate()
            .filter(|&(_, &done)| !done)
            .map(|(i, _)| i)
    }
}
