//! # Representing linear programs for rapid read access
//!
//! The simplex method works with the columns of the problem relative to the current basis. The
//! basis itself is stored separately, in product form; this module contains the structures that
//! provide the original columns.
pub mod column;
pub mod matrix_data;

use crate::algorithm::two_phase::matrix_provider::column::Column;

/// Abstract interface for a constraint matrix with a unit column available for every row.
///
/// This is the data of the problem relative to the identity basis; nothing in data structures
/// implementing this trait determines a basis.
pub trait MatrixProvider {
    /// Number of rows `m`, the dimension of the basis.
    fn nr_rows(&self) -> usize;

    /// Number of columns, including any columns that are not stored explicitly.
    fn nr_columns(&self) -> usize;

    /// Column of the problem.
    ///
    /// # Arguments
    ///
    /// * `j`: Column index.
    ///
    /// # Return value
    ///
    /// An iterator over `(row, value)` pairs.
    fn column(&self, j: usize) -> Column<'_>;

    /// Row `i` if column `j` equals the unit vector `e_i`.
    ///
    /// Such columns can be placed in a basis without writing an eta factor.
    fn unit_row(&self, j: usize) -> Option<usize>;

    /// A column equal to the unit vector `e_i`.
    ///
    /// Used to complete a basis of which some columns turned out to be dependent.
    fn unit_column_of_row(&self, i: usize) -> usize;
}

#[cfg(test)]
pub(crate) mod test {
    use crate::algorithm::two_phase::matrix_provider::column::Column;
    use crate::algorithm::two_phase::matrix_provider::MatrixProvider;
    use crate::data::linear_algebra::matrix::CscMatrix;

    /// A dense matrix `[A | I]`, for testing basis manipulation without a full problem.
    pub struct WithIdentity {
        pub matrix: CscMatrix,
    }

    impl WithIdentity {
        pub fn new(rows: &[Vec<f64>]) -> Self {
            Self { matrix: CscMatrix::from_dense(rows).unwrap() }
        }
    }

    impl MatrixProvider for WithIdentity {
        fn nr_rows(&self) -> usize {
            self.matrix.nr_rows()
        }

        fn nr_columns(&self) -> usize {
            self.matrix.nr_columns() + self.matrix.nr_rows()
        }

        fn column(&self, j: usize) -> Column<'_> {
            let n = self.matrix.nr_columns();
            if j < n {
                Column::Sparse(self.matrix.column(j))
            } else {
                Column::unit(j - n, 1.0)
            }
        }

        fn unit_row(&self, j: usize) -> Option<usize> {
            let n = self.matrix.nr_columns();
            if j < n { None } else { Some(j - n) }
        }

        fn unit_column_of_row(&self, i: usize) -> usize {
            self.matrix.nr_columns() + i
        }
    }
}
