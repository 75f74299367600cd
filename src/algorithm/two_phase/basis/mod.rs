//! # Basis maintenance
//!
//! The basis is described by the variable that is basic in each row and the status of every
//! variable. Its inverse is kept implicitly, in product form, as a file of eta factors.
//!
//! Columns are transformed to the current basis with `ftran` (`B^-1 a`) and rows with `btran`
//! (`B^-T y`). A basis change appends a single factor; every now and then the file is rebuilt
//! from scratch, see the `refactor` module.
use std::time::Duration;

use crate::algorithm::two_phase::basis::eta_file::{EtaFile, EtaKind};
use crate::algorithm::two_phase::basis::refactor::FtranMonitor;
use crate::algorithm::two_phase::matrix_provider::column::Column;
use crate::data::linear_algebra::vector::scatter;
use crate::error::SolveError;
use crate::settings::SolverSettings;

pub mod eta_file;
pub mod refactor;
mod decomposition;

/// Position of a variable relative to the basis.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum VariableStatus {
    /// Basic in the given row.
    Basic(usize),
    /// Nonbasic at its lower bound.
    AtLower,
    /// Nonbasic at its upper bound.
    AtUpper,
    /// Nonbasic without bounds, at value zero.
    Free,
}

impl VariableStatus {
    /// Whether the variable is in the basis.
    pub fn is_basic(self) -> bool {
        matches!(self, VariableStatus::Basic(_))
    }

    /// Row in which the variable is basic, if any.
    pub fn basic_row(self) -> Option<usize> {
        match self {
            VariableStatus::Basic(row) => Some(row),
            _ => None,
        }
    }
}

/// Numerical thresholds used when writing eta factors.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FactorTolerances {
    /// Pivots smaller than this in magnitude are rejected.
    pub pivot: f64,
    /// Values not larger than this in magnitude are not stored.
    pub zero: f64,
}

impl From<&SolverSettings> for FactorTolerances {
    fn from(settings: &SolverSettings) -> Self {
        Self { pivot: settings.pivot_tolerance, zero: settings.zero_tolerance }
    }
}

/// The current basis, together with the product form of its inverse.
#[derive(Clone, Debug)]
pub struct BasisState {
    /// Number of rows.
    m: usize,
    /// Number of variables, including slacks and artificials.
    n: usize,
    /// Variable that is basic in each row.
    basic_vars: Vec<usize>,
    /// Status of each variable, consistent with `basic_vars`.
    var_status: Vec<VariableStatus>,

    eta_file: EtaFile,
    /// Basis changes since the file was last rebuilt.
    pivots_since_refactor: usize,

    tolerances: FactorTolerances,
    ftran_monitor: FtranMonitor,
}

impl BasisState {
    /// Create a new basis.
    ///
    /// The eta file starts out empty, so unless all basic columns are unit columns in their own
    /// row, the basis should be refactorized before use.
    ///
    /// # Arguments
    ///
    /// * `basic_vars`: Variable that is basic in each row, pairwise distinct.
    /// * `var_status`: Status of every variable, consistent with `basic_vars`.
    /// * `tolerances`: Used when writing eta factors.
    ///
    /// # Return value
    ///
    /// The basis, or `InvalidArgument` if the two descriptions are inconsistent.
    pub fn new(
        basic_vars: Vec<usize>,
        var_status: Vec<VariableStatus>,
        tolerances: FactorTolerances,
    ) -> Result<Self, SolveError> {
        check_consistency(&basic_vars, &var_status)?;

        let m = basic_vars.len();
        Ok(Self {
            m,
            n: var_status.len(),
            basic_vars,
            var_status,
            eta_file: EtaFile::new(m),
            pivots_since_refactor: 0,
            tolerances,
            ftran_monitor: FtranMonitor::default(),
        })
    }

    /// Basis of consecutive unit columns, starting at index `first`.
    ///
    /// All other variables are nonbasic at their lower bound.
    pub fn identity(m: usize, n: usize, first: usize, tolerances: FactorTolerances) -> Self {
        debug_assert!(first + m <= n);

        let mut var_status = vec![VariableStatus::AtLower; n];
        for i in 0..m {
            var_status[first + i] = VariableStatus::Basic(i);
        }

        Self {
            m,
            n,
            basic_vars: (first..first + m).collect(),
            var_status,
            eta_file: EtaFile::new(m),
            pivots_since_refactor: 0,
            tolerances,
            ftran_monitor: FtranMonitor::default(),
        }
    }

    /// Compute `B^-1 x` in place.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `x` doesn't have length `m`, `InvalidPivot` if a factor is corrupt.
    pub fn ftran(&self, x: &mut [f64]) -> Result<(), SolveError> {
        self.check_length(x.len())?;
        self.eta_file.ftran(x)
    }

    /// Compute `B^-T y` in place.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `y` doesn't have length `m`, `InvalidPivot` if a factor is corrupt.
    pub fn btran(&self, y: &mut [f64]) -> Result<(), SolveError> {
        self.check_length(y.len())?;
        self.eta_file.btran(y)
    }

    /// Row `row` of the basis inverse, `B^-T e_row`.
    pub fn btran_unit(&self, row: usize) -> Result<Vec<f64>, SolveError> {
        if row >= self.m {
            return Err(SolveError::InvalidArgument(format!(
                "row {} out of range for a basis of dimension {}", row, self.m,
            )));
        }

        let mut y = vec![0.0; self.m];
        y[row] = 1.0;
        self.eta_file.btran(&mut y)?;
        Ok(y)
    }

    /// Transform a column of the problem to the current basis, `B^-1 a_j`.
    pub fn generate_column(&self, column: Column<'_>) -> Result<Vec<f64>, SolveError> {
        let mut x = scatter(column, self.m);
        self.eta_file.ftran(&mut x)?;
        Ok(x)
    }

    /// Replace the basic variable of a row.
    ///
    /// # Arguments
    ///
    /// * `pivot_row`: Row of the leaving variable.
    /// * `column`: Column of the entering variable, transformed to the current basis.
    /// * `entering`: Nonbasic variable that enters the basis.
    /// * `leaving`: The variable that is basic in `pivot_row`.
    /// * `leaving_status`: Nonbasic status of the leaving variable, depending on the bound it
    /// reached.
    ///
    /// # Errors
    ///
    /// `PivotTooSmall` if `|column[pivot_row]|` is below the pivot tolerance, `InvalidArgument` on
    /// inconsistent indices and `OutOfMemory` if the eta file can't grow. The basis is not
    /// modified when an error is returned.
    pub fn pivot(
        &mut self,
        pivot_row: usize,
        column: &[f64],
        entering: usize,
        leaving: usize,
        leaving_status: VariableStatus,
    ) -> Result<(), SolveError> {
        self.check_length(column.len())?;
        if pivot_row >= self.m || entering >= self.n {
            return Err(SolveError::InvalidArgument(format!(
                "pivot at ({}, {}) out of range", pivot_row, entering,
            )));
        }
        if self.basic_vars[pivot_row] != leaving {
            return Err(SolveError::InvalidArgument(format!(
                "variable {} is not basic in row {}", leaving, pivot_row,
            )));
        }
        if self.var_status[entering].is_basic() || leaving_status.is_basic() {
            return Err(SolveError::InvalidArgument(format!(
                "variable {} can't enter with status {:?} for the leaving variable", entering, leaving_status,
            )));
        }

        self.check_pivot(pivot_row, column[pivot_row])?;

        self.eta_file.push_column(EtaKind::PivotUpdate, pivot_row, column, self.tolerances.zero)?;

        self.basic_vars[pivot_row] = entering;
        self.var_status[entering] = VariableStatus::Basic(pivot_row);
        self.var_status[leaving] = leaving_status;
        self.pivots_since_refactor += 1;

        debug_assert!(self.is_consistent());
        Ok(())
    }

    /// Whether `value` is large enough to pivot on in `row`.
    ///
    /// # Errors
    ///
    /// `PivotTooSmall` if `|value|` is below the pivot tolerance or NaN.
    pub fn check_pivot(&self, row: usize, value: f64) -> Result<(), SolveError> {
        // Also rejects NaN
        if value.abs() >= self.tolerances.pivot {
            Ok(())
        } else {
            Err(SolveError::PivotTooSmall { row, value })
        }
    }

    /// Change the status of a nonbasic variable, for example after a bound flip.
    pub fn set_nonbasic_status(&mut self, j: usize, status: VariableStatus) {
        debug_assert!(!status.is_basic());
        debug_assert!(!self.var_status[j].is_basic());

        self.var_status[j] = status;
    }

    /// Register how long a call to `ftran` took, to detect degradation of the eta file.
    pub fn record_ftran(&mut self, elapsed: Duration) {
        self.ftran_monitor.record(elapsed);
    }

    /// Number of rows.
    pub fn m(&self) -> usize {
        self.m
    }

    /// Number of variables.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Variable that is basic in each row.
    pub fn basic_vars(&self) -> &[usize] {
        &self.basic_vars
    }

    /// Status of each variable.
    pub fn var_status(&self) -> &[VariableStatus] {
        &self.var_status
    }

    /// Status of variable `j`.
    pub fn status(&self, j: usize) -> VariableStatus {
        self.var_status[j]
    }

    /// Number of eta factors.
    pub fn eta_count(&self) -> usize {
        self.eta_file.len()
    }

    /// Bytes in use by the eta factors.
    pub fn eta_memory(&self) -> usize {
        self.eta_file.memory()
    }

    /// The eta factors, oldest first.
    pub fn eta_file(&self) -> &EtaFile {
        &self.eta_file
    }

    /// Basis changes since the last refactorization.
    pub fn pivots_since_refactor(&self) -> usize {
        self.pivots_since_refactor
    }

    /// The thresholds used when writing eta factors.
    pub fn tolerances(&self) -> FactorTolerances {
        self.tolerances
    }

    fn check_length(&self, len: usize) -> Result<(), SolveError> {
        if len == self.m {
            Ok(())
        } else {
            Err(SolveError::InvalidArgument(format!(
                "vector of length {} for a basis of dimension {}", len, self.m,
            )))
        }
    }

    fn is_consistent(&self) -> bool {
        check_consistency(&self.basic_vars, &self.var_status).is_ok()
    }
}

/// Verify that `basic_vars` holds distinct, in range indices and that `var_status` agrees.
fn check_consistency(basic_vars: &[usize], var_status: &[VariableStatus]) -> Result<(), SolveError> {
    let n = var_status.len();
    if basic_vars.len() > n {
        return Err(SolveError::InvalidArgument(format!(
            "{} basic variables, but only {} variables", basic_vars.len(), n,
        )));
    }

    for (row, &j) in basic_vars.iter().enumerate() {
        if j >= n {
            return Err(SolveError::InvalidArgument(format!("basic variable {} out of range", j)));
        }
        if var_status[j] != VariableStatus::Basic(row) {
            return Err(SolveError::InvalidArgument(format!(
                "variable {} is basic in row {}, but has status {:?}", j, row, var_status[j],
            )));
        }
    }

    let nr_basic = var_status.iter().filter(|status| status.is_basic()).count();
    if nr_basic != basic_vars.len() {
        return Err(SolveError::InvalidArgument(format!(
            "{} variables have a basic status, but there are {} rows", nr_basic, basic_vars.len(),
        )));
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use approx::assert_abs_diff_eq;

    use crate::algorithm::two_phase::basis::{BasisState, FactorTolerances, VariableStatus};
    use crate::algorithm::two_phase::matrix_provider::MatrixProvider;
    use crate::algorithm::two_phase::matrix_provider::test::WithIdentity;
    use crate::error::SolveError;

    pub(super) fn tolerances() -> FactorTolerances {
        FactorTolerances { pivot: 1e-10, zero: 1e-12 }
    }

    #[test]
    fn identity() {
        let basis = BasisState::identity(3, 6, 3, tolerances());
        assert_eq!(basis.basic_vars(), &[3, 4, 5]);
        assert_eq!(basis.status(4), VariableStatus::Basic(1));
        assert_eq!(basis.status(0), VariableStatus::AtLower);

        let mut x = vec![1.5, -2.0, 0.0];
        basis.ftran(&mut x).unwrap();
        assert_eq!(x, vec![1.5, -2.0, 0.0]);
        for row in 0..3 {
            let y = basis.btran_unit(row).unwrap();
            let mut expected = vec![0.0; 3];
            expected[row] = 1.0;
            assert_eq!(y, expected);
        }
        assert!(basis.btran_unit(3).is_err());
        assert!(basis.ftran(&mut [1.0]).is_err());
    }

    #[test]
    fn inconsistent() {
        let status = vec![VariableStatus::Basic(0), VariableStatus::AtLower];
        assert!(BasisState::new(vec![0], status.clone(), tolerances()).is_ok());
        assert!(BasisState::new(vec![1], status.clone(), tolerances()).is_err());
        assert!(BasisState::new(vec![2], status, tolerances()).is_err());
        let double = vec![VariableStatus::Basic(0), VariableStatus::Basic(0)];
        assert!(BasisState::new(vec![0], double, tolerances()).is_err());
    }

    #[test]
    fn pivot() {
        // [A | I] with A = [[2, 1], [1, 3]]
        let provider = WithIdentity::new(&[vec![2.0, 1.0], vec![1.0, 3.0]]);
        let mut basis = BasisState::identity(2, 4, 2, tolerances());

        let column = basis.generate_column(provider.column(0)).unwrap();
        assert_eq!(column, vec![2.0, 1.0]);
        basis.pivot(0, &column, 0, 2, VariableStatus::AtLower).unwrap();
        assert_eq!(basis.basic_vars(), &[0, 3]);
        assert_eq!(basis.status(0), VariableStatus::Basic(0));
        assert_eq!(basis.status(2), VariableStatus::AtLower);
        assert_eq!(basis.eta_count(), 1);
        assert_eq!(basis.pivots_since_refactor(), 1);

        let column = basis.generate_column(provider.column(1)).unwrap();
        assert_abs_diff_eq!(column[0], 0.5);
        assert_abs_diff_eq!(column[1], 2.5);
        basis.pivot(1, &column, 1, 3, VariableStatus::AtUpper).unwrap();
        assert_eq!(basis.status(3), VariableStatus::AtUpper);
        assert_eq!(basis.eta_count(), 2);

        // B = A, so B^-1 a_j = e_j
        for j in 0..2 {
            let x = basis.generate_column(provider.column(j)).unwrap();
            for (i, value) in x.into_iter().enumerate() {
                assert_abs_diff_eq!(value, if i == j { 1.0 } else { 0.0 }, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn round_trip() {
        let provider = WithIdentity::new(&[
            vec![4.0, 1.0, 0.0],
            vec![1.0, 3.0, 1.0],
            vec![0.0, 2.0, 5.0],
        ]);
        let mut basis = BasisState::identity(3, 6, 3, tolerances());
        for (row, j) in [(1, 1), (0, 0), (2, 2)] {
            let column = basis.generate_column(provider.column(j)).unwrap();
            let leaving = basis.basic_vars()[row];
            basis.pivot(row, &column, j, leaving, VariableStatus::AtLower).unwrap();
        }

        // y^T B = c^T for c = (1, 2, 3), so y^T (B x) = c^T x for any x
        let c = vec![1.0, 2.0, 3.0];
        let mut y = c.clone();
        basis.btran(&mut y).unwrap();
        for j in 0..3 {
            let row = basis.basic_vars().iter().position(|&v| v == j).unwrap();
            let product = provider.column(j).map(|(i, v)| y[i] * v).sum::<f64>();
            assert_abs_diff_eq!(product, c[row], epsilon = 1e-12);
        }

        let original = vec![3.0, -1.0, 2.0];
        let mut x = original.clone();
        basis.ftran(&mut x).unwrap();
        let mut recovered = vec![0.0; 3];
        for (row, &j) in basis.basic_vars().iter().enumerate() {
            for (i, v) in provider.column(j) {
                recovered[i] += v * x[row];
            }
        }
        for i in 0..3 {
            assert_abs_diff_eq!(recovered[i], original[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn pivot_too_small() {
        let mut basis = BasisState::identity(2, 4, 2, tolerances());
        let before = basis.clone();

        let result = basis.pivot(0, &[1e-11, 1.0], 0, 2, VariableStatus::AtLower);
        assert_eq!(result, Err(SolveError::PivotTooSmall { row: 0, value: 1e-11 }));
        assert!(basis.pivot(0, &[f64::NAN, 1.0], 0, 2, VariableStatus::AtLower).is_err());
        assert_eq!(basis.basic_vars(), before.basic_vars());
        assert_eq!(basis.var_status(), before.var_status());
        assert_eq!(basis.eta_count(), 0);
        assert_eq!(basis.pivots_since_refactor(), 0);
    }

    #[test]
    fn invalid_pivot_arguments() {
        let mut basis = BasisState::identity(2, 4, 2, tolerances());
        // Wrong leaving variable
        assert!(basis.pivot(0, &[1.0, 1.0], 0, 3, VariableStatus::AtLower).is_err());
        // Entering variable already basic
        assert!(basis.pivot(0, &[1.0, 1.0], 3, 2, VariableStatus::AtLower).is_err());
        // Wrong length
        assert!(basis.pivot(0, &[1.0], 0, 2, VariableStatus::AtLower).is_err());
        assert_eq!(basis.eta_count(), 0);
    }
}
