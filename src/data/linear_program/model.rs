//! # The model handed to the solver
//!
//! A linear program in the form
//!
//! ```text
//! min (or max)  c^T x
//!         s.t.  a_i^T x (<=, =, >=) b_i     for every row i
//!               l <= x <= u
//! ```
//!
//! with the constraint matrix stored in compressed sparse column form.
use crate::data::linear_algebra::matrix::CscMatrix;
use crate::data::linear_program::elements::{ConstraintType, Objective};
use crate::error::SolveError;

/// Describes a linear program using a sparse matrix of constraints and dense arrays for the
/// right hand side, the bounds and the cost.
///
/// Bounds with a magnitude at or beyond the `infinity` setting, or IEEE infinities, are absent.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearProgram {
    /// Constraint matrix, `m x n`.
    constraints: CscMatrix,
    /// Right hand side, length `m`.
    rhs: Vec<f64>,
    /// Type of each row, length `m`.
    constraint_types: Vec<ConstraintType>,
    /// Lower bounds of the structural variables, length `n`.
    lower: Vec<f64>,
    /// Upper bounds of the structural variables, length `n`.
    upper: Vec<f64>,
    /// Objective coefficients, length `n`.
    cost: Vec<f64>,
    objective: Objective,
}

impl LinearProgram {
    /// Create a new `LinearProgram`, checking that all dimensions agree.
    ///
    /// # Arguments
    ///
    /// * `constraints`: Column major constraint matrix of size `m x n`.
    /// * `rhs`: One value per row.
    /// * `constraint_types`: One type per row.
    /// * `lower`, `upper`: One bound per column, may be infinite but not NaN.
    /// * `cost`: One objective coefficient per column.
    /// * `objective`: Whether to minimize or maximize.
    ///
    /// # Return value
    ///
    /// The model, or `InvalidArgument` if a length doesn't match or a value is NaN.
    pub fn new(
        constraints: CscMatrix,
        rhs: Vec<f64>,
        constraint_types: Vec<ConstraintType>,
        lower: Vec<f64>,
        upper: Vec<f64>,
        cost: Vec<f64>,
        objective: Objective,
    ) -> Result<Self, SolveError> {
        let m = constraints.nr_rows();
        let n = constraints.nr_columns();

        for (name, len, expected) in [
            ("rhs", rhs.len(), m),
            ("constraint_types", constraint_types.len(), m),
            ("lower", lower.len(), n),
            ("upper", upper.len(), n),
            ("cost", cost.len(), n),
        ] {
            if len != expected {
                return Err(SolveError::InvalidArgument(format!(
                    "`{}` has length {}, expected {}", name, len, expected,
                )));
            }
        }
        for (name, values) in [("rhs", &rhs), ("lower", &lower), ("upper", &upper)] {
            if let Some(i) = values.iter().position(|v| v.is_nan()) {
                return Err(SolveError::InvalidArgument(format!("`{}` is NaN at index {}", name, i)));
            }
        }
        if let Some(j) = cost.iter().position(|v| !v.is_finite()) {
            return Err(SolveError::InvalidArgument(format!("cost is not finite at index {}", j)));
        }
        if let Some(i) = rhs.iter().position(|v| v.is_infinite()) {
            return Err(SolveError::InvalidArgument(format!("rhs is infinite at row {}", i)));
        }

        Ok(Self { constraints, rhs, constraint_types, lower, upper, cost, objective })
    }

    /// Convenience constructor for a problem with nonnegative, unbounded variables.
    pub fn nonnegative(
        constraints: CscMatrix,
        rhs: Vec<f64>,
        constraint_types: Vec<ConstraintType>,
        cost: Vec<f64>,
        objective: Objective,
    ) -> Result<Self, SolveError> {
        let n = constraints.nr_columns();
        Self::new(
            constraints, rhs, constraint_types,
            vec![0.0; n], vec![f64::INFINITY; n],
            cost, objective,
        )
    }

    /// The constraint matrix.
    pub fn constraints(&self) -> &CscMatrix {
        &self.constraints
    }

    /// Right hand side of every row.
    pub fn rhs(&self) -> &[f64] {
        &self.rhs
    }

    /// Type of every row.
    pub fn constraint_types(&self) -> &[ConstraintType] {
        &self.constraint_types
    }

    /// Lower bounds of the structural variables.
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Upper bounds of the structural variables.
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Objective coefficients, as provided (not negated for maximization).
    pub fn cost(&self) -> &[f64] {
        &self.cost
    }

    /// Direction of optimization.
    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// Number of rows `m`.
    pub fn nr_rows(&self) -> usize {
        self.constraints.nr_rows()
    }

    /// Number of structural variables `n`.
    pub fn nr_columns(&self) -> usize {
        self.constraints.nr_columns()
    }
}

#[cfg(test)]
mod test {
    use crate::data::linear_algebra::matrix::CscMatrix;
    use crate::data::linear_program::elements::{ConstraintType, Objective};
    use crate::data::linear_program::model::LinearProgram;

    #[test]
    fn dimensions() {
        let matrix = CscMatrix::from_dense(&[vec![1.0, 1.0]]).unwrap();
        let lp = LinearProgram::nonnegative(
            matrix.clone(), vec![4.0], vec![ConstraintType::Less], vec![-1.0, -1.0], Objective::Minimize,
        ).unwrap();
        assert_eq!(lp.nr_rows(), 1);
        assert_eq!(lp.nr_columns(), 2);
        assert_eq!(lp.upper(), &[f64::INFINITY, f64::INFINITY]);

        let wrong = LinearProgram::nonnegative(
            matrix.clone(), vec![4.0, 1.0], vec![ConstraintType::Less], vec![-1.0, -1.0], Objective::Minimize,
        );
        assert!(wrong.is_err());

        let nan = LinearProgram::new(
            matrix, vec![4.0], vec![ConstraintType::Less],
            vec![f64::NAN, 0.0], vec![1.0, 1.0], vec![0.0, 0.0], Objective::Minimize,
        );
        assert!(nan.is_err());
    }
}
