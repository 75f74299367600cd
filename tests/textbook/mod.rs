//! # Small problems from textbooks
//!
//! Optimal values were verified by enumerating all vertices in exact arithmetic.
use pfi_simplex::data::linear_algebra::matrix::CscMatrix;
use pfi_simplex::data::linear_program::elements::{ConstraintType, Objective};
use pfi_simplex::data::linear_program::model::LinearProgram;

/// # Generation and execution
#[allow(missing_docs)]
mod test;

/// Problem with nonnegative variables from dense rows.
fn nonnegative(
    rows: &[Vec<f64>],
    rhs: &[f64],
    constraint_types: &[ConstraintType],
    cost: &[f64],
    objective: Objective,
) -> LinearProgram {
    LinearProgram::nonnegative(
        CscMatrix::from_dense(rows).unwrap(),
        rhs.to_vec(),
        constraint_types.to_vec(),
        cost.to_vec(),
        objective,
    ).unwrap()
}
