//! # Integration tests
//!
//! Integration tests completely external from the crate. All code written in this module could be
//! written by an external user of the crate.
mod generated;
mod textbook;

use pfi_simplex::data::linear_program::elements::ConstraintType;
use pfi_simplex::data::linear_program::model::LinearProgram;

/// Largest violation of a row or bound by `x`.
fn infeasibility(lp: &LinearProgram, x: &[f64]) -> f64 {
    let mut activity = vec![0.0; lp.nr_rows()];
    for (j, &value) in x.iter().enumerate() {
        for (i, coefficient) in lp.constraints().column(j) {
            activity[i] += coefficient * value;
        }
    }

    let rows = activity.iter().zip(lp.rhs()).zip(lp.constraint_types())
        .map(|((&a, &b), constraint_type)| match constraint_type {
            ConstraintType::Less => a - b,
            ConstraintType::Greater => b - a,
            ConstraintType::Equal => (a - b).abs(),
        });
    let bounds = x.iter().zip(lp.lower()).zip(lp.upper())
        .map(|((&x, &l), &u)| f64::max(l - x, x - u));

    rows.chain(bounds).fold(0.0, f64::max)
}
