//! # Initial basis
//!
//! The all slack basis is always available and trivially factored. Equality rows however have a
//! slack that is fixed at zero, so that basis is rarely feasible for them. The scored crash tries
//! to cover those rows with structural columns instead, keeping the basis triangular.
use itertools::Itertools;
use log::debug;

use crate::algorithm::two_phase::basis::{BasisState, FactorTolerances, VariableStatus};
use crate::algorithm::two_phase::matrix_provider::MatrixProvider;
use crate::algorithm::two_phase::matrix_provider::matrix_data::ColumnType;
use crate::algorithm::two_phase::working_set::SolverWorkingSet;
use crate::data::linear_program::elements::ConstraintType;
use crate::error::SolveError;

/// A crash pivot should be at least this fraction of the largest value in its column.
const RELATIVE_PIVOT: f64 = 0.9;

/// How the initial basis is chosen.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CrashStrategy {
    /// All slack variables are basic.
    Slack,
    /// Structural columns cover equality rows where possible; falls back to `Slack` if the
    /// resulting basis is not primal feasible.
    Scored,
}

/// Basis of all slack variables, with every other variable at its default bound.
pub fn slack_basis(working_set: &SolverWorkingSet, tolerances: FactorTolerances) -> BasisState {
    let data = working_set.data();
    let mut basis = BasisState::identity(
        working_set.nr_rows(),
        working_set.nr_variables(),
        data.group_start(ColumnType::Slack),
        tolerances,
    );
    for j in 0..data.nr_structural() {
        basis.set_nonbasic_status(j, working_set.default_status(j));
    }

    basis
}

/// Triangular crash basis for the equality rows.
///
/// Candidate columns are ordered by score: free variables before variables with a single bound
/// before boxed variables, then sparse before dense, then large coefficients before small ones,
/// then cheap before expensive. A column is
/// accepted when it has no value in any row that was covered earlier and a large enough value in
/// an uncovered equality row. The resulting basis is triangular and hence nonsingular.
///
/// # Return value
///
/// The basis, or `None` if no equality row could be covered. It still has to be refactorized
/// before use.
pub fn scored_basis(
    working_set: &SolverWorkingSet,
    tolerances: FactorTolerances,
) -> Result<Option<BasisState>, SolveError> {
    let data = working_set.data();
    let m = working_set.nr_rows();

    let is_equality = data.constraint_types().iter()
        .map(|&constraint_type| constraint_type == ConstraintType::Equal)
        .collect_vec();
    if !is_equality.contains(&true) {
        return Ok(None);
    }

    let score = |j: usize| {
        let nr_bounds = usize::from(working_set.lower(j).is_finite())
            + usize::from(working_set.upper(j).is_finite());
        (
            nr_bounds,
            data.constraints().column_nnz(j),
            -data.constraints().column_max_abs(j),
            working_set.objective_cost(j).abs(),
        )
    };
    let candidates = (0..data.nr_structural())
        .filter(|&j| !working_set.is_fixed(j) && data.constraints().column_nnz(j) > 0)
        .sorted_by(|&a, &b| score(a).partial_cmp(&score(b)).unwrap_or(std::cmp::Ordering::Equal))
        .collect_vec();

    let mut covered = vec![false; m];
    let mut basic_vars = (0..m).map(|i| data.slack(i)).collect_vec();
    let mut nr_crashed = 0;
    for j in candidates {
        if data.column(j).any(|(i, _)| covered[i]) {
            continue;
        }

        let largest = data.constraints().column_max_abs(j);
        let pivot = data.column(j)
            .filter(|&(i, value)| is_equality[i] && value.abs() >= RELATIVE_PIVOT * largest)
            .max_by(|(_, a), (_, b)| a.abs().total_cmp(&b.abs()));
        if let Some((i, value)) = pivot {
            if value.abs() < tolerances.pivot {
                continue;
            }
            covered[i] = true;
            basic_vars[i] = j;
            nr_crashed += 1;
        }
    }

    if nr_crashed == 0 {
        return Ok(None);
    }
    debug!("Crash covered {} of {} equality rows", nr_crashed, is_equality.iter().filter(|&&e| e).count());

    let mut var_status = (0..working_set.nr_variables())
        .map(|j| match data.column_type(j) {
            ColumnType::Structural | ColumnType::Slack => working_set.default_status(j),
            ColumnType::Artificial => VariableStatus::AtLower,
        })
        .collect_vec();
    for (i, &j) in basic_vars.iter().enumerate() {
        var_status[j] = VariableStatus::Basic(i);
    }

    BasisState::new(basic_vars, var_status, tolerances).map(Some)
}
