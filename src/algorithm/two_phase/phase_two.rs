//! # Phase two
//!
//! The primal simplex iteration, used by both phases, and the optimization of the original
//! objective from a feasible basis.
use std::time::Instant;

use log::{debug, info, trace, warn};

use crate::algorithm::two_phase::{PhaseResult, Simplex};
use crate::algorithm::two_phase::basis::VariableStatus;
use crate::algorithm::two_phase::basis::refactor::RefactorDecision;
use crate::algorithm::two_phase::matrix_provider::MatrixProvider;
use crate::algorithm::two_phase::matrix_provider::matrix_data::ColumnType;
use crate::algorithm::two_phase::ratio_test::{Leaving, RatioTest, ratio_test};
use crate::algorithm::two_phase::strategy::pivot_rule::PivotInfo;
use crate::callback::Phase;
use crate::data::linear_algebra::vector::contains_nan;
use crate::data::linear_program::elements::BoundDirection;
use crate::data::linear_program::solution::SolveStatus;
use crate::error::SolveError;

/// Outcome of a single iteration.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Step {
    /// The basis changed.
    Pivot,
    /// The entering variable moved to its other bound, the basis didn't change.
    BoundFlip,
    /// No variable is attractive.
    Optimal,
    /// The entering variable can move without limit.
    Unbounded(usize),
    /// A NaN was found in the reduced costs or in the entering column.
    Numeric,
}

impl<'a, 'e> Simplex<'a, 'e> {
    /// Optimize the original objective, starting from a primal feasible basis.
    pub(super) fn phase_two(&mut self) -> Result<SolveStatus, SolveError> {
        self.phase = Phase::Two;
        let first_artificial = self.working_set.data().group_start(ColumnType::Artificial);
        for j in first_artificial..self.working_set.nr_variables() {
            self.working_set.set_bounds(j, 0.0, 0.0);
        }
        self.working_set.use_phase_two_cost();
        self.recompute()?;
        info!("Phase two, starting at objective value {}", self.objective);

        let status = match self.primal()? {
            PhaseResult::Optimal if self.repaired
                && !self.working_set.is_primal_feasible(self.settings.feasibility_tol) => {
                warn!(
                    "Basis repair left an infeasibility of {}",
                    self.working_set.primal_infeasibility(),
                );
                SolveStatus::Numeric
            },
            PhaseResult::Optimal => SolveStatus::Optimal,
            PhaseResult::Unbounded => SolveStatus::Unbounded,
            PhaseResult::Stopped(status) => status,
        };

        Ok(status)
    }

    /// Iterate until no variable is attractive, the objective is unbounded or a limit is reached.
    ///
    /// A numerical error triggers a refactorization, after which the iteration is tried once
    /// more. If it fails again, the phase stops with `SolveStatus::Numeric`.
    pub(super) fn primal(&mut self) -> Result<PhaseResult, SolveError> {
        let mut retried = false;

        loop {
            if let Some(status) = self.check_limits() {
                break Ok(PhaseResult::Stopped(status));
            }

            let trouble = match self.iteration() {
                Ok(Step::Pivot | Step::BoundFlip) => {
                    retried = false;
                    self.iterations += 1;
                    if let Some(status) = self.poll() {
                        break Ok(PhaseResult::Stopped(status));
                    }
                    continue;
                },
                Ok(Step::Optimal) => break Ok(PhaseResult::Optimal),
                Ok(Step::Unbounded(j)) => {
                    debug!("Variable {} can improve the objective without limit", j);
                    break Ok(PhaseResult::Unbounded);
                },
                Ok(Step::Numeric) => "NaN encountered".to_string(),
                Err(error) if error.is_numerical() => error.to_string(),
                Err(error) => break Err(error),
            };

            if retried {
                warn!("Numerical trouble persists after refactorization: {}", trouble);
                break Ok(PhaseResult::Stopped(SolveStatus::Numeric));
            }
            warn!("Numerical trouble, forcing a refactorization: {}", trouble);
            retried = true;
            match self.refactor() {
                Ok(()) => {},
                Err(error) if error.is_numerical() => {
                    warn!("Refactorization failed: {}", error);
                    break Ok(PhaseResult::Stopped(SolveStatus::Numeric));
                },
                Err(error) => break Err(error),
            }
        }
    }

    /// Price, transform the entering column, run the ratio test and change the basis or flip a
    /// bound.
    fn iteration(&mut self) -> Result<Step, SolveError> {
        if contains_nan(self.working_set.reduced_costs()) {
            return Ok(Step::Numeric);
        }

        let entering = match self.price() {
            Some(j) => j,
            None if self.duals_fresh => return Ok(Step::Optimal),
            None => {
                // Accumulated updates might hide an attractive variable, or show a false one
                self.recompute_duals()?;
                match self.price() {
                    Some(j) => j,
                    None => return Ok(Step::Optimal),
                }
            },
        };

        let start = Instant::now();
        let column = self.basis.generate_column(self.working_set.data().column(entering))?;
        self.basis.record_ftran(start.elapsed());
        if contains_nan(&column) {
            return Ok(Step::Numeric);
        }

        let reduced_cost = self.working_set.reduced_costs()[entering];
        let sign = if reduced_cost < 0.0 { 1.0 } else { -1.0 };
        let direction = column.iter().map(|&alpha| sign * alpha).collect::<Vec<_>>();
        let range = self.working_set.upper(entering) - self.working_set.lower(entering);

        let test = ratio_test(&self.working_set, &self.basis, &direction, self.settings.feasibility_tol);
        match test {
            RatioTest::Leaving(leaving) if leaving.step < range => {
                self.pivot(entering, &column, &direction, sign, reduced_cost, leaving)?;
                Ok(Step::Pivot)
            },
            RatioTest::Unbounded if range == f64::INFINITY => Ok(Step::Unbounded(entering)),
            _ => {
                self.bound_flip(entering, &direction, sign, reduced_cost, range);
                Ok(Step::BoundFlip)
            },
        }
    }

    fn price(&mut self) -> Option<usize> {
        self.pricing.choose_entering(
            self.working_set.reduced_costs(),
            self.basis.var_status(),
            self.settings.optimality_tol,
        )
    }

    /// Move the entering variable to its opposite bound without changing the basis.
    fn bound_flip(&mut self, entering: usize, direction: &[f64], sign: f64, reduced_cost: f64, range: f64) {
        debug_assert!(range.is_finite());

        self.working_set.apply_step(&self.basis, direction, range, entering, sign);
        let status = if sign > 0.0 { VariableStatus::AtUpper } else { VariableStatus::AtLower };
        let value = self.working_set.nonbasic_value(entering, status);
        self.working_set.set_value(entering, value);
        self.basis.set_nonbasic_status(entering, status);
        self.objective += reduced_cost * sign * range;
        self.pricing.remove_candidate(entering);

        trace!(
            "Iteration {}: variable {} flipped to {:?}, objective {}",
            self.iterations, entering, status, self.objective,
        );
    }

    /// Bring the entering variable into the basis.
    ///
    /// # Arguments
    ///
    /// * `entering`: Nonbasic variable that enters.
    /// * `column`: Its column, transformed by the current basis.
    /// * `direction`: `column` multiplied by `sign`.
    /// * `sign`: Direction in which the entering variable moves.
    /// * `reduced_cost`: Reduced cost of the entering variable.
    /// * `leaving`: Result of the ratio test.
    fn pivot(
        &mut self,
        entering: usize,
        column: &[f64],
        direction: &[f64],
        sign: f64,
        reduced_cost: f64,
        leaving: Leaving,
    ) -> Result<(), SolveError> {
        let Leaving { row: pivot_row, step, bound, .. } = leaving;
        // Nothing may change before the pivot is known to be acceptable
        self.basis.check_pivot(pivot_row, column[pivot_row])?;
        let leaving_var = self.basis.basic_vars()[pivot_row];
        let leaving_status = match bound {
            BoundDirection::Lower => VariableStatus::AtLower,
            BoundDirection::Upper => VariableStatus::AtUpper,
        };

        let row = self.working_set.pivot_row(&self.basis, pivot_row)?;
        self.pricing.update_weights(self.working_set.data(), &self.basis, &PivotInfo {
            entering,
            leaving: leaving_var,
            pivot_row,
            column,
            row: &row,
        })?;

        self.working_set.apply_step(&self.basis, direction, step, entering, sign);
        self.basis.pivot(pivot_row, column, entering, leaving_var, leaving_status)?;
        let value = self.working_set.nonbasic_value(leaving_var, leaving_status);
        self.working_set.set_value(leaving_var, value);
        self.working_set.update_reduced_costs(entering, leaving_var, &row, column[pivot_row]);
        self.objective += reduced_cost * sign * step;
        self.pricing.invalidate(false);
        self.duals_fresh = false;

        trace!(
            "Iteration {}: variable {} enters, {} leaves from row {}, step {}, objective {}",
            self.iterations, entering, leaving_var, pivot_row, step, self.objective,
        );

        match self.basis.should_refactor(&self.policy) {
            RefactorDecision::NotNeeded => Ok(()),
            RefactorDecision::Recommended(reason) | RefactorDecision::Required(reason) => {
                debug!("Refactorizing after {} eta factors: {:?}", self.basis.eta_count(), reason);
                self.refactor()
            },
        }
    }
}
