//! # Phase one
//!
//! Finding a feasible basis by minimizing the sum of artificial variables. Every row whose slack
//! can't take the value that the nonbasic variables leave for it gets an artificial variable; once
//! all artificials are zero, the basis they leave behind is feasible.
use log::{debug, info, trace, warn};

use crate::algorithm::two_phase::{PhaseResult, Simplex};
use crate::algorithm::two_phase::basis::{BasisState, VariableStatus};
use crate::algorithm::two_phase::matrix_provider::MatrixProvider;
use crate::algorithm::two_phase::matrix_provider::matrix_data::ColumnType;
use crate::callback::Phase;
use crate::data::linear_program::solution::SolveStatus;
use crate::error::SolveError;

/// Artificial variables are only driven out of the basis with a pivot at least this large.
const DRIVE_OUT_PIVOT: f64 = 1e-7;

impl<'a, 'e> Simplex<'a, 'e> {
    /// Search for a primal feasible basis.
    ///
    /// Should be called with the slack basis in place.
    ///
    /// # Return value
    ///
    /// `None` if a feasible basis was found and phase two can start, otherwise the status that
    /// the solve ends with.
    pub(super) fn phase_one(&mut self) -> Result<Option<SolveStatus>, SolveError> {
        if let Some(j) = self.unbounded_empty_column() {
            info!("Column {} is empty and improves the objective without limit", j);
            return Ok(Some(SolveStatus::InfeasibleOrUnbounded));
        }

        self.phase = Phase::One;
        let artificials = self.add_artificials()?;
        info!("Phase one with {} artificial variables", artificials.len());
        self.working_set.use_phase_one_cost(&artificials);
        self.refactor()?;

        let result = self.primal()?;
        self.phase_one_iterations = self.iterations;
        match result {
            PhaseResult::Optimal => {},
            PhaseResult::Unbounded => {
                warn!("Phase one objective appears unbounded, which is a numerical error");
                return Ok(Some(SolveStatus::Numeric));
            },
            PhaseResult::Stopped(status) => return Ok(Some(status)),
        }

        let infeasibility = self.working_set.objective();
        if infeasibility > self.settings.feasibility_tol {
            info!("Problem is infeasible, phase one ended with infeasibility {}", infeasibility);
            return Ok(Some(SolveStatus::Infeasible));
        }

        self.drive_out_artificials()?;
        Ok(None)
    }

    /// A structural variable without any constraint coefficients and with an improving direction
    /// that is not bounded.
    fn unbounded_empty_column(&self) -> Option<usize> {
        let tolerance = self.settings.optimality_tol;
        let data = self.working_set.data();

        (0..data.nr_structural())
            .filter(|&j| data.constraints().column_nnz(j) == 0)
            .find(|&j| {
                let cost = self.working_set.objective_cost(j);
                (cost < -tolerance && self.working_set.upper(j) == f64::INFINITY)
                    || (cost > tolerance && self.working_set.lower(j) == f64::NEG_INFINITY)
            })
    }

    /// Replace the slack of every infeasible row by an artificial variable.
    ///
    /// The slack moves to its nearest bound and the artificial absorbs the remaining residual. Its
    /// column is signed such that its value is positive.
    ///
    /// # Return value
    ///
    /// The artificial variables that were made basic.
    fn add_artificials(&mut self) -> Result<Vec<usize>, SolveError> {
        let tolerance = self.settings.feasibility_tol;
        let m = self.working_set.nr_rows();

        let mut basic_vars = self.basis.basic_vars().to_vec();
        let mut var_status = self.basis.var_status().to_vec();
        let mut artificials = Vec::new();
        for i in 0..m {
            let slack = self.working_set.data().slack(i);
            debug_assert_eq!(basic_vars[i], slack);

            let value = self.working_set.value(slack);
            let (lower, upper) = (self.working_set.lower(slack), self.working_set.upper(slack));
            let (status, bound) = if value < lower - tolerance {
                (VariableStatus::AtLower, lower)
            } else if value > upper + tolerance {
                (VariableStatus::AtUpper, upper)
            } else {
                continue;
            };
            let residual = value - bound;

            let artificial = self.working_set.data().artificial(i);
            self.working_set.data_mut().set_artificial_sign(i, residual < 0.0);
            self.working_set.set_bounds(artificial, 0.0, f64::INFINITY);
            basic_vars[i] = artificial;
            var_status[artificial] = VariableStatus::Basic(i);
            var_status[slack] = status;
            artificials.push(artificial);
        }

        self.basis = BasisState::new(basic_vars, var_status, self.tolerances)?;
        Ok(artificials)
    }

    /// Pivot artificial variables that are still basic out of the basis, fix all of them at zero.
    ///
    /// A row in which no other variable can take the place of the artificial is redundant; its
    /// artificial stays basic at zero.
    fn drive_out_artificials(&mut self) -> Result<(), SolveError> {
        let first_artificial = self.working_set.data().group_start(ColumnType::Artificial);

        let mut driven_out = 0;
        let mut redundant = 0;
        for r in 0..self.basis.m() {
            let artificial = self.basis.basic_vars()[r];
            if artificial < first_artificial {
                continue;
            }

            let row = self.working_set.pivot_row(&self.basis, r)?;
            let candidate = row.iter()
                .filter(|&&(j, alpha)| j < first_artificial && alpha.abs() >= DRIVE_OUT_PIVOT)
                .max_by(|(_, a), (_, b)| a.abs().total_cmp(&b.abs()));
            let Some(&(entering, _)) = candidate else {
                debug!("Row {} is redundant", r);
                redundant += 1;
                continue;
            };

            let column = self.basis.generate_column(self.working_set.data().column(entering))?;
            match self.basis.pivot(r, &column, entering, artificial, VariableStatus::AtLower) {
                Ok(()) => {
                    trace!("Variable {} replaced artificial {} in row {}", entering, artificial, r);
                    driven_out += 1;
                },
                Err(error) if error.is_numerical() => {
                    debug!("Row {} is treated as redundant: {}", r, error);
                    redundant += 1;
                },
                Err(error) => return Err(error),
            }
        }

        for j in first_artificial..self.working_set.nr_variables() {
            self.working_set.set_bounds(j, 0.0, 0.0);
        }
        if driven_out + redundant > 0 {
            debug!("Drove {} artificials out of the basis, {} rows are redundant", driven_out, redundant);
        }

        Ok(())
    }
}
