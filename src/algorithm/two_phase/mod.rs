//! # The two phase simplex method
//!
//! A bounded primal simplex method on the revised form: the basis inverse is never stored
//! explicitly, but kept as a file of eta factors (see the `basis` module).
//!
//! A solve starts from a crash basis. If that basis is not primal feasible, phase one minimizes
//! the sum of artificial variables that absorb the infeasibility of each row. Phase two then
//! optimizes the original objective from the feasible basis that was found.
use std::time::Instant;

use log::{debug, info, warn};

use crate::algorithm::two_phase::basis::{BasisState, FactorTolerances};
use crate::algorithm::two_phase::basis::refactor::RefactorPolicy;
use crate::algorithm::two_phase::crash::{CrashStrategy, scored_basis, slack_basis};
use crate::algorithm::two_phase::matrix_provider::matrix_data::ColumnType;
use crate::algorithm::two_phase::strategy::pivot_rule::PricingContext;
use crate::algorithm::two_phase::working_set::SolverWorkingSet;
use crate::callback::{Callback, CallbackAction, Phase, ProblemInfo, Progress, TerminationFlag};
use crate::data::linear_program::model::LinearProgram;
use crate::data::linear_program::solution::{BasisSnapshot, Solution, SolveStatus};
use crate::error::SolveError;
use crate::settings::SolverSettings;

pub mod basis;
pub mod crash;
pub mod matrix_provider;
pub mod strategy;
pub mod working_set;
mod phase_one;
mod phase_two;

/// Solve a linear program with default hooks.
///
/// # Return value
///
/// The solution, also if the problem turned out to be infeasible or unbounded. An error is
/// returned only for invalid input and when memory runs out.
pub fn solve(lp: &LinearProgram, settings: &SolverSettings) -> Result<Solution, SolveError> {
    SimplexEngine::new(lp, settings).solve()
}

/// Where a `SimplexEngine` is in its lifecycle.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EngineState {
    /// Nothing was done yet.
    Uninitialized,
    /// Constructing the initial basis.
    CrashBasis,
    /// Searching for a feasible basis.
    PhaseOne,
    /// Optimizing from a feasible basis.
    PhaseTwo,
    /// The solve ended with the given status.
    Finished(SolveStatus),
}

/// A single solve of a linear program.
///
/// Created with `new` and configured with the `with_*` methods. After `solve`, `state` tells how
/// the solve ended.
pub struct SimplexEngine<'a> {
    lp: &'a LinearProgram,
    settings: &'a SolverSettings,
    termination: Option<TerminationFlag>,
    callback: Option<&'a mut dyn Callback>,
    warm_start: Option<BasisSnapshot>,
    state: EngineState,
}

impl<'a> SimplexEngine<'a> {
    /// Create a new engine for a problem.
    pub fn new(lp: &'a LinearProgram, settings: &'a SolverSettings) -> Self {
        Self {
            lp,
            settings,
            termination: None,
            callback: None,
            warm_start: None,
            state: EngineState::Uninitialized,
        }
    }

    /// Stop with `SolveStatus::TimeLimit` once this flag is set.
    pub fn with_termination(mut self, flag: TerminationFlag) -> Self {
        self.termination = Some(flag);
        self
    }

    /// Call into `callback` before, during and after the solve.
    pub fn with_callback(mut self, callback: &'a mut dyn Callback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Start from the basis of an earlier solve of a problem of the same dimensions.
    ///
    /// If the basis turns out not to be primal feasible, the crash procedure is used instead.
    pub fn with_warm_start(mut self, snapshot: BasisSnapshot) -> Self {
        self.warm_start = Some(snapshot);
        self
    }

    /// Current position in the lifecycle.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Run the solve to completion, or until a limit is reached.
    ///
    /// # Return value
    ///
    /// The solution with a status describing how the solve ended. Errors are returned for invalid
    /// settings, malformed warm starts and when memory runs out.
    pub fn solve(&mut self) -> Result<Solution, SolveError> {
        let solution = self.run()?;

        self.state.transition(EngineState::Finished(solution.status));
        info!(
            "Solve ended: {}, objective {} after {} iterations",
            solution.status, solution.objective_value, solution.iterations,
        );
        if let Some(callback) = self.callback.as_deref_mut() {
            callback.post_solve(&solution);
        }

        Ok(solution)
    }

    fn run(&mut self) -> Result<Solution, SolveError> {
        self.settings.validate()?;
        let lp = self.lp;
        let settings = self.settings;
        let start = Instant::now();

        info!(
            "Solving a problem with {} rows, {} columns and {} nonzeros",
            lp.nr_rows(), lp.nr_columns(), lp.constraints().nnz(),
        );
        if let Some(callback) = self.callback.as_deref_mut() {
            callback.pre_solve(&ProblemInfo {
                nr_rows: lp.nr_rows(),
                nr_columns: lp.nr_columns(),
                nnz: lp.constraints().nnz(),
            });
        }

        self.state.transition(EngineState::CrashBasis);
        let warm_start = self.warm_start.take();
        let mut simplex = Simplex::new(
            lp, settings, self.termination.clone(), self.callback.as_deref_mut(), start,
        );

        if let Some(j) = simplex.working_set.inverted_bounds(settings.feasibility_tol) {
            info!("Variable {} has a lower bound above its upper bound", j);
            return Ok(simplex.solution(SolveStatus::Infeasible));
        }

        if !simplex.initial_basis(warm_start)? {
            self.state.transition(EngineState::PhaseOne);
            if let Some(status) = simplex.phase_one()? {
                return Ok(simplex.solution(status));
            }
        }

        self.state.transition(EngineState::PhaseTwo);
        let status = simplex.phase_two()?;
        Ok(simplex.solution(status))
    }
}

impl EngineState {
    fn transition(&mut self, next: EngineState) {
        debug!("Transition from {:?} to {:?}", self, next);
        *self = next;
    }
}

/// How a phase ended.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum PhaseResult {
    Optimal,
    Unbounded,
    Stopped(SolveStatus),
}

/// Everything that changes during a solve.
struct Simplex<'a, 'e> {
    lp: &'a LinearProgram,
    settings: &'a SolverSettings,
    policy: RefactorPolicy,
    tolerances: FactorTolerances,

    working_set: SolverWorkingSet<'a>,
    basis: BasisState,
    pricing: PricingContext,

    phase: Phase,
    /// Objective value of the current phase.
    objective: f64,
    /// Whether the reduced costs were computed from scratch since the last basis change.
    duals_fresh: bool,
    /// Whether a refactorization replaced basic variables during phase two.
    repaired: bool,

    iterations: u64,
    phase_one_iterations: u64,
    refactorizations: u64,

    start: Instant,
    termination: Option<TerminationFlag>,
    callback: Option<&'e mut (dyn Callback + 'a)>,
}

impl<'a, 'e> Simplex<'a, 'e> {
    fn new(
        lp: &'a LinearProgram,
        settings: &'a SolverSettings,
        termination: Option<TerminationFlag>,
        callback: Option<&'e mut (dyn Callback + 'a)>,
        start: Instant,
    ) -> Self {
        let tolerances = FactorTolerances::from(settings);
        let working_set = SolverWorkingSet::new(lp, settings);
        let basis = slack_basis(&working_set, tolerances);
        let mut pricing = PricingContext::new(
            settings.pricing,
            working_set.nr_variables(),
            settings.partial_sections,
            settings.candidate_limit,
        );
        debug!("Pricing with {:?}", pricing.strategy());
        for j in 0..working_set.nr_variables() {
            if working_set.is_fixed(j) || working_set.data().column_type(j) == ColumnType::Artificial {
                pricing.exclude(j);
            }
        }

        Self {
            lp,
            settings,
            policy: RefactorPolicy::from(settings),
            tolerances,
            working_set,
            basis,
            pricing,
            phase: Phase::Two,
            objective: 0.0,
            duals_fresh: false,
            repaired: false,
            iterations: 0,
            phase_one_iterations: 0,
            refactorizations: 0,
            start,
            termination,
            callback,
        }
    }

    /// Choose the initial basis and compute all values for it.
    ///
    /// # Return value
    ///
    /// Whether the basis is primal feasible.
    fn initial_basis(&mut self, warm_start: Option<BasisSnapshot>) -> Result<bool, SolveError> {
        let tolerance = self.settings.feasibility_tol;

        if let Some(snapshot) = warm_start {
            self.load_snapshot(snapshot)?;
            if self.working_set.is_primal_feasible(tolerance) {
                debug!("Starting from the warm start basis");
                return Ok(true);
            }
            warn!("Warm start basis is not primal feasible, using the crash procedure instead");
        }

        if self.settings.crash == CrashStrategy::Scored {
            if let Some(basis) = scored_basis(&self.working_set, self.tolerances)? {
                self.basis = basis;
                self.refactor()?;
                if self.working_set.is_primal_feasible(tolerance) {
                    debug!("Crash basis is primal feasible");
                    return Ok(true);
                }
                debug!("Crash basis is not primal feasible, using the slack basis instead");
            }
        }

        self.basis = slack_basis(&self.working_set, self.tolerances);
        self.recompute()?;
        Ok(self.working_set.is_primal_feasible(tolerance))
    }

    /// Install the basis of an earlier solve.
    ///
    /// Nonbasic statuses that don't match the bounds are replaced by the default status.
    fn load_snapshot(&mut self, snapshot: BasisSnapshot) -> Result<(), SolveError> {
        let BasisSnapshot { basic_variables, mut status } = snapshot;
        if basic_variables.len() != self.working_set.nr_rows()
            || status.len() != self.working_set.nr_variables() {
            return Err(SolveError::InvalidArgument(format!(
                "warm start of {} rows and {} variables doesn't fit a problem of {} rows and {} variables",
                basic_variables.len(), status.len(),
                self.working_set.nr_rows(), self.working_set.nr_variables(),
            )));
        }

        for (j, status) in status.iter_mut().enumerate() {
            if !self.working_set.is_valid_status(j, *status) {
                *status = self.working_set.default_status(j);
            }
        }

        self.basis = BasisState::new(basic_variables, status, self.tolerances)?;
        self.refactor()
    }

    /// Rebuild the eta file from the basic columns and recompute all values.
    fn refactor(&mut self) -> Result<(), SolveError> {
        let report = self.basis.refactor(self.working_set.data(), self.settings.markowitz_threshold)?;
        self.refactorizations += 1;

        if report.was_repaired() {
            warn!(
                "Basis was singular, replaced variables {:?} by the slacks {:?}",
                report.rejected, report.inserted,
            );
            for &j in &report.rejected {
                let status = self.working_set.nearest_status(j, self.working_set.value(j));
                self.basis.set_nonbasic_status(j, status);
            }
            if self.phase == Phase::Two {
                self.repaired = true;
            }
        }

        self.recompute()
    }

    /// Compute the primal values, dual values, reduced costs and pricing weights from scratch.
    fn recompute(&mut self) -> Result<(), SolveError> {
        self.working_set.compute_primal(&self.basis)?;
        self.recompute_duals()?;
        self.pricing.reset_weights(self.working_set.data(), &self.basis)?;
        self.objective = self.working_set.objective();

        Ok(())
    }

    fn recompute_duals(&mut self) -> Result<(), SolveError> {
        self.working_set.compute_duals(&self.basis)?;
        self.pricing.invalidate(false);
        self.duals_fresh = true;

        Ok(())
    }

    /// Whether a limit was reached before the next iteration.
    fn check_limits(&self) -> Option<SolveStatus> {
        if self.iterations >= self.settings.max_iterations {
            info!("Iteration limit of {} reached", self.settings.max_iterations);
            Some(SolveStatus::IterationLimit)
        } else if self.start.elapsed().as_secs_f64() >= self.settings.time_limit {
            info!("Time limit of {} seconds reached", self.settings.time_limit);
            Some(SolveStatus::TimeLimit)
        } else if self.termination.as_ref().is_some_and(TerminationFlag::is_set) {
            info!("Termination requested");
            Some(SolveStatus::TimeLimit)
        } else {
            None
        }
    }

    /// Report progress to the callback.
    fn poll(&mut self) -> Option<SolveStatus> {
        let progress = Progress {
            iteration: self.iterations,
            phase: self.phase,
            objective: self.objective,
            eta_count: self.basis.eta_count(),
        };
        let callback = self.callback.as_deref_mut()?;
        match callback.poll(&progress) {
            CallbackAction::Continue => None,
            CallbackAction::Terminate => {
                info!("Termination requested by callback");
                Some(SolveStatus::TimeLimit)
            },
        }
    }

    /// Collect the current values in the direction of the original problem.
    fn solution(&self, status: SolveStatus) -> Solution {
        let sign = self.lp.objective().sign();
        let n = self.working_set.data().nr_structural();

        Solution {
            status,
            objective_value: sign * self.working_set.original_objective(),
            x: self.working_set.values()[..n].to_vec(),
            pi: self.working_set.pi().iter().map(|&pi| sign * pi).collect(),
            iterations: self.iterations,
            phase_one_iterations: self.phase_one_iterations,
            refactorizations: self.refactorizations,
            basis: BasisSnapshot {
                basic_variables: self.basis.basic_vars().to_vec(),
                status: self.basis.var_status().to_vec(),
            },
        }
    }
}

#[cfg(test)]
mod test {
    use approx::assert_abs_diff_eq;

    use crate::algorithm::two_phase::{EngineState, SimplexEngine, solve};
    use crate::callback::{Callback, CallbackAction, ProblemInfo, Progress, TerminationFlag};
    use crate::data::linear_algebra::matrix::CscMatrix;
    use crate::data::linear_program::elements::{ConstraintType, Objective};
    use crate::data::linear_program::model::LinearProgram;
    use crate::data::linear_program::solution::{Solution, SolveStatus};
    use crate::settings::{SolverSettings, SolverSettingsBuilder};

    fn two_by_two() -> LinearProgram {
        // min -x - y s.t. x + 2y <= 4, 3x + y <= 6
        LinearProgram::nonnegative(
            CscMatrix::from_dense(&[vec![1.0, 2.0], vec![3.0, 1.0]]).unwrap(),
            vec![4.0, 6.0],
            vec![ConstraintType::Less, ConstraintType::Less],
            vec![-1.0, -1.0],
            Objective::Minimize,
        ).unwrap()
    }

    #[test]
    fn optimal() {
        let solution = solve(&two_by_two(), &SolverSettings::default()).unwrap();
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_abs_diff_eq!(solution.objective_value, -2.8, epsilon = 1e-9);
        assert_abs_diff_eq!(solution.x[0], 1.6, epsilon = 1e-9);
        assert_abs_diff_eq!(solution.x[1], 1.2, epsilon = 1e-9);
        assert_eq!(solution.phase_one_iterations, 0);
        // Dual values of the rows
        assert_abs_diff_eq!(solution.pi[0], -0.4, epsilon = 1e-9);
        assert_abs_diff_eq!(solution.pi[1], -0.2, epsilon = 1e-9);
    }

    #[test]
    fn engine_state() {
        let lp = two_by_two();
        let settings = SolverSettings::default();
        let mut engine = SimplexEngine::new(&lp, &settings);
        assert_eq!(engine.state(), EngineState::Uninitialized);

        let solution = engine.solve().unwrap();
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(engine.state(), EngineState::Finished(SolveStatus::Optimal));
    }

    #[test]
    fn inverted_bounds() {
        let lp = LinearProgram::new(
            CscMatrix::from_dense(&[vec![1.0]]).unwrap(),
            vec![1.0],
            vec![ConstraintType::Less],
            vec![2.0],
            vec![1.0],
            vec![1.0],
            Objective::Minimize,
        ).unwrap();
        let solution = solve(&lp, &SolverSettings::default()).unwrap();
        assert_eq!(solution.status, SolveStatus::Infeasible);
        assert_eq!(solution.iterations, 0);
    }

    #[test]
    fn lower_bound_at_infinity() {
        for (lower, upper) in [(f64::INFINITY, 5.0), (1e100, 1e100), (0.0, f64::NEG_INFINITY)] {
            let lp = LinearProgram::new(
                CscMatrix::from_dense(&[vec![1.0]]).unwrap(),
                vec![10.0],
                vec![ConstraintType::Less],
                vec![lower],
                vec![upper],
                vec![1.0],
                Objective::Minimize,
            ).unwrap();
            let solution = solve(&lp, &SolverSettings::default()).unwrap();
            assert_eq!(solution.status, SolveStatus::Infeasible, "[{}, {}]", lower, upper);
            assert_eq!(solution.iterations, 0);
        }
    }

    #[test]
    fn invalid_settings() {
        let mut settings = SolverSettings::default();
        settings.pivot_tolerance = 0.0;
        assert!(solve(&two_by_two(), &settings).is_err());
    }

    #[test]
    fn iteration_limit() {
        let settings = SolverSettingsBuilder::default().max_iterations(1).build().unwrap();
        let solution = solve(&two_by_two(), &settings).unwrap();
        assert_eq!(solution.status, SolveStatus::IterationLimit);
        assert_eq!(solution.iterations, 1);
    }

    #[test]
    fn terminated() {
        let flag = TerminationFlag::new();
        flag.terminate();
        let lp = two_by_two();
        let settings = SolverSettings::default();
        let solution = SimplexEngine::new(&lp, &settings)
            .with_termination(flag)
            .solve()
            .unwrap();
        assert_eq!(solution.status, SolveStatus::TimeLimit);
        assert_eq!(solution.iterations, 0);
    }

    #[derive(Default)]
    struct Recorder {
        rows: usize,
        polls: u64,
        status: Option<SolveStatus>,
    }

    impl Callback for Recorder {
        fn pre_solve(&mut self, info: &ProblemInfo) {
            self.rows = info.nr_rows;
        }

        fn poll(&mut self, progress: &Progress) -> CallbackAction {
            self.polls = progress.iteration;
            CallbackAction::Terminate
        }

        fn post_solve(&mut self, solution: &Solution) {
            self.status = Some(solution.status);
        }
    }

    #[test]
    fn callback() {
        let lp = two_by_two();
        let settings = SolverSettings::default();
        let mut recorder = Recorder::default();
        let solution = SimplexEngine::new(&lp, &settings)
            .with_callback(&mut recorder)
            .solve()
            .unwrap();

        assert_eq!(solution.status, SolveStatus::TimeLimit);
        assert_eq!(recorder.rows, 2);
        assert_eq!(recorder.polls, 1);
        assert_eq!(recorder.status, Some(SolveStatus::TimeLimit));
    }
}
