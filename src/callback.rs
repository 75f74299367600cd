//! # Interrupting and observing a solve
//!
//! A solve can be stopped from another thread through a `TerminationFlag`, or observed and
//! stopped from the solving thread itself through a `Callback`.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::data::linear_program::solution::Solution;

/// Shared flag that asks a running solve to stop.
///
/// Clones refer to the same flag. The solver checks it once per iteration and stops with
/// `SolveStatus::TimeLimit`.
#[derive(Clone, Debug, Default)]
pub struct TerminationFlag(Arc<AtomicBool>);

impl TerminationFlag {
    /// Create a new flag that is not set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the solve to stop.
    pub fn terminate(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether termination was requested.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Clear the flag, such that it can be used for another solve.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Which phase of the two phase method is running.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Phase {
    /// Searching for a feasible basis by minimizing the sum of the artificial variables.
    One,
    /// Optimizing the original objective from a feasible basis.
    Two,
}

/// Size of the problem, handed to the callback before the solve starts.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ProblemInfo {
    /// Number of constraints.
    pub nr_rows: usize,
    /// Number of structural variables.
    pub nr_columns: usize,
    /// Number of nonzeros in the constraint matrix.
    pub nnz: usize,
}

/// State of the solve after an iteration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Progress {
    /// Number of iterations so far.
    pub iteration: u64,
    /// The phase the iteration belonged to.
    pub phase: Phase,
    /// Objective value of the current phase, as a minimization problem.
    pub objective: f64,
    /// Number of eta factors in the basis representation.
    pub eta_count: usize,
}

/// What the solver should do after a callback returns.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CallbackAction {
    /// Keep iterating.
    Continue,
    /// Stop as if the time limit was reached.
    Terminate,
}

/// Hooks into a solve.
///
/// All methods have default implementations that do nothing.
pub trait Callback {
    /// Called once, before any work is done.
    fn pre_solve(&mut self, _info: &ProblemInfo) {}

    /// Called after every iteration.
    fn poll(&mut self, _progress: &Progress) -> CallbackAction {
        CallbackAction::Continue
    }

    /// Called once with the result of a solve that didn't fail.
    fn post_solve(&mut self, _solution: &Solution) {}
}

#[cfg(test)]
mod test {
    use std::thread;

    use crate::callback::{Callback, CallbackAction, Phase, Progress, TerminationFlag};

    #[test]
    fn flag_is_shared() {
        let flag = TerminationFlag::new();
        assert!(!flag.is_set());

        let clone = flag.clone();
        thread::spawn(move || clone.terminate()).join().unwrap();
        assert!(flag.is_set());

        flag.reset();
        assert!(!flag.is_set());
    }

    #[test]
    fn default_callback() {
        struct Nothing;
        impl Callback for Nothing {}

        let progress = Progress { iteration: 1, phase: Phase::One, objective: 0.0, eta_count: 0 };
        assert_eq!(Nothing.poll(&progress), CallbackAction::Continue);
    }
}
