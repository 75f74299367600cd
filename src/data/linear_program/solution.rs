//! # Representation of solve results
//!
//! Once a solve terminates, the final primal and dual values are handed back together with a
//! status that describes how trustworthy they are.
use std::fmt;
use std::fmt::{Display, Formatter};

use crate::algorithm::two_phase::basis::VariableStatus;

/// Outcome of a solve.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SolveStatus {
    /// An optimal basic solution was found.
    Optimal,
    /// No point satisfies all constraints and bounds.
    Infeasible,
    /// The objective can be improved without limit.
    Unbounded,
    /// Unboundedness was detected before feasibility could be established.
    InfeasibleOrUnbounded,
    /// The iteration limit was reached; the values are the last iterate.
    IterationLimit,
    /// The time limit was reached or termination was requested; the values are the last iterate.
    TimeLimit,
    /// Numerical difficulties persisted after refactorization.
    Numeric,
}

impl SolveStatus {
    /// Whether the solve stopped because of a limit, rather than a proof.
    pub fn is_limit(self) -> bool {
        matches!(self, SolveStatus::IterationLimit | SolveStatus::TimeLimit)
    }
}

impl Display for SolveStatus {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let text = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::InfeasibleOrUnbounded => "infeasible or unbounded",
            SolveStatus::IterationLimit => "iteration limit reached",
            SolveStatus::TimeLimit => "time limit reached",
            SolveStatus::Numeric => "numerical trouble",
        };
        f.write_str(text)
    }
}

/// The basis at the end of a solve, which can be used to warm start another solve of a problem
/// with the same dimensions.
#[derive(Clone, Debug, PartialEq)]
pub struct BasisSnapshot {
    /// Variable that is basic in each row.
    pub basic_variables: Vec<usize>,
    /// Status of every variable: structural, then slack, then artificial.
    pub status: Vec<VariableStatus>,
}

/// Everything a solve produces.
#[derive(Clone, Debug, PartialEq)]
pub struct Solution {
    /// How the solve ended.
    pub status: SolveStatus,
    /// Objective value of `x`, in the direction of the original problem.
    pub objective_value: f64,
    /// Values of the structural variables.
    pub x: Vec<f64>,
    /// Dual values, one per row, in the direction of the original problem.
    pub pi: Vec<f64>,
    /// Total number of iterations, both phases.
    pub iterations: u64,
    /// Number of those iterations spent in phase one.
    pub phase_one_iterations: u64,
    /// Number of times the basis was refactorized.
    pub refactorizations: u64,
    /// Final basis.
    pub basis: BasisSnapshot,
}

impl Display for Solution {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(f, "Status: {}", self.status)?;
        writeln!(f, "Objective value: {}", self.objective_value)?;
        writeln!(f, "Iterations: {} ({} in phase one)", self.iterations, self.phase_one_iterations)?;
        for (j, value) in self.x.iter().enumerate() {
            writeln!(f, "x{}\t{}", j, value)?;
        }
        Ok(())
    }
}
