//! # Refactorization
//!
//! Every basis change appends an eta factor. The longer the file gets, the more expensive FTRAN
//! and BTRAN become and the more rounding error accumulates. Rebuilding the file from the basic
//! columns resets both.
use std::time::Duration;

use log::debug;

use crate::algorithm::two_phase::basis::{BasisState, VariableStatus};
use crate::algorithm::two_phase::basis::decomposition::reinvert;
use crate::algorithm::two_phase::matrix_provider::MatrixProvider;
use crate::error::SolveError;
use crate::settings::SolverSettings;

/// Number of FTRAN timings after a refactorization that determine the baseline.
const BASELINE_SAMPLES: usize = 8;
/// Weight of a new FTRAN timing in the moving average.
const SMOOTHING: f64 = 0.1;

/// When to rebuild the eta file.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RefactorPolicy {
    /// Required at this many factors.
    pub max_eta_count: usize,
    /// Required at this many bytes.
    pub max_eta_memory: usize,
    /// Recommended after this many basis changes.
    pub refactor_interval: usize,
    /// Recommended when FTRAN got this many times slower than right after the last
    /// refactorization.
    pub degradation_factor: f64,
}

impl From<&SolverSettings> for RefactorPolicy {
    fn from(settings: &SolverSettings) -> Self {
        Self {
            max_eta_count: settings.max_eta_count,
            max_eta_memory: settings.max_eta_memory,
            refactor_interval: settings.refactor_interval,
            degradation_factor: settings.ftran_degradation_factor,
        }
    }
}

/// Why a refactorization is advised.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RefactorReason {
    EtaCount,
    EtaMemory,
    Interval,
    Degradation,
}

/// Outcome of `BasisState::should_refactor`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RefactorDecision {
    /// The eta file is fine.
    NotNeeded,
    /// A refactorization would likely help, but may be deferred.
    Recommended(RefactorReason),
    /// The eta file reached a hard limit and should be rebuilt before the next iteration.
    Required(RefactorReason),
}

/// What a refactorization did.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RefactorReport {
    /// Number of factors written.
    pub eta_count: usize,
    /// Previously basic variables that were dependent on the others and are now nonbasic.
    ///
    /// Their status is set to `AtLower`, the caller should move them to a bound that makes sense.
    pub rejected: Vec<usize>,
    /// Unit columns that replaced the rejected variables.
    pub inserted: Vec<usize>,
}

impl RefactorReport {
    /// Whether the basis had to be repaired.
    pub fn was_repaired(&self) -> bool {
        !self.rejected.is_empty()
    }
}

/// Keeps track of the time spent in FTRAN.
///
/// The first few timings after a refactorization form a baseline; after that, an exponential
/// moving average is compared against it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FtranMonitor {
    baseline_total: f64,
    baseline_samples: usize,
    average: Option<f64>,
}

impl FtranMonitor {
    /// Register a single timing.
    pub fn record(&mut self, elapsed: Duration) {
        let seconds = elapsed.as_secs_f64();

        if self.baseline_samples < BASELINE_SAMPLES {
            self.baseline_total += seconds;
            self.baseline_samples += 1;
        } else {
            self.average = Some(match self.average {
                Some(average) => average + SMOOTHING * (seconds - average),
                None => seconds,
            });
        }
    }

    /// Average time of the first FTRAN calls after the last refactorization, once known.
    pub fn baseline(&self) -> Option<f64> {
        (self.baseline_samples == BASELINE_SAMPLES)
            .then(|| self.baseline_total / BASELINE_SAMPLES as f64)
    }

    /// Whether the moving average exceeds the baseline by more than `factor`.
    pub fn is_degraded(&self, factor: f64) -> bool {
        match (self.baseline(), self.average) {
            (Some(baseline), Some(average)) => baseline > 0.0 && average > factor * baseline,
            _ => false,
        }
    }
}

impl BasisState {
    /// Decide whether the eta file should be rebuilt.
    pub fn should_refactor(&self, policy: &RefactorPolicy) -> RefactorDecision {
        if self.eta_file.len() >= policy.max_eta_count {
            RefactorDecision::Required(RefactorReason::EtaCount)
        } else if self.eta_file.memory() >= policy.max_eta_memory {
            RefactorDecision::Required(RefactorReason::EtaMemory)
        } else if self.pivots_since_refactor >= policy.refactor_interval {
            RefactorDecision::Recommended(RefactorReason::Interval)
        } else if self.ftran_monitor.is_degraded(policy.degradation_factor) {
            RefactorDecision::Recommended(RefactorReason::Degradation)
        } else {
            RefactorDecision::NotNeeded
        }
    }

    /// Discard all eta factors and rebuild them from the basic columns.
    ///
    /// If the basic columns are dependent, the dependent ones are replaced by unit columns of the
    /// rows that remain uncovered; see `RefactorReport`.
    ///
    /// # Arguments
    ///
    /// * `provider`: Source of the columns, with as many rows as this basis.
    /// * `threshold`: Relative pivot threshold in `(0, 1]`; higher is more stable but creates
    /// more fill-in.
    ///
    /// # Return value
    ///
    /// What was done, or an error if the provider doesn't match or memory ran out.
    pub fn refactor<MP: MatrixProvider>(
        &mut self,
        provider: &MP,
        threshold: f64,
    ) -> Result<RefactorReport, SolveError> {
        if provider.nr_rows() != self.m || provider.nr_columns() != self.n {
            return Err(SolveError::InvalidArgument(format!(
                "a {} x {} problem can't be used with a basis of {} rows and {} variables",
                provider.nr_rows(), provider.nr_columns(), self.m, self.n,
            )));
        }

        self.eta_file.clear();
        self.pivots_since_refactor = 0;
        self.ftran_monitor = FtranMonitor::default();

        let is_identity = self.basic_vars.iter().enumerate()
            .all(|(i, &j)| provider.unit_row(j) == Some(i));
        if is_identity {
            return Ok(RefactorReport::default());
        }

        let reinversion = reinvert(provider, &self.basic_vars, &mut self.eta_file, threshold, self.tolerances)?;
        for &j in &reinversion.rejected {
            self.var_status[j] = VariableStatus::AtLower;
        }
        for (i, &j) in reinversion.basic_vars.iter().enumerate() {
            self.var_status[j] = VariableStatus::Basic(i);
        }
        self.basic_vars = reinversion.basic_vars;
        debug_assert!(self.is_consistent());

        debug!(
            "Refactorized into {} factors with {} nonzeros",
            self.eta_file.len(), self.eta_file.nnz(),
        );
        Ok(RefactorReport {
            eta_count: self.eta_file.len(),
            rejected: reinversion.rejected,
            inserted: reinversion.inserted,
        })
    }
}
