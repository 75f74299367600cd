//! # Solver settings
//!
//! Numerical tolerances, limits and strategy choices. The defaults are suitable for most
//! problems; use the `SolverSettingsBuilder` to change individual values.
use derive_builder::Builder;
use thiserror::Error;

use crate::algorithm::two_phase::crash::CrashStrategy;
use crate::algorithm::two_phase::strategy::pivot_rule::PricingStrategy;

/// Error type returned by settings validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    /// A tolerance or other strictly positive value is zero, negative, infinite or NaN.
    #[error("setting `{0}` must be finite and strictly positive")]
    NotPositive(&'static str),
    /// A value is outside of the range the algorithm can work with.
    #[error("setting `{field}` is out of range: {reason}")]
    OutOfRange {
        /// Name of the setting.
        field: &'static str,
        /// Human readable explanation.
        reason: &'static str,
    },
}

/// All parameters of a solve.
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct SolverSettings {
    /// Primal feasibility tolerance, used for bounds in the ratio test and in phase one.
    #[builder(default = "1e-6")]
    pub feasibility_tol: f64,

    /// Dual feasibility tolerance, a reduced cost is attractive beyond this value.
    #[builder(default = "1e-6")]
    pub optimality_tol: f64,

    /// Pivots with a magnitude below this value are rejected.
    #[builder(default = "1e-10")]
    pub pivot_tolerance: f64,

    /// Values below this magnitude are not stored in eta factors.
    #[builder(default = "1e-12")]
    pub zero_tolerance: f64,

    /// Bounds with a magnitude at or beyond this value are treated as absent.
    #[builder(default = "1e100")]
    pub infinity: f64,

    /// A refactorization is required once the eta file holds this many factors.
    #[builder(default = "200")]
    pub max_eta_count: usize,

    /// A refactorization is required once the eta file uses this many bytes.
    #[builder(default = "32 * 1024 * 1024")]
    pub max_eta_memory: usize,

    /// A refactorization is recommended after this many pivots.
    #[builder(default = "100")]
    pub refactor_interval: usize,

    /// Maximum number of iterations, both phases combined.
    #[builder(default = "1_000_000")]
    pub max_iterations: u64,

    /// Maximum run time in seconds.
    #[builder(default = "f64::INFINITY")]
    pub time_limit: f64,

    /// How entering variables are chosen.
    #[builder(default = "PricingStrategy::Auto")]
    pub pricing: PricingStrategy,

    /// Number of sections for partial pricing, `0` to choose automatically.
    #[builder(default = "0")]
    pub partial_sections: usize,

    /// Maximum number of entering candidates gathered per pricing call.
    #[builder(default = "8")]
    pub candidate_limit: usize,

    /// How the initial basis is constructed.
    #[builder(default = "CrashStrategy::Scored")]
    pub crash: CrashStrategy,

    /// Relative threshold for accepting a pivot during refactorization.
    #[builder(default = "0.1")]
    pub markowitz_threshold: f64,

    /// A refactorization is recommended when the average FTRAN time exceeds its post
    /// refactorization baseline by this factor.
    #[builder(default = "3.0")]
    pub ftran_degradation_factor: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        SolverSettingsBuilder::default()
            .build()
            .expect("default settings pass validation")
    }
}

impl From<SettingsError> for SolverSettingsBuilderError {
    fn from(error: SettingsError) -> Self {
        SolverSettingsBuilderError::ValidationError(error.to_string())
    }
}

fn positive(value: f64, field: &'static str) -> Result<(), SettingsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SettingsError::NotPositive(field))
    }
}

fn check_zero_tolerance(zero_tolerance: f64, pivot_tolerance: f64) -> Result<(), SettingsError> {
    if zero_tolerance <= pivot_tolerance {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange {
            field: "zero_tolerance",
            reason: "may not exceed the pivot tolerance",
        })
    }
}

fn check_infinity(infinity: f64) -> Result<(), SettingsError> {
    // Plain IEEE infinity is allowed, it is only ever compared against.
    if infinity > 1.0 {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange { field: "infinity", reason: "must exceed 1" })
    }
}

fn check_count(value: usize, field: &'static str) -> Result<(), SettingsError> {
    if value > 0 {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange { field, reason: "must be at least 1" })
    }
}

fn check_threshold(threshold: f64) -> Result<(), SettingsError> {
    if threshold > 0.0 && threshold <= 1.0 {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange {
            field: "markowitz_threshold",
            reason: "must lie in (0, 1]",
        })
    }
}

fn check_degradation(factor: f64) -> Result<(), SettingsError> {
    if factor > 1.0 {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange {
            field: "ftran_degradation_factor",
            reason: "must exceed 1",
        })
    }
}

fn check_time_limit(time_limit: f64) -> Result<(), SettingsError> {
    if time_limit > 0.0 {
        Ok(())
    } else {
        Err(SettingsError::NotPositive("time_limit"))
    }
}

impl SolverSettings {
    /// Check that all values can be used by the solver.
    pub fn validate(&self) -> Result<(), SettingsError> {
        positive(self.feasibility_tol, "feasibility_tol")?;
        positive(self.optimality_tol, "optimality_tol")?;
        positive(self.pivot_tolerance, "pivot_tolerance")?;
        positive(self.zero_tolerance, "zero_tolerance")?;
        check_zero_tolerance(self.zero_tolerance, self.pivot_tolerance)?;
        check_infinity(self.infinity)?;
        check_count(self.max_eta_count, "max_eta_count")?;
        check_count(self.max_eta_memory, "max_eta_memory")?;
        check_count(self.refactor_interval, "refactor_interval")?;
        check_count(self.candidate_limit, "candidate_limit")?;
        check_threshold(self.markowitz_threshold)?;
        check_degradation(self.ftran_degradation_factor)?;
        check_time_limit(self.time_limit)?;

        Ok(())
    }

    /// Whether a value should be treated as an absent bound.
    pub fn is_infinite(&self, value: f64) -> bool {
        value.abs() >= self.infinity
    }

    /// Replace a value at or beyond the infinity sentinel by the IEEE infinity of the same sign.
    pub fn to_bound(&self, value: f64) -> f64 {
        if value >= self.infinity {
            f64::INFINITY
        } else if value <= -self.infinity {
            f64::NEG_INFINITY
        } else {
            value
        }
    }
}

impl SolverSettingsBuilder {
    /// Check the fields that were explicitly provided.
    ///
    /// Combinations of fields are checked against the defaults when only one of them was set.
    fn validate(&self) -> Result<(), SettingsError> {
        for (value, field) in [
            (self.feasibility_tol, "feasibility_tol"),
            (self.optimality_tol, "optimality_tol"),
            (self.pivot_tolerance, "pivot_tolerance"),
            (self.zero_tolerance, "zero_tolerance"),
        ] {
            if let Some(value) = value {
                positive(value, field)?;
            }
        }
        check_zero_tolerance(
            self.zero_tolerance.unwrap_or(1e-12),
            self.pivot_tolerance.unwrap_or(1e-10),
        )?;
        if let Some(infinity) = self.infinity {
            check_infinity(infinity)?;
        }
        for (value, field) in [
            (self.max_eta_count, "max_eta_count"),
            (self.max_eta_memory, "max_eta_memory"),
            (self.refactor_interval, "refactor_interval"),
            (self.candidate_limit, "candidate_limit"),
        ] {
            if let Some(value) = value {
                check_count(value, field)?;
            }
        }
        if let Some(threshold) = self.markowitz_threshold {
            check_threshold(threshold)?;
        }
        if let Some(factor) = self.ftran_degradation_factor {
            check_degradation(factor)?;
        }
        if let Some(time_limit) = self.time_limit {
            check_time_limit(time_limit)?;
        }

        Ok(())
    }
}
