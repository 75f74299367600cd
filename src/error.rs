//! # Error reporting
//!
//! Failures of a solve call, as opposed to outcomes of a solve. An infeasible or unbounded
//! problem is not an error: it is reported through the `SolveStatus` of a `Solution`.
use thiserror::Error;

use crate::settings::SettingsError;

/// A `SolveError` is created when a solve can not be carried out, or when a numerical kernel
/// refuses to continue.
///
/// Only `InvalidArgument`, `Settings` and `OutOfMemory` ever leave the engine. The numerical
/// variants are handled internally by refactorizing, and are converted into a `Numeric` status
/// when that doesn't help.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    /// Malformed dimensions, out of range indices or NaN input data.
    ///
    /// Always an integration error; never retried.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// An eta factor with a zero (or NaN) pivot, or with a row index outside of the basis.
    #[error("invalid pivot {value} at row {row}")]
    InvalidPivot {
        /// Row of the offending eta factor.
        row: usize,
        /// The pivot value that was found.
        value: f64,
    },
    /// A pivot update was rejected because the pivot element is too small in magnitude.
    ///
    /// The basis is left unmodified when this is returned.
    #[error("pivot {value} at row {row} is below the pivot tolerance")]
    PivotTooSmall {
        /// Row on which the pivot was attempted.
        row: usize,
        /// The rejected pivot value.
        value: f64,
    },
    /// The eta arena could not grow.
    #[error("out of memory while growing the eta file")]
    OutOfMemory,
    /// The provided settings don't pass validation.
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl SolveError {
    /// Whether a refactorization can be expected to resolve this error.
    pub fn is_numerical(&self) -> bool {
        matches!(self, SolveError::InvalidPivot { .. } | SolveError::PivotTooSmall { .. })
    }
}

impl From<std::collections::TryReserveError> for SolveError {
    fn from(_: std::collections::TryReserveError) -> Self {
        SolveError::OutOfMemory
    }
}
