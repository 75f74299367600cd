//! # Eta file
//!
//! The basis inverse in product form. Every factor is an identity matrix of which a single column
//! was replaced by a (transformed) column of the constraint matrix:
//!
//! ```text
//! B = E_1 E_2 ... E_k,    B^-1 = E_k^-1 ... E_2^-1 E_1^-1
//! ```
//!
//! All factors share one arena of `(row, value)` pairs, such that clearing the file after a
//! refactorization keeps the allocation around for reuse.
use std::mem::size_of;

use crate::data::linear_algebra::SparseTuple;
use crate::error::SolveError;

/// What created an eta factor.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum EtaKind {
    /// Written while rebuilding the factorization from scratch.
    Refactorization,
    /// Written when a single basis change was accepted.
    PivotUpdate,
}

/// Location of one factor in the arena.
#[derive(Copy, Clone, Debug, PartialEq)]
struct EtaHeader {
    kind: EtaKind,
    pivot_row: usize,
    /// The raw pivot element, not its reciprocal.
    pivot_value: f64,
    start: usize,
    end: usize,
}

/// Borrowed view of a single factor.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EtaFactor<'a> {
    /// What created this factor.
    pub kind: EtaKind,
    /// Row of the identity matrix that was replaced.
    pub pivot_row: usize,
    /// Value of the replaced column at the pivot row.
    pub pivot_value: f64,
    /// All other nonzero values of the replaced column, in no particular order.
    pub entries: &'a [SparseTuple<f64>],
}

impl EtaFactor<'_> {
    /// Column-multiply with the inverse of this factor (from the right, i.e. `E^-1 x`).
    ///
    /// # Arguments
    ///
    /// * `x`: Dense vector of size `m`, overwritten with the result.
    pub fn apply_right(&self, x: &mut [f64]) -> Result<(), SolveError> {
        self.validate(x.len())?;

        let t = x[self.pivot_row] / self.pivot_value;
        x[self.pivot_row] = t;
        if t != 0.0 {
            for &(j, c) in self.entries {
                x[j] -= c * t;
            }
        }

        Ok(())
    }

    /// Row-multiply with the inverse of this factor (from the left, i.e. `y^T E^-1`).
    ///
    /// Only the value at the pivot row changes.
    ///
    /// # Arguments
    ///
    /// * `y`: Dense vector of size `m`, overwritten with the result.
    pub fn apply_left(&self, y: &mut [f64]) -> Result<(), SolveError> {
        self.validate(y.len())?;

        let total = self.entries.iter().map(|&(j, c)| c * y[j]).sum::<f64>();
        y[self.pivot_row] = (y[self.pivot_row] - total) / self.pivot_value;

        Ok(())
    }

    fn validate(&self, m: usize) -> Result<(), SolveError> {
        let invalid = self.pivot_value == 0.0
            || self.pivot_value.is_nan()
            || self.pivot_row >= m
            || self.entries.iter().any(|&(j, _)| j >= m);

        if invalid {
            Err(SolveError::InvalidPivot { row: self.pivot_row, value: self.pivot_value })
        } else {
            Ok(())
        }
    }
}

/// Ordered collection of eta factors, oldest first.
#[derive(Clone, Debug, PartialEq)]
pub struct EtaFile {
    /// Dimension of the basis.
    m: usize,
    headers: Vec<EtaHeader>,
    entries: Vec<SparseTuple<f64>>,
}

impl EtaFile {
    /// Create an empty file, representing the identity matrix.
    pub fn new(m: usize) -> Self {
        Self { m, headers: Vec::new(), entries: Vec::new() }
    }

    /// Append a factor built from a dense transformed column.
    ///
    /// Entries other than the pivot are stored verbatim if their magnitude exceeds
    /// `zero_tolerance`.
    ///
    /// # Arguments
    ///
    /// * `kind`: What created this factor.
    /// * `pivot_row`: Row of the column that becomes the pivot.
    /// * `column`: Dense column `B^-1 a_q` of length `m`.
    /// * `zero_tolerance`: Values not larger than this are dropped.
    ///
    /// # Errors
    ///
    /// `InvalidPivot` if the pivot is zero, NaN or out of range, and `OutOfMemory` if the arena
    /// can't grow. In both cases the file is not modified.
    pub fn push_column(
        &mut self,
        kind: EtaKind,
        pivot_row: usize,
        column: &[f64],
        zero_tolerance: f64,
    ) -> Result<(), SolveError> {
        debug_assert_eq!(column.len(), self.m);

        let pivot_value = column.get(pivot_row).copied().unwrap_or(f64::NAN);
        if pivot_row >= self.m || pivot_value == 0.0 || pivot_value.is_nan() {
            return Err(SolveError::InvalidPivot { row: pivot_row, value: pivot_value });
        }

        self.headers.try_reserve(1)?;
        self.entries.try_reserve(self.m.saturating_sub(1))?;

        let start = self.entries.len();
        self.entries.extend(column.iter().enumerate()
            .filter(|&(i, v)| i != pivot_row && v.abs() > zero_tolerance)
            .map(|(i, &v)| (i, v)));
        let end = self.entries.len();
        self.headers.push(EtaHeader { kind, pivot_row, pivot_value, start, end });

        Ok(())
    }

    /// Apply `B^-1` to a dense column, factors oldest to newest.
    pub fn ftran(&self, x: &mut [f64]) -> Result<(), SolveError> {
        debug_assert_eq!(x.len(), self.m);

        for factor in self.iter() {
            factor.apply_right(x)?;
        }

        Ok(())
    }

    /// Apply `B^-T` to a dense row, factors newest to oldest.
    pub fn btran(&self, y: &mut [f64]) -> Result<(), SolveError> {
        debug_assert_eq!(y.len(), self.m);

        for factor in self.iter().rev() {
            factor.apply_left(y)?;
        }

        Ok(())
    }

    /// Iterate over the factors, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = EtaFactor<'_>> + ExactSizeIterator {
        self.headers.iter().map(move |header| EtaFactor {
            kind: header.kind,
            pivot_row: header.pivot_row,
            pivot_value: header.pivot_value,
            entries: &self.entries[header.start..header.end],
        })
    }

    /// Remove all factors, keeping the allocated memory.
    pub fn clear(&mut self) {
        self.headers.truncate(0);
        self.entries.truncate(0);
    }

    /// Number of factors.
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Whether this file represents the identity.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Number of stored off-diagonal values over all factors.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Bytes in use by the factors.
    pub fn memory(&self) -> usize {
        self.headers.len() * size_of::<EtaHeader>() + self.entries.len() * size_of::<SparseTuple<f64>>()
    }

    /// Dimension of the basis.
    pub fn m(&self) -> usize {
        self.m
    }
}
