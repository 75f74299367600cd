//! # Algorithms
//!
//! Everything needed to solve a `LinearProgram`: the simplex method itself and the basis
//! representation, pricing and ratio test it is built from.
pub mod two_phase;
