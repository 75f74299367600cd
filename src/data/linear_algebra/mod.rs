//! # Linear algebra primitives
//!
//! The constraint matrix is stored sparsely, column major. Working vectors of the simplex method
//! are dense slices; the helpers in `vector` combine the two.

pub mod matrix;
pub mod vector;

/// A single value of a sparse vector: its index and the value.
pub type SparseTuple<F> = (usize, F);
