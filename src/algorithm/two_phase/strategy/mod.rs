//! # Strategies
//!
//! Decisions that the simplex method can make in different ways without affecting correctness.
pub mod pivot_rule;
