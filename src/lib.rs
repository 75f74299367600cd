//! # A revised simplex solver with a product form of the inverse
//!
//! Linear programs are solved with the bounded primal simplex method in two phases. The basis
//! inverse is represented as a file of eta factors that grows by one factor per basis change and
//! is rebuilt from scratch every now and then. Entering variables are chosen by one of several
//! pricing strategies, leaving variables by Harris' two pass ratio test.
//!
//! The entry point is `algorithm::two_phase::solve`, or `algorithm::two_phase::SimplexEngine` for
//! control over termination, callbacks and warm starts.
#![warn(missing_docs)]

pub mod algorithm;
pub mod callback;
pub mod data;
pub mod error;
pub mod settings;

#[cfg(test)]
mod tests;
