//! # Representing linear programs
//!
//! The model that is handed to the solver, the building blocks used to describe it and the
//! solution that is handed back.
pub mod elements;
pub mod model;
pub mod solution;
