//! # Tests on small problems that require a look inside the crate.
//!
//! Convention for function names:
//!
//! * `fn linear_program()`
//! * `fn matrix_data_form()`
//! * `fn optimal_basis()`
