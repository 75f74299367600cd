//! # Building blocks to describe linear programs.
use std::ops::Neg;
use std::ops::Not;

use num_traits::One;

/// A `Constraint` is a type of (in)equality.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConstraintType {
    Equal,
    Greater,
    Less,
}

/// Direction of a bound.
///
/// Used to describe which bound a nonbasic variable sits at, or which bound a basic variable
/// runs into during the ratio test.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BoundDirection {
    /// The variable is at, or moves towards, its lower bound.
    Lower,
    /// The variable is at, or moves towards, its upper bound.
    Upper,
}

impl BoundDirection {
    /// Convert a bound direction into a positive or negative one.
    ///
    /// Moving away from a lower bound increases a variable, moving away from an upper bound
    /// decreases it.
    #[must_use]
    pub fn into<F: One + Neg<Output = F>>(self) -> F {
        match self {
            BoundDirection::Lower => F::one(),
            BoundDirection::Upper => -F::one(),
        }
    }
}

impl Not for BoundDirection {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::Lower => Self::Upper,
            Self::Upper => Self::Lower,
        }
    }
}

/// Direction of optimization.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Objective {
    Maximize,
    #[default]
    Minimize,
}

impl Objective {
    /// Factor with which the cost is multiplied to get a minimization problem.
    pub fn sign(self) -> f64 {
        match self {
            Objective::Maximize => -1.0,
            Objective::Minimize => 1.0,
        }
    }
}
