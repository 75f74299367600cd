//! # Simple matrix data
//!
//! A sparse matrix of constraints, extended with a slack and an artificial variable for every
//! row.
use enum_map::{Enum, EnumMap, enum_map};

use crate::algorithm::two_phase::matrix_provider::column::Column;
use crate::algorithm::two_phase::matrix_provider::MatrixProvider;
use crate::data::linear_algebra::matrix::CscMatrix;
use crate::data::linear_program::elements::ConstraintType;
use crate::data::linear_program::model::LinearProgram;

/// Describes the constraints of a linear program together with the columns that the simplex
/// method adds to it.
///
/// The indexing for the variables and constraints is as follows:
///
/// ```text
/// /               || Vars of which we want a solution | Constraint slacks | Artificials | -----
/// ================||==================================|===================|=============| |   |
/// Any row         ||           coefficients           |         I         |    +/- I    | | b |
/// ---------------------------------------------------------------------------------------  -----
/// ```
///
/// Every row reads `a_i^T x + s_i = b_i`; the type of the row determines the bounds of its slack.
#[derive(Debug, PartialEq)]
pub struct MatrixData<'a> {
    /// Coefficient matrix, without slacks or artificials.
    constraints: &'a CscMatrix,
    /// Constraint values.
    b: &'a [f64],
    constraint_types: &'a [ConstraintType],

    /// Sign of the artificial column of each row, either `1` or `-1`.
    artificial_sign: Vec<f64>,

    /// Indices that separate the different groups.
    column_group_end: EnumMap<ColumnType, usize>,
}

/// Indexing within the different column types (see struct description).
#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum ColumnType {
    /// Variables for which we want a solution.
    Structural,
    /// Slack `s` for an equation like `<a, x> + s = b`.
    ///
    /// Can always be used as part of the initial basis.
    Slack,
    /// Artificial variable, only used to find a first feasible basis.
    Artificial,
}

impl<'a> MatrixData<'a> {
    /// Create a new instance.
    ///
    /// All artificial columns start out as positive unit vectors.
    pub fn new(lp: &'a LinearProgram) -> Self {
        let n = lp.nr_columns();
        let m = lp.nr_rows();

        let sizes = enum_map! {
            ColumnType::Structural => n,
            ColumnType::Slack => m,
            ColumnType::Artificial => m,
        };
        let mut total = 0;
        let column_group_end = sizes.map(|_, size| {
            total += size;
            total
        });

        Self {
            constraints: lp.constraints(),
            b: lp.rhs(),
            constraint_types: lp.constraint_types(),
            artificial_sign: vec![1.0; m],
            column_group_end,
        }
    }

    /// Kind of variable at index `j`.
    pub fn column_type(&self, j: usize) -> ColumnType {
        debug_assert!(j < self.column_group_end[ColumnType::Artificial]);

        if j < self.column_group_end[ColumnType::Structural] {
            ColumnType::Structural
        } else if j < self.column_group_end[ColumnType::Slack] {
            ColumnType::Slack
        } else {
            ColumnType::Artificial
        }
    }

    /// First index of a group of variables.
    pub fn group_start(&self, column_type: ColumnType) -> usize {
        match column_type {
            ColumnType::Structural => 0,
            ColumnType::Slack => self.column_group_end[ColumnType::Structural],
            ColumnType::Artificial => self.column_group_end[ColumnType::Slack],
        }
    }

    /// One past the last index of a group of variables.
    pub fn group_end(&self, column_type: ColumnType) -> usize {
        self.column_group_end[column_type]
    }

    /// Row that a slack or artificial variable belongs to.
    pub fn row_of(&self, j: usize) -> Option<usize> {
        match self.column_type(j) {
            ColumnType::Structural => None,
            column_type => Some(j - self.group_start(column_type)),
        }
    }

    /// Index of the slack variable of row `i`.
    pub fn slack(&self, i: usize) -> usize {
        debug_assert!(i < self.nr_rows());

        self.group_start(ColumnType::Slack) + i
    }

    /// Index of the artificial variable of row `i`.
    pub fn artificial(&self, i: usize) -> usize {
        debug_assert!(i < self.nr_rows());

        self.group_start(ColumnType::Artificial) + i
    }

    /// Choose whether the artificial of row `i` has column `e_i` or `-e_i`.
    pub fn set_artificial_sign(&mut self, i: usize, negative: bool) {
        self.artificial_sign[i] = if negative { -1.0 } else { 1.0 };
    }

    /// The constraint values.
    pub fn b(&self) -> &[f64] {
        self.b
    }

    /// Type of each row.
    pub fn constraint_types(&self) -> &[ConstraintType] {
        self.constraint_types
    }

    /// The coefficient matrix of the structural variables.
    pub fn constraints(&self) -> &CscMatrix {
        self.constraints
    }

    /// Number of structural variables.
    pub fn nr_structural(&self) -> usize {
        self.column_group_end[ColumnType::Structural]
    }
}

impl MatrixProvider for MatrixData<'_> {
    fn nr_rows(&self) -> usize {
        self.b.len()
    }

    fn nr_columns(&self) -> usize {
        self.column_group_end[ColumnType::Artificial]
    }

    fn column(&self, j: usize) -> Column<'_> {
        match self.column_type(j) {
            ColumnType::Structural => Column::Sparse(self.constraints.column(j)),
            ColumnType::Slack => Column::unit(j - self.group_start(ColumnType::Slack), 1.0),
            ColumnType::Artificial => {
                let i = j - self.group_start(ColumnType::Artificial);
                Column::unit(i, self.artificial_sign[i])
            },
        }
    }

    fn unit_row(&self, j: usize) -> Option<usize> {
        match self.column_type(j) {
            ColumnType::Structural => None,
            ColumnType::Slack => Some(j - self.group_start(ColumnType::Slack)),
            ColumnType::Artificial => {
                let i = j - self.group_start(ColumnType::Artificial);
                (self.artificial_sign[i] > 0.0).then_some(i)
            },
        }
    }

    fn unit_column_of_row(&self, i: usize) -> usize {
        self.slack(i)
    }
}
