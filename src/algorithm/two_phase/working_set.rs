//! # Working set
//!
//! Dense arrays over all variables, structural, slack and artificial, that the simplex method
//! reads and updates every iteration: bounds, the cost of the current phase, primal values,
//! reduced costs and the dual values of the rows.
use crate::algorithm::two_phase::basis::{BasisState, VariableStatus};
use crate::algorithm::two_phase::matrix_provider::matrix_data::{ColumnType, MatrixData};
use crate::algorithm::two_phase::matrix_provider::MatrixProvider;
use crate::data::linear_algebra::SparseTuple;
use crate::data::linear_algebra::vector::inner_product;
use crate::data::linear_program::elements::ConstraintType;
use crate::data::linear_program::model::LinearProgram;
use crate::error::SolveError;
use crate::settings::SolverSettings;

/// Values of all variables of a linear program that is being solved.
///
/// Absent bounds are stored as IEEE infinities, such that they can be compared against but never
/// take part in arithmetic unnoticed.
#[derive(Debug)]
pub struct SolverWorkingSet<'a> {
    data: MatrixData<'a>,

    lower: Vec<f64>,
    upper: Vec<f64>,
    /// Cost of the original problem, as a minimization problem.
    objective_cost: Vec<f64>,
    /// Cost of the current phase.
    cost: Vec<f64>,

    /// Primal value of each variable.
    x: Vec<f64>,
    /// Reduced cost of each variable, zero for basic variables.
    reduced_costs: Vec<f64>,
    /// Dual value of each row.
    pi: Vec<f64>,

    zero_tolerance: f64,
}

impl<'a> SolverWorkingSet<'a> {
    /// Create a new instance.
    ///
    /// Slack bounds follow from the row types; artificial variables are fixed at zero until they
    /// are needed.
    pub fn new(lp: &'a LinearProgram, settings: &SolverSettings) -> Self {
        let data = MatrixData::new(lp);
        let total = data.nr_columns();
        let sign = lp.objective().sign();

        let mut lower = Vec::with_capacity(total);
        let mut upper = Vec::with_capacity(total);
        for (&l, &u) in lp.lower().iter().zip(lp.upper()) {
            lower.push(settings.to_bound(l));
            upper.push(settings.to_bound(u));
        }
        for constraint_type in lp.constraint_types() {
            let (l, u) = match constraint_type {
                ConstraintType::Less => (0.0, f64::INFINITY),
                ConstraintType::Greater => (f64::NEG_INFINITY, 0.0),
                ConstraintType::Equal => (0.0, 0.0),
            };
            lower.push(l);
            upper.push(u);
        }
        lower.resize(total, 0.0);
        upper.resize(total, 0.0);

        let mut objective_cost = lp.cost().iter().map(|&c| sign * c).collect::<Vec<_>>();
        objective_cost.resize(total, 0.0);

        Self {
            data,
            lower,
            upper,
            cost: objective_cost.clone(),
            objective_cost,
            x: vec![0.0; total],
            reduced_costs: vec![0.0; total],
            pi: vec![0.0; lp.nr_rows()],
            zero_tolerance: settings.zero_tolerance,
        }
    }

    /// A structural variable whose lower bound exceeds its upper bound, or that has no finite
    /// value within its bounds.
    pub fn inverted_bounds(&self, tolerance: f64) -> Option<usize> {
        (0..self.data.nr_structural()).find(|&j| {
            self.lower[j] > self.upper[j] + tolerance
                || self.lower[j] == f64::INFINITY
                || self.upper[j] == f64::NEG_INFINITY
        })
    }

    /// Most natural nonbasic status: at the finite bound closest to zero, or free.
    pub fn default_status(&self, j: usize) -> VariableStatus {
        self.nearest_status(j, 0.0)
    }

    /// Nonbasic status at the finite bound closest to `value`, or free without bounds.
    pub fn nearest_status(&self, j: usize, value: f64) -> VariableStatus {
        match (self.lower[j].is_finite(), self.upper[j].is_finite()) {
            (true, true) if (self.upper[j] - value).abs() < (value - self.lower[j]).abs() => {
                VariableStatus::AtUpper
            },
            (true, _) => VariableStatus::AtLower,
            (false, true) => VariableStatus::AtUpper,
            (false, false) => VariableStatus::Free,
        }
    }

    /// Whether a nonbasic status makes sense given the bounds of a variable.
    pub fn is_valid_status(&self, j: usize, status: VariableStatus) -> bool {
        match status {
            VariableStatus::Basic(_) => true,
            VariableStatus::AtLower => self.lower[j].is_finite(),
            VariableStatus::AtUpper => self.upper[j].is_finite(),
            VariableStatus::Free => !self.lower[j].is_finite() && !self.upper[j].is_finite(),
        }
    }

    /// Value of a nonbasic variable with the given status.
    pub fn nonbasic_value(&self, j: usize, status: VariableStatus) -> f64 {
        match status {
            VariableStatus::AtLower if self.lower[j].is_finite() => self.lower[j],
            VariableStatus::AtUpper if self.upper[j].is_finite() => self.upper[j],
            VariableStatus::Basic(_) => self.x[j],
            _ => 0.0,
        }
    }

    /// Compute all primal values from scratch.
    ///
    /// Nonbasic variables are put at the value their status indicates, after which
    /// `x_B = B^-1 (b - N x_N)`.
    pub fn compute_primal(&mut self, basis: &BasisState) -> Result<(), SolveError> {
        let mut rhs = self.data.b().to_vec();
        for j in 0..self.x.len() {
            let status = basis.status(j);
            if !status.is_basic() {
                let value = self.nonbasic_value(j, status);
                self.x[j] = value;
                if value != 0.0 {
                    for (i, coefficient) in self.data.column(j) {
                        rhs[i] -= coefficient * value;
                    }
                }
            }
        }

        basis.ftran(&mut rhs)?;
        for (&j, value) in basis.basic_vars().iter().zip(rhs) {
            self.x[j] = value;
        }

        Ok(())
    }

    /// Compute the dual values `pi = B^-T c_B` and all reduced costs from scratch.
    pub fn compute_duals(&mut self, basis: &BasisState) -> Result<(), SolveError> {
        for (pi, &j) in self.pi.iter_mut().zip(basis.basic_vars()) {
            *pi = self.cost[j];
        }
        basis.btran(&mut self.pi)?;

        for j in 0..self.reduced_costs.len() {
            self.reduced_costs[j] = if basis.status(j).is_basic() {
                0.0
            } else {
                self.cost[j] - inner_product(&self.pi, self.data.column(j))
            };
        }

        Ok(())
    }

    /// Row `r` of `B^-1 A`, restricted to the nonbasic variables.
    ///
    /// # Return value
    ///
    /// Values `(j, e_r^T B^-1 a_j)` that are not negligible.
    pub fn pivot_row(&self, basis: &BasisState, r: usize) -> Result<Vec<SparseTuple<f64>>, SolveError> {
        let rho = basis.btran_unit(r)?;

        Ok((0..self.x.len())
            .filter(|&j| !basis.status(j).is_basic())
            .map(|j| (j, inner_product(&rho, self.data.column(j))))
            .filter(|&(_, alpha)| alpha.abs() > self.zero_tolerance)
            .collect())
    }

    /// Move along an edge.
    ///
    /// # Arguments
    ///
    /// * `basis`: Current basis, before any change.
    /// * `direction`: Signed entering column; basic variable `i` decreases by `direction[i]` per
    /// unit step.
    /// * `step`: Length of the step.
    /// * `entering`: The nonbasic variable that moves.
    /// * `sign`: `1` if the entering variable increases, `-1` if it decreases.
    pub fn apply_step(
        &mut self,
        basis: &BasisState,
        direction: &[f64],
        step: f64,
        entering: usize,
        sign: f64,
    ) {
        debug_assert!(step >= 0.0);

        if step != 0.0 {
            for (&j, &d) in basis.basic_vars().iter().zip(direction) {
                self.x[j] -= step * d;
            }
            self.x[entering] += sign * step;
        }
    }

    /// Update all reduced costs for a basis change.
    ///
    /// # Arguments
    ///
    /// * `entering`: Variable entering the basis.
    /// * `leaving`: Variable leaving the basis.
    /// * `row`: Pivot row, see `pivot_row`.
    /// * `pivot`: Value of the entering column at the pivot row.
    pub fn update_reduced_costs(
        &mut self,
        entering: usize,
        leaving: usize,
        row: &[SparseTuple<f64>],
        pivot: f64,
    ) {
        let ratio = self.reduced_costs[entering] / pivot;
        for &(j, alpha) in row {
            self.reduced_costs[j] -= ratio * alpha;
        }
        self.reduced_costs[entering] = 0.0;
        self.reduced_costs[leaving] = -ratio;
    }

    /// Largest bound violation over all variables.
    pub fn primal_infeasibility(&self) -> f64 {
        self.x.iter().zip(&self.lower).zip(&self.upper)
            .map(|((&x, &l), &u)| f64::max(l - x, x - u))
            .fold(0.0, f64::max)
    }

    /// Whether all variables are within their bounds, up to a tolerance.
    pub fn is_primal_feasible(&self, tolerance: f64) -> bool {
        self.primal_infeasibility() <= tolerance
    }

    /// Objective value `c^T x` under the cost of the current phase.
    pub fn objective(&self) -> f64 {
        inner_product(&self.x, self.cost.iter().copied().enumerate())
    }

    /// Objective value under the cost of the original problem, as a minimization problem.
    pub fn original_objective(&self) -> f64 {
        inner_product(&self.x, self.objective_cost.iter().copied().enumerate())
    }

    /// Minimize the sum of the given artificial variables.
    pub fn use_phase_one_cost(&mut self, artificials: &[usize]) {
        self.cost.fill(0.0);
        for &j in artificials {
            debug_assert_eq!(self.data.column_type(j), ColumnType::Artificial);
            self.cost[j] = 1.0;
        }
    }

    /// Minimize the original objective.
    pub fn use_phase_two_cost(&mut self) {
        self.cost.copy_from_slice(&self.objective_cost);
    }

    /// Change the bounds of a variable.
    pub fn set_bounds(&mut self, j: usize, lower: f64, upper: f64) {
        debug_assert!(lower <= upper);

        self.lower[j] = lower;
        self.upper[j] = upper;
    }

    /// Overwrite the value of a variable.
    pub fn set_value(&mut self, j: usize, value: f64) {
        self.x[j] = value;
    }

    /// Whether a variable has equal bounds.
    pub fn is_fixed(&self, j: usize) -> bool {
        self.lower[j] == self.upper[j]
    }

    /// Source of the columns.
    pub fn data(&self) -> &MatrixData<'a> {
        &self.data
    }

    /// Source of the columns, for changing the artificial columns.
    pub fn data_mut(&mut self) -> &mut MatrixData<'a> {
        &mut self.data
    }

    /// Value of variable `j`.
    pub fn value(&self, j: usize) -> f64 {
        self.x[j]
    }

    /// Values of all variables.
    pub fn values(&self) -> &[f64] {
        &self.x
    }

    /// Lower bound of variable `j`, `-inf` if absent.
    pub fn lower(&self, j: usize) -> f64 {
        self.lower[j]
    }

    /// Upper bound of variable `j`, `inf` if absent.
    pub fn upper(&self, j: usize) -> f64 {
        self.upper[j]
    }

    /// Cost of variable `j` in the current phase.
    pub fn cost(&self, j: usize) -> f64 {
        self.cost[j]
    }

    /// Cost of variable `j` in the original problem, as a minimization problem.
    pub fn objective_cost(&self, j: usize) -> f64 {
        self.objective_cost[j]
    }

    /// Reduced costs of all variables.
    pub fn reduced_costs(&self) -> &[f64] {
        &self.reduced_costs
    }

    /// Dual values of all rows, as computed by the last `compute_duals`.
    pub fn pi(&self) -> &[f64] {
        &self.pi
    }

    /// Number of rows.
    pub fn nr_rows(&self) -> usize {
        self.pi.len()
    }

    /// Number of variables, including slacks and artificials.
    pub fn nr_variables(&self) -> usize {
        self.x.len()
    }
}
