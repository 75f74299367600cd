use std::thread;

use approx::assert_abs_diff_eq;

use pfi_simplex::algorithm::two_phase::{SimplexEngine, solve};
use pfi_simplex::algorithm::two_phase::crash::CrashStrategy;
use pfi_simplex::callback::TerminationFlag;
use pfi_simplex::data::linear_algebra::matrix::CscMatrix;
use pfi_simplex::data::linear_program::elements::{ConstraintType, Objective};
use pfi_simplex::data::linear_program::model::LinearProgram;
use pfi_simplex::data::linear_program::solution::SolveStatus;
use pfi_simplex::settings::{SolverSettings, SolverSettingsBuilder};

use super::nonnegative;
use crate::infeasibility;

use ConstraintType::{Equal, Greater, Less};

#[test]
fn two_variables_with_row_bounds() {
    let lp = nonnegative(
        &[vec![1.0, 1.0], vec![1.0, 0.0], vec![0.0, 1.0]],
        &[4.0, 2.0, 3.0],
        &[Less, Less, Less],
        &[-1.0, -1.0],
        Objective::Minimize,
    );
    let solution = solve(&lp, &SolverSettings::default()).unwrap();

    assert_eq!(solution.status, SolveStatus::Optimal);
    assert_abs_diff_eq!(solution.objective_value, -4.0, epsilon = 1e-6);
    assert!(infeasibility(&lp, &solution.x) < 1e-9);
}

#[test]
fn two_variables_with_bounds() {
    // The row bounds of the previous problem as variable bounds
    let lp = LinearProgram::new(
        CscMatrix::from_dense(&[vec![1.0, 1.0]]).unwrap(),
        vec![4.0],
        vec![Less],
        vec![0.0, 0.0],
        vec![2.0, 3.0],
        vec![-1.0, -1.0],
        Objective::Minimize,
    ).unwrap();
    let solution = solve(&lp, &SolverSettings::default()).unwrap();

    assert_eq!(solution.status, SolveStatus::Optimal);
    assert_abs_diff_eq!(solution.objective_value, -4.0, epsilon = 1e-6);
    assert!(infeasibility(&lp, &solution.x) < 1e-9);
}

#[test]
fn upper_bound_sentinel() {
    // min -x s.t. x <= 5, with an upper bound at the infinity sentinel
    let lp = LinearProgram::new(
        CscMatrix::from_dense(&[vec![1.0]]).unwrap(),
        vec![5.0],
        vec![Less],
        vec![0.0],
        vec![1e100],
        vec![-1.0],
        Objective::Minimize,
    ).unwrap();
    let solution = solve(&lp, &SolverSettings::default()).unwrap();

    assert_eq!(solution.status, SolveStatus::Optimal);
    assert_abs_diff_eq!(solution.objective_value, -5.0, epsilon = 1e-6);
}

#[test]
fn maximize() {
    // max 3x + 5y s.t. x <= 4, 2y <= 12, 3x + 2y <= 18
    let lp = nonnegative(
        &[vec![1.0, 0.0], vec![0.0, 2.0], vec![3.0, 2.0]],
        &[4.0, 12.0, 18.0],
        &[Less, Less, Less],
        &[3.0, 5.0],
        Objective::Maximize,
    );
    let solution = solve(&lp, &SolverSettings::default()).unwrap();

    assert_eq!(solution.status, SolveStatus::Optimal);
    assert_abs_diff_eq!(solution.objective_value, 36.0, epsilon = 1e-9);
    assert_abs_diff_eq!(solution.x[0], 2.0, epsilon = 1e-9);
    assert_abs_diff_eq!(solution.x[1], 6.0, epsilon = 1e-9);
    // Shadow prices of the rows
    assert_abs_diff_eq!(solution.pi[0], 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(solution.pi[1], 1.5, epsilon = 1e-9);
    assert_abs_diff_eq!(solution.pi[2], 1.0, epsilon = 1e-9);
}

#[test]
fn diet() {
    let lp = nonnegative(
        &[vec![5.0, 7.0], vec![4.0, 2.0], vec![2.0, 1.0]],
        &[8.0, 15.0, 3.0],
        &[Greater, Greater, Greater],
        &[0.6, 0.35],
        Objective::Minimize,
    );
    let solution = solve(&lp, &SolverSettings::default()).unwrap();

    assert_eq!(solution.status, SolveStatus::Optimal);
    assert_abs_diff_eq!(solution.objective_value, 2.25, epsilon = 1e-9);
    assert!(solution.phase_one_iterations > 0);
    assert!(infeasibility(&lp, &solution.x) < 1e-9);
}

#[test]
fn transportation() {
    // Two suppliers, three customers
    let lp = nonnegative(
        &[
            vec![1.0, 1.0, 1.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
            vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
        ],
        &[20.0, 30.0, 10.0, 25.0, 15.0],
        &[Less, Less, Equal, Equal, Equal],
        &[8.0, 6.0, 10.0, 9.0, 12.0, 13.0],
        Objective::Minimize,
    );

    for crash in [CrashStrategy::Slack, CrashStrategy::Scored] {
        let settings = SolverSettingsBuilder::default().crash(crash).build().unwrap();
        let solution = solve(&lp, &settings).unwrap();

        assert_eq!(solution.status, SolveStatus::Optimal, "{:?}", crash);
        assert_abs_diff_eq!(solution.objective_value, 465.0, epsilon = 1e-9);
        assert!(infeasibility(&lp, &solution.x) < 1e-9);
    }
}

#[test]
fn klee_minty() {
    let lp = nonnegative(
        &[vec![1.0, 0.0, 0.0], vec![20.0, 1.0, 0.0], vec![200.0, 20.0, 1.0]],
        &[1.0, 100.0, 10_000.0],
        &[Less, Less, Less],
        &[100.0, 10.0, 1.0],
        Objective::Maximize,
    );
    let solution = solve(&lp, &SolverSettings::default()).unwrap();

    assert_eq!(solution.status, SolveStatus::Optimal);
    assert_abs_diff_eq!(solution.objective_value, 10_000.0, epsilon = 1e-6);
    assert_abs_diff_eq!(solution.x[2], 10_000.0, epsilon = 1e-6);
}

#[test]
fn free_variable() {
    // min x s.t. x >= -3, x free
    let lp = LinearProgram::new(
        CscMatrix::from_dense(&[vec![1.0]]).unwrap(),
        vec![-3.0],
        vec![Greater],
        vec![f64::NEG_INFINITY],
        vec![f64::INFINITY],
        vec![1.0],
        Objective::Minimize,
    ).unwrap();
    let solution = solve(&lp, &SolverSettings::default()).unwrap();

    assert_eq!(solution.status, SolveStatus::Optimal);
    assert_abs_diff_eq!(solution.objective_value, -3.0, epsilon = 1e-9);
    assert_abs_diff_eq!(solution.x[0], -3.0, epsilon = 1e-9);
}

#[test]
fn infeasible() {
    // x + y <= 1 and x = y + 2 with x >= 2, y in [0, 1]
    let lp = LinearProgram::new(
        CscMatrix::from_dense(&[vec![1.0, 1.0], vec![1.0, -1.0]]).unwrap(),
        vec![1.0, 2.0],
        vec![Less, Equal],
        vec![2.0, 0.0],
        vec![f64::INFINITY, 1.0],
        vec![1.0, 1.0],
        Objective::Minimize,
    ).unwrap();
    let solution = solve(&lp, &SolverSettings::default()).unwrap();
    assert_eq!(solution.status, SolveStatus::Infeasible);
}

#[test]
fn unbounded_maximization() {
    // max x + y s.t. x - y <= 1
    let lp = nonnegative(
        &[vec![1.0, -1.0]],
        &[1.0],
        &[Less],
        &[1.0, 1.0],
        Objective::Maximize,
    );
    let solution = solve(&lp, &SolverSettings::default()).unwrap();
    assert_eq!(solution.status, SolveStatus::Unbounded);
}

#[test]
fn terminated_from_another_thread() {
    let lp = nonnegative(
        &[vec![1.0, 0.0], vec![0.0, 2.0], vec![3.0, 2.0]],
        &[4.0, 12.0, 18.0],
        &[Less, Less, Less],
        &[3.0, 5.0],
        Objective::Maximize,
    );
    let flag = TerminationFlag::new();
    let remote = flag.clone();
    thread::spawn(move || remote.terminate()).join().unwrap();

    let settings = SolverSettings::default();
    let solution = SimplexEngine::new(&lp, &settings)
        .with_termination(flag)
        .solve()
        .unwrap();
    assert_eq!(solution.status, SolveStatus::TimeLimit);
    assert_eq!(solution.x.len(), 2);
}
