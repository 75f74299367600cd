//! # Generated problems
//!
//! Pseudo random problems that are feasible by construction, solved under every combination of
//! pricing strategy, crash basis and refactorization frequency. All of them should agree on the
//! optimal value.
use approx::assert_relative_eq;

use pfi_simplex::algorithm::two_phase::{SimplexEngine, solve};
use pfi_simplex::algorithm::two_phase::crash::CrashStrategy;
use pfi_simplex::algorithm::two_phase::strategy::pivot_rule::PricingStrategy;
use pfi_simplex::data::linear_algebra::matrix::CscMatrix;
use pfi_simplex::data::linear_program::elements::{ConstraintType, Objective};
use pfi_simplex::data::linear_program::model::LinearProgram;
use pfi_simplex::data::linear_program::solution::SolveStatus;
use pfi_simplex::settings::{SolverSettings, SolverSettingsBuilder};

use crate::infeasibility;

/// Linear congruential generator, enough to get the same problem on every run.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 33
    }

    fn below(&mut self, bound: u64) -> u64 {
        self.next() % bound
    }
}

/// A problem with `m` rows and `n` nonnegative columns that the all ones vector satisfies.
///
/// Every fifth column is bounded from above by two and may have a negative cost, all others have
/// a positive cost, so the problem is also bounded.
fn generate(m: usize, n: usize, seed: u64) -> LinearProgram {
    let mut random = Lcg(seed);

    let mut rows = vec![vec![0.0; n]; m];
    for row in &mut rows {
        for value in row.iter_mut() {
            if random.below(100) < 15 {
                *value = random.below(7) as f64 - 3.0;
            }
        }
    }
    for j in 0..n {
        if rows[j % m][j] == 0.0 {
            rows[j % m][j] = 1.0 + random.below(3) as f64;
        }
    }

    let mut rhs = Vec::with_capacity(m);
    let mut constraint_types = Vec::with_capacity(m);
    for row in &rows {
        let activity = row.iter().sum::<f64>();
        let (constraint_type, value) = match random.below(3) {
            0 => (ConstraintType::Less, activity + 1.0 + random.below(5) as f64),
            1 => (ConstraintType::Equal, activity),
            _ => (ConstraintType::Greater, activity - 1.0 - random.below(5) as f64),
        };
        constraint_types.push(constraint_type);
        rhs.push(value);
    }

    let upper = (0..n)
        .map(|j| if j % 5 == 0 { 2.0 } else { f64::INFINITY })
        .collect();
    let cost = (0..n)
        .map(|j| {
            let magnitude = 0.5 + random.below(16) as f64 / 10.0;
            if j % 5 == 0 && random.below(2) == 0 { -magnitude } else { magnitude }
        })
        .collect();

    LinearProgram::new(
        CscMatrix::from_dense(&rows).unwrap(),
        rhs,
        constraint_types,
        vec![0.0; n],
        upper,
        cost,
        Objective::Minimize,
    ).unwrap()
}

fn configurations() -> Vec<SolverSettings> {
    let pricing = [
        PricingStrategy::Dantzig,
        PricingStrategy::Partial,
        PricingStrategy::SteepestEdge,
        PricingStrategy::Devex,
        PricingStrategy::Auto,
    ];
    let crash = [CrashStrategy::Slack, CrashStrategy::Scored];

    let mut configurations = Vec::new();
    for &pricing in &pricing {
        for &crash in &crash {
            for max_eta_count in [200, 5] {
                configurations.push(SolverSettingsBuilder::default()
                    .pricing(pricing)
                    .crash(crash)
                    .max_eta_count(max_eta_count)
                    .partial_sections(4)
                    .build()
                    .unwrap());
            }
        }
    }

    configurations
}

#[test]
fn all_configurations_agree() {
    for seed in [1, 7, 42] {
        let lp = generate(30, 40, seed);
        let reference = solve(&lp, &SolverSettings::default()).unwrap();
        assert_eq!(reference.status, SolveStatus::Optimal, "seed {}", seed);
        assert!(infeasibility(&lp, &reference.x) < 1e-6);

        for settings in configurations() {
            let solution = solve(&lp, &settings).unwrap();
            assert_eq!(solution.status, SolveStatus::Optimal, "seed {}, {:?}", seed, settings);
            assert_relative_eq!(
                solution.objective_value, reference.objective_value,
                epsilon = 1e-6, max_relative = 1e-6,
            );
            assert!(infeasibility(&lp, &solution.x) < 1e-6, "seed {}, {:?}", seed, settings);
        }
    }
}

#[test]
fn frequent_refactorization() {
    let lp = generate(30, 40, 3);
    let settings = SolverSettingsBuilder::default()
        .max_eta_count(2)
        .refactor_interval(2)
        .build()
        .unwrap();

    let solution = solve(&lp, &settings).unwrap();
    let reference = solve(&lp, &SolverSettings::default()).unwrap();

    assert_eq!(solution.status, SolveStatus::Optimal);
    assert!(solution.refactorizations > 1);
    assert_relative_eq!(
        solution.objective_value, reference.objective_value,
        epsilon = 1e-6, max_relative = 1e-6,
    );
}

#[test]
fn warm_start_from_optimal_basis() {
    let lp = generate(20, 25, 11);
    let settings = SolverSettings::default();
    let cold = solve(&lp, &settings).unwrap();
    assert_eq!(cold.status, SolveStatus::Optimal);

    let warm = SimplexEngine::new(&lp, &settings)
        .with_warm_start(cold.basis.clone())
        .solve()
        .unwrap();
    assert_eq!(warm.status, SolveStatus::Optimal);
    assert_eq!(warm.iterations, 0);
    assert_relative_eq!(warm.objective_value, cold.objective_value, epsilon = 1e-9, max_relative = 1e-9);
}

#[test]
fn iteration_limit() {
    let lp = generate(30, 40, 5);
    let settings = SolverSettingsBuilder::default()
        .crash(CrashStrategy::Slack)
        .max_iterations(3)
        .build()
        .unwrap();

    let solution = solve(&lp, &settings).unwrap();
    assert_eq!(solution.status, SolveStatus::IterationLimit);
    assert_eq!(solution.iterations, 3);
    assert_eq!(solution.x.len(), 40);
    assert_eq!(solution.pi.len(), 30);
}
