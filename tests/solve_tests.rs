//! End-to-end solve tests.
//!
//! Test cases are defined as data and run programmatically: each case
//! builds a problem and states its optimal value.

use cvxpipe::prelude::*;
use float_eq::assert_float_eq;

/// Relative tolerance for comparing optimal values.
const TOL: f64 = 1e-4;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A test case definition
struct TestCase {
    name: &'static str,
    /// Builds the problem and returns (problem, expected_value)
    build: fn() -> (Problem, f64),
}

fn minimize_test_cases() -> Vec<TestCase> {
    vec![
        // ========== Linear Programs ==========
        TestCase {
            name: "sum_lower_bound",
            build: || {
                // x = [1,1,1,1,1]
                let x = variable(5);
                let prob = Problem::minimize(sum(&x)).subject_to([x.ge(1.0)]).build();
                (prob, 5.0)
            },
        },
        TestCase {
            name: "sum_equality",
            build: || {
                let x = variable(3);
                let prob = Problem::minimize(sum(&x))
                    .subject_to([x.equals(&constant(2.0))])
                    .build();
                (prob, 6.0)
            },
        },
        TestCase {
            name: "negated_sum_upper_bound",
            build: || {
                let x = variable(4);
                let prob = Problem::minimize(-sum(&x)).subject_to([x.le(3.0)]).build();
                (prob, -12.0)
            },
        },
        TestCase {
            name: "weighted_dot",
            build: || {
                // minimize [1,2,3]·x s.t. x >= 1
                let x = variable(3);
                let w = constant_vec(vec![1.0, 2.0, 3.0]);
                let prob = Problem::minimize(dot(&w, &x)).subject_to([x.ge(1.0)]).build();
                (prob, 6.0)
            },
        },
        TestCase {
            name: "norm1_budget",
            build: || {
                let x = variable(3);
                let prob = Problem::minimize(norm1(&x))
                    .subject_to([sum(&x).eq(3.0)])
                    .build();
                (prob, 3.0)
            },
        },
        TestCase {
            name: "norm_inf_budget",
            build: || {
                // spread evenly: x = [2,2,2]
                let x = variable(3);
                let prob = Problem::minimize(norm_inf(&x))
                    .subject_to([sum(&x).eq(6.0)])
                    .build();
                (prob, 2.0)
            },
        },
        TestCase {
            name: "abs_deviation",
            build: || {
                // x1 = 1 matches, x2 >= 0 is 2 away from -2
                let x = variable(2);
                let b = constant_vec(vec![1.0, -2.0]);
                let prob = Problem::minimize(sum(&abs(&(&x - &b))))
                    .subject_to([x.ge(0.0)])
                    .build();
                (prob, 2.0)
            },
        },
        TestCase {
            name: "max_of_affine",
            build: || {
                // max(x, 2 - x) is smallest at x = 1
                let x = variable(());
                let prob = Problem::minimize(maximum(vec![x.clone(), 2.0 - &x])).build();
                (prob, 1.0)
            },
        },
        TestCase {
            name: "hinge",
            build: || {
                let x = variable(());
                let prob = Problem::minimize(pos(&(&x - 1.0)))
                    .subject_to([x.ge(3.0)])
                    .build();
                (prob, 2.0)
            },
        },
        TestCase {
            name: "neg_part",
            build: || {
                let x = variable(());
                let prob = Problem::minimize(neg_part(&x)).subject_to([x.le(-2.0)]).build();
                (prob, 2.0)
            },
        },
        // ========== Quadratic Programs ==========
        TestCase {
            name: "least_squares_clipped",
            build: || {
                // x = [1,1,1]; residual [0,1,2]
                let x = variable(3);
                let b = constant_vec(vec![1.0, 2.0, 3.0]);
                let prob = Problem::minimize(sum_squares(&(&x - &b)))
                    .subject_to([x.le(1.0)])
                    .build();
                (prob, 5.0)
            },
        },
        TestCase {
            name: "least_squares_matmul",
            build: || {
                // consistent system, x = [1,2]
                let a = constant_matrix(vec![1.0, 0.0, 1.0, 0.0, 1.0, 1.0], 3, 2);
                let b = constant_vec(vec![1.0, 2.0, 3.0]);
                let x = variable(2);
                let prob = Problem::minimize(sum_squares(&(&matmul(&a, &x) - &b))).build();
                (prob, 0.0)
            },
        },
        TestCase {
            name: "quad_form_psd",
            build: || {
                // 2(x1² + x2²) with x1 + x2 = 2
                let x = variable(2);
                let p = constant_matrix(vec![2.0, 0.0, 0.0, 2.0], 2, 2);
                let prob = Problem::minimize(quad_form(&x, &p))
                    .subject_to([sum(&x).eq(2.0)])
                    .build();
                (prob, 4.0)
            },
        },
        TestCase {
            name: "square_plus_linear",
            build: || {
                // x² - 2x + 3 is smallest at x = 1
                let x = variable(());
                let prob = Problem::minimize(power(&x, 2.0) - 2.0 * &x + 3.0).build();
                (prob, 2.0)
            },
        },
        // ========== Second-order cone ==========
        TestCase {
            name: "norm2_budget",
            build: || {
                let x = variable(4);
                let prob = Problem::minimize(norm2(&x))
                    .subject_to([sum(&x).eq(4.0)])
                    .build();
                (prob, 2.0)
            },
        },
        TestCase {
            name: "quad_over_lin",
            build: || {
                let x = variable(());
                let y = variable(());
                let prob = Problem::minimize(quad_over_lin(&x, &y))
                    .subject_to([x.eq(2.0), y.le(4.0)])
                    .build();
                (prob, 1.0)
            },
        },
        TestCase {
            name: "sum_squares_in_constraint",
            build: || {
                // maximize the sum inside the ball of radius sqrt(2)
                let x = variable(2);
                let prob = Problem::minimize(-sum(&x))
                    .subject_to([sum_squares(&x).le(2.0)])
                    .build();
                (prob, -2.0)
            },
        },
        // ========== Exponential cone ==========
        TestCase {
            name: "exp_lower_bound",
            build: || {
                let x = variable(());
                let prob = Problem::minimize(exp(&x)).subject_to([x.ge(1.0)]).build();
                (prob, std::f64::consts::E)
            },
        },
        TestCase {
            name: "log_sum_exp_at_origin",
            build: || {
                let x = variable(2);
                let prob = Problem::minimize(log_sum_exp(&x))
                    .subject_to([x.ge(0.0)])
                    .build();
                (prob, 2.0_f64.ln())
            },
        },
        TestCase {
            name: "logistic_at_origin",
            build: || {
                let x = variable(());
                let prob = Problem::minimize(logistic(&x)).subject_to([x.ge(0.0)]).build();
                (prob, 2.0_f64.ln())
            },
        },
        // ========== Power cone ==========
        TestCase {
            name: "cube",
            build: || {
                let x = variable(());
                let prob = Problem::minimize(power(&x, 3.0)).subject_to([x.ge(2.0)]).build();
                (prob, 8.0)
            },
        },
        TestCase {
            name: "inv_pos",
            build: || {
                let x = variable(());
                let prob = Problem::minimize(inv_pos(&x)).subject_to([x.le(2.0)]).build();
                (prob, 0.5)
            },
        },
    ]
}

fn maximize_test_cases() -> Vec<TestCase> {
    vec![
        TestCase {
            name: "log_upper_bound",
            build: || {
                let x = variable(());
                let prob = Problem::maximize(log(&x)).subject_to([x.le(2.0)]).build();
                (prob, 2.0_f64.ln())
            },
        },
        TestCase {
            name: "sqrt_upper_bound",
            build: || {
                let x = variable(());
                let prob = Problem::maximize(sqrt(&x)).subject_to([x.le(4.0)]).build();
                (prob, 2.0)
            },
        },
        TestCase {
            name: "entropy_on_simplex",
            build: || {
                let x = variable(2);
                let prob = Problem::maximize(sum(&entropy(&x)))
                    .subject_to([sum(&x).eq(1.0)])
                    .build();
                (prob, 2.0_f64.ln())
            },
        },
        TestCase {
            name: "min_of_affine",
            build: || {
                let x = variable(());
                let prob = Problem::maximize(minimum(vec![x.clone(), 4.0 - &x])).build();
                (prob, 2.0)
            },
        },
        TestCase {
            name: "negated_sum_squares",
            build: || {
                let x = variable(2);
                let prob = Problem::maximize(-sum_squares(&x))
                    .subject_to([sum(&x).eq(2.0)])
                    .build();
                (prob, -2.0)
            },
        },
    ]
}

fn infeasible_test_cases() -> Vec<(&'static str, Problem)> {
    let x = variable(());
    let y = variable(3);
    vec![
        (
            "crossed_bounds",
            Problem::minimize(x.clone())
                .subject_to([x.ge(2.0), x.le(1.0)])
                .build(),
        ),
        (
            "budget_below_floor",
            Problem::minimize(sum(&y))
                .subject_to([sum(&y).eq(1.0), y.ge(1.0)])
                .build(),
        ),
    ]
}

fn unbounded_test_cases() -> Vec<(&'static str, Problem, f64)> {
    let x = variable(3);
    let t = variable(());
    vec![
        (
            "sum_no_floor",
            Problem::minimize(sum(&x)).subject_to([x.le(1.0)]).build(),
            f64::NEG_INFINITY,
        ),
        (
            "maximize_no_ceiling",
            Problem::maximize(t.clone()).subject_to([t.ge(0.0)]).build(),
            f64::INFINITY,
        ),
    ]
}

fn check_optimal(case: &TestCase) {
    let (prob, expected) = (case.build)();
    assert!(prob.is_dcp(), "Problem '{}' should be DCP", case.name);

    let solution = match prob.solve() {
        Ok(s) => s,
        Err(e) => panic!("Problem '{}' should solve: {}", case.name, e),
    };
    assert_eq!(
        solution.status,
        SolveStatus::Optimal,
        "Problem '{}' should be optimal",
        case.name
    );

    let value = solution.value.expect("should have value");
    assert_float_eq!(
        value,
        expected,
        abs <= TOL * (1.0 + expected.abs()),
        "Problem '{}'",
        case.name
    );
}

#[test]
fn test_minimize_cases() {
    init();
    for case in minimize_test_cases() {
        check_optimal(&case);
    }
}

#[test]
fn test_maximize_cases() {
    init();
    for case in maximize_test_cases() {
        check_optimal(&case);
    }
}

#[test]
fn test_infeasible_is_status() {
    init();
    for (name, prob) in infeasible_test_cases() {
        let solution = prob.solve().expect("infeasibility is not an error");
        assert_eq!(
            solution.status,
            SolveStatus::Infeasible,
            "Problem '{}' should be infeasible",
            name
        );
        assert_eq!(solution.value, Some(f64::INFINITY));
    }
}

#[test]
fn test_unbounded_is_status() {
    init();
    for (name, prob, value) in unbounded_test_cases() {
        let solution = prob.solve().expect("unboundedness is not an error");
        assert_eq!(
            solution.status,
            SolveStatus::Unbounded,
            "Problem '{}' should be unbounded",
            name
        );
        assert_eq!(solution.value, Some(value));
    }
}

#[test]
fn test_primal_values() {
    init();
    let x = named_variable("x", 2);
    let b = constant_vec(vec![1.0, 2.0]);
    let solution = Problem::minimize(sum_squares(&(&x - &b)))
        .subject_to([x.le(1.5)])
        .solve()
        .unwrap();

    let v = &solution[&x];
    assert_eq!(v.shape(), (2, 1));
    assert_float_eq!(v[(0, 0)], 1.0, abs <= 1e-4);
    assert_float_eq!(v[(1, 0)], 1.5, abs <= 1e-4);
    assert_eq!(solution.by_name("x"), Some(v));
}

#[test]
fn test_matrix_variable_shape() {
    init();
    let x = variable((2, 3));
    let solution = Problem::minimize(sum(&x))
        .subject_to([x.ge(1.0)])
        .solve()
        .unwrap();
    assert_eq!(solution[&x].shape(), (2, 3));
    assert_float_eq!(solution.value.unwrap(), 6.0, abs <= 1e-4);
}

#[test]
fn test_lp_duals() {
    init();
    // minimize x s.t. x >= 1: the bound's multiplier is 1
    let x = variable(());
    let solution = Problem::minimize(x.clone())
        .subject_to([x.ge(1.0), (&x * 2.0).le(10.0)])
        .solve()
        .unwrap();
    assert!(solution.has_duals());
    assert_float_eq!(solution.constraint_dual(0).unwrap()[0], 1.0, abs <= 1e-4);
    assert_float_eq!(solution.constraint_dual(1).unwrap()[0], 0.0, abs <= 1e-4);
}

#[test]
fn test_equality_dual_has_constraint_length() {
    init();
    let x = variable(3);
    let solution = Problem::minimize(sum_squares(&x))
        .subject_to([x.eq(1.0)])
        .solve()
        .unwrap();
    assert_eq!(solution.constraint_dual(0).unwrap().len(), 3);
}

#[test]
fn test_variable_sign_attribute() {
    init();
    let x = nonneg_variable(3);
    let solution = Problem::minimize(sum(&x)).solve().unwrap();
    assert_float_eq!(solution.value.unwrap(), 0.0, abs <= 1e-6);
}

#[test]
fn test_stats_are_filled() {
    init();
    let x = variable(3);
    let solution = Problem::minimize(norm2(&x))
        .subject_to([sum(&x).eq(3.0)])
        .solve()
        .unwrap();
    assert_eq!(solution.stats.solver, "clarabel");
    assert!(solution.stats.iterations > 0);
    assert_eq!(solution.stats.num_variables, 4);
    assert_eq!(solution.stats.num_constraints, 5);
    assert!(solution.stats.timings.total() >= solution.stats.timings.solve);
}

#[test]
fn test_iteration_limit_is_a_status() {
    init();
    let x = variable(10);
    let solution = Problem::minimize(norm2(&x))
        .subject_to([sum(&x).eq(10.0)])
        .solve_with(Settings::default().max_iter(1))
        .unwrap();
    assert_eq!(solution.status, SolveStatus::UserLimit);
}

#[test]
fn test_not_dcp_is_error() {
    let x = variable(3);
    let result = Problem::maximize(norm2(&x)).subject_to([x.le(1.0)]).solve();
    assert!(matches!(result, Err(Error::NotDcp { .. })));
}

#[test]
fn test_constant_cone_constraints_without_variables() {
    init();
    let violated = Problem::minimize(constant(0.0))
        .subject_to([Constraint::soc(constant(1.0), constant_vec(vec![3.0, 4.0]))])
        .solve()
        .unwrap();
    assert_eq!(violated.status, SolveStatus::Infeasible);

    let satisfied = Problem::minimize(constant(0.0))
        .subject_to([Constraint::soc(constant(5.0), constant_vec(vec![3.0, 4.0]))])
        .solve()
        .unwrap();
    assert_eq!(satisfied.status, SolveStatus::Optimal);
    assert_float_eq!(satisfied.value.unwrap(), 0.0, abs <= 1e-9);
}
