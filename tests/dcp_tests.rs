//! DCP verification through the public API.

use cvxpipe::prelude::*;

#[test]
fn test_atom_curvatures() {
    let x = variable(3);
    let cases: Vec<(&str, Expr, Curvature)> = vec![
        ("sum", sum(&x), Curvature::Affine),
        ("cumsum", cumsum(&x), Curvature::Affine),
        ("norm2", norm2(&x), Curvature::Convex),
        ("abs", abs(&x), Curvature::Convex),
        ("exp", exp(&x), Curvature::Convex),
        ("log", log(&x), Curvature::Concave),
        ("entropy", entropy(&x), Curvature::Concave),
        ("sqrt", sqrt(&x), Curvature::Concave),
        ("square", power(&x, 2.0), Curvature::Convex),
        ("cube", power(&x, 3.0), Curvature::Convex),
        ("inv_pos", inv_pos(&x), Curvature::Convex),
        ("log_sum_exp", log_sum_exp(&x), Curvature::Convex),
        ("neg_norm2", -norm2(&x), Curvature::Concave),
        ("exp_of_affine", exp(&(2.0 * &x + 1.0)), Curvature::Convex),
        ("log_of_concave", log(&sqrt(&x)), Curvature::Concave),
        ("exp_of_concave", exp(&log(&x)), Curvature::Unknown),
        ("convex_minus_convex", norm2(&x) - norm1(&x), Curvature::Unknown),
        ("constant", sum(&constant_vec(vec![1.0, 2.0])), Curvature::Constant),
    ];
    for (name, e, expected) in cases {
        assert_eq!(e.curvature(), expected, "curvature of {}", name);
    }
}

#[test]
fn test_objective_sense() {
    let x = variable(2);
    assert!(Problem::minimize(norm2(&x)).build().is_dcp());
    assert!(!Problem::maximize(log(&x)).build().is_dcp());
    assert!(Problem::maximize(sum(&log(&x))).build().is_dcp());
    assert!(!Problem::minimize(sum(&log(&x))).build().is_dcp());
    assert!(!Problem::maximize(norm2(&x)).build().is_dcp());
}

#[test]
fn test_constraint_rules() {
    let x = variable(2);
    let ok = Problem::minimize(sum(&x))
        .subject_to([norm2(&x).le(1.0), sum(&log(&x)).ge(0.0), x.eq(0.5)])
        .build();
    assert!(ok.is_dcp());

    // convex >= constant and a nonlinear equality
    let bad = Problem::minimize(sum(&x))
        .subject_to([norm2(&x).ge(1.0), sum_squares(&x).eq(1.0)])
        .build();
    let report = bad.report();
    assert!(!report.is_dcp());
    let paths: Vec<&str> = report.violations().iter().map(|v| v.path.as_str()).collect();
    assert!(paths.contains(&"constraint[0]"), "{:?}", paths);
    assert!(paths.contains(&"constraint[1]"), "{:?}", paths);
}

#[test]
fn test_violation_points_at_the_offending_node() {
    let x = variable(2);
    let y = variable(2);
    let problem = Problem::minimize(sum(&exp(&log(&x))))
        .subject_to([(&x * &y).le(1.0)])
        .build();
    let report = problem.report();
    let messages = report.messages();
    assert!(
        messages.iter().any(|m| m.starts_with("objective > sum > arg 0")),
        "{:?}",
        messages
    );
    assert!(
        messages.iter().any(|m| m.contains("product of two non-constant expressions")),
        "{:?}",
        messages
    );
}

#[test]
fn test_not_dcp_error_lists_violations() {
    let x = variable(2);
    let problem = Problem::maximize(norm2(&x))
        .subject_to([norm1(&x).ge(1.0)])
        .build();
    match problem.verify() {
        Err(Error::NotDcp { violations }) => assert_eq!(violations.len(), 2),
        other => panic!("expected NotDcp, got {:?}", other),
    }
}

#[test]
fn test_sign_tracking() {
    let x = variable(2);
    assert_eq!(norm2(&x).sign(), Sign::Nonnegative);
    assert_eq!(exp(&x).sign(), Sign::Nonnegative);
    assert_eq!((-norm2(&x)).sign(), Sign::Nonpositive);
    assert_eq!(sum(&x).sign(), Sign::Unknown);
}

#[test]
fn test_scaling_by_signed_parameter() {
    let x = variable(2);
    let gamma = ParameterBuilder::scalar().nonneg().build().unwrap();
    let free = parameter(());
    assert!(Problem::minimize(&gamma * &norm2(&x)).build().is_dcp());
    assert!(!Problem::minimize(&free * &norm2(&x)).build().is_dcp());
}

#[test]
fn test_quad_form_needs_known_definiteness() {
    let x = variable(2);
    let psd = constant_matrix(vec![2.0, 0.0, 0.0, 1.0], 2, 2);
    let indefinite = constant_matrix(vec![1.0, 0.0, 0.0, -1.0], 2, 2);
    assert!(Problem::minimize(quad_form(&x, &psd)).build().is_dcp());
    assert!(!Problem::minimize(quad_form(&x, &indefinite)).build().is_dcp());
}

#[test]
fn test_shape_errors_are_reported() {
    let x = variable(2);
    let y = variable(3);
    let problem = Problem::minimize(sum(&x)).subject_to([x.leq(&y)]).build();
    assert!(!problem.is_dcp());
}
