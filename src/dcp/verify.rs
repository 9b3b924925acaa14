//! The DCP verifier.
//!
//! Walks the objective and every constraint and records each sub-expression
//! that breaks the composition rules, together with its position in the
//! problem, e.g. `constraint[1] > norm2 > arg 0`.

use std::fmt;

use super::curvature::{composes, matrix_definiteness, Curvature};
use crate::error::Error;
use crate::expr::Expr;
use crate::problem::{Objective, Problem};

/// One reason a problem is not DCP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DcpViolation {
    /// Location of the offending node.
    pub path: String,
    /// The offending expression, as displayed.
    pub expr: String,
    pub reason: String,
}

impl fmt::Display for DcpViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

/// Outcome of verifying a problem.
#[derive(Debug, Clone, Default)]
pub struct DcpReport {
    violations: Vec<DcpViolation>,
}

impl DcpReport {
    pub fn is_dcp(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[DcpViolation] {
        &self.violations
    }

    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.to_string()).collect()
    }

    /// `Ok` for a DCP problem, `Error::NotDcp` otherwise.
    pub fn into_result(self) -> Result<(), Error> {
        if self.is_dcp() {
            Ok(())
        } else {
            Err(Error::NotDcp {
                violations: self.messages(),
            })
        }
    }

    fn push(&mut self, path: String, e: &Expr, reason: String) {
        self.violations.push(DcpViolation {
            path,
            expr: e.to_string(),
            reason,
        });
    }
}

impl fmt::Display for DcpReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dcp() {
            return write!(f, "problem is DCP");
        }
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", v)?;
        }
        Ok(())
    }
}

/// Check every DCP rule and shape requirement of `problem`.
pub fn verify(problem: &Problem) -> DcpReport {
    let mut report = DcpReport::default();

    let objective = problem.objective.expr();
    match objective.try_shape() {
        Err(e) => report.push("objective".into(), objective, e.to_string()),
        Ok(s) if !s.is_singleton() => report.push(
            "objective".into(),
            objective,
            format!("objective must be scalar, got shape {}", s),
        ),
        Ok(_) => {}
    }
    walk(objective, "objective", &mut report);
    let curvature = objective.curvature();
    match (&problem.objective, curvature) {
        (_, Curvature::Unknown) => {}
        (Objective::Minimize(_), c) if !c.is_convex() => report.push(
            "objective".into(),
            objective,
            format!("cannot minimize {} expression `{}`", c, objective),
        ),
        (Objective::Maximize(_), c) if !c.is_concave() => report.push(
            "objective".into(),
            objective,
            format!("cannot maximize {} expression `{}`", c, objective),
        ),
        _ => {}
    }

    for (i, constraint) in problem.constraints.iter().enumerate() {
        let root = format!("constraint[{}]", i);
        let exprs = constraint.expressions();
        if let Err(e) = constraint.check_shapes() {
            report.push(root.clone(), exprs[0], e.to_string());
        }
        for e in &exprs {
            walk(e, &root, &mut report);
        }
        if let Some(reason) = constraint.curvature_issue() {
            report.push(root, exprs[0], reason);
        }
    }

    report
}

/// Record every node whose curvature is unknown although all of its
/// children have a known curvature: these are where DCP first breaks.
fn walk(e: &Expr, path: &str, report: &mut DcpReport) {
    let children = e.children();
    for (i, child) in children.iter().enumerate() {
        walk(child, &format!("{} > {} > arg {}", path, e.op_name(), i), report);
    }
    if !e.curvature().is_unknown() {
        return;
    }
    if children.iter().any(|c| c.curvature().is_unknown()) {
        return;
    }
    report.push(path.to_string(), e, node_issue(e));
}

fn node_issue(e: &Expr) -> String {
    match e {
        Expr::Mul(a, b) | Expr::MatMul(a, b) => {
            let (ac, bc) = (a.curvature(), b.curvature());
            if !ac.is_constant() && !bc.is_constant() {
                format!("product of two non-constant expressions `{}` and `{}`", a, b)
            } else {
                let (scale, other) = if ac.is_constant() { (a, b) } else { (b, a) };
                format!(
                    "cannot scale {} expression `{}` by `{}`, whose sign is unknown",
                    other.curvature(),
                    other,
                    scale
                )
            }
        }
        Expr::Add(..) => format!("sum of convex and concave terms in `{}`", e),
        Expr::VStack(_) | Expr::HStack(_) => {
            format!("stacks convex and concave expressions in `{}`", e)
        }
        Expr::QuadForm(_, p) if !p.curvature().is_constant() => {
            format!("matrix operand `{}` of quad_form must be constant", p)
        }
        Expr::QuadForm(_, p) if matrix_definiteness(p).is_none() => {
            format!("matrix `{}` of quad_form has no known value", p)
        }
        Expr::Power(_, p) if p.is_nan() => "power exponent is NaN".to_string(),
        _ => match e.atom_curvature() {
            Some(Curvature::Unknown) => format!(
                "`{}` is neither convex nor concave for this matrix",
                e
            ),
            Some(atom) => {
                let culprit = e
                    .children()
                    .into_iter()
                    .enumerate()
                    .find(|(i, c)| !composes(atom, e.monotonicity(*i), c.curvature()));
                match culprit {
                    Some((i, c)) => format!(
                        "{} atom {} is {} in arg {}, which is {} `{}`",
                        atom,
                        e.op_name(),
                        e.monotonicity(i),
                        i,
                        c.curvature(),
                        c
                    ),
                    None => format!("`{}` violates the composition rules", e),
                }
            }
            None => format!("`{}` violates the composition rules", e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::{exp, log, norm2, sum, sum_squares};
    use crate::constraints::ConstraintExt;
    use crate::expr::{constant_matrix, variable, VariableExt};

    #[test]
    fn test_dcp_problem_has_empty_report() {
        let x = variable(3);
        let problem = Problem::minimize(norm2(&x))
            .subject_to([x.ge(1.0)])
            .build();
        let report = verify(&problem);
        assert!(report.is_dcp(), "{}", report);
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_wrong_objective_sense() {
        let x = variable(3);
        let report = verify(&Problem::maximize(norm2(&x)).build());
        assert_eq!(report.violations().len(), 1);
        assert_eq!(report.violations()[0].path, "objective");
        assert!(report.violations()[0]
            .reason
            .starts_with("cannot maximize convex expression"));
    }

    #[test]
    fn test_inner_violation_has_path() {
        let x = variable(2).named("x");
        // norm2 of a concave argument: norm2 is not monotone there
        let bad = norm2(&log(&x));
        let problem = Problem::minimize(sum(&x))
            .subject_to([x.ge(0.0), bad.le(1.0)])
            .build();
        let report = verify(&problem);
        assert_eq!(report.violations().len(), 1, "{}", report);
        let v = &report.violations()[0];
        assert_eq!(v.path, "constraint[1] > add > arg 1 > neg > arg 0");
        assert_eq!(v.expr, "norm2(log(x))");
        assert!(v.reason.contains("convex atom norm2 is non-monotone in arg 0"));
    }

    #[test]
    fn test_product_of_variables() {
        let x = variable(());
        let y = variable(());
        let report = verify(&Problem::minimize(&x * &y).build());
        assert!(report.violations()[0]
            .reason
            .starts_with("product of two non-constant expressions"));
    }

    #[test]
    fn test_indefinite_quad_form() {
        let x = variable(2);
        let p = constant_matrix(vec![1.0, 0.0, 0.0, -1.0], 2, 2);
        let report = verify(&Problem::minimize(crate::atoms::quad_form(&x, &p)).build());
        assert!(!report.is_dcp());
        assert!(report.violations()[0].reason.contains("neither convex nor concave"));
    }

    #[test]
    fn test_shape_mismatch_is_reported() {
        let x = variable(3);
        let y = variable(4);
        let report = verify(&Problem::minimize(sum_squares(&(&x + &y))).build());
        assert!(report.messages()[0].contains("shape mismatch"));
    }

    #[test]
    fn test_nonscalar_objective() {
        let x = variable(3);
        let report = verify(&Problem::minimize(exp(&x)).build());
        assert!(report.messages()[0].contains("objective must be scalar"));
    }
}
