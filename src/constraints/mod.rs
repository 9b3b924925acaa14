//! Constraints.
//!
//! Every constraint is stored in a normalized form over a single expression:
//! `Zero(e)` means `e == 0`, `NonNeg(e)` means `e >= 0`, `Soc { t, x }` means
//! `norm2(x) <= t` and `Psd(e)` means the symmetric part of `e` is positive
//! semidefinite.

use std::fmt;
use std::sync::Arc;

use crate::dcp::Curvature;
use crate::error::{Error, Result};
use crate::expr::{Expr, ExprId};

#[derive(Debug, Clone)]
pub enum Constraint {
    Zero(Arc<Expr>),
    NonNeg(Arc<Expr>),
    Soc { t: Arc<Expr>, x: Arc<Expr> },
    Psd(Arc<Expr>),
}

fn difference(lhs: Expr, rhs: Expr) -> Arc<Expr> {
    Arc::new(Expr::Add(Arc::new(lhs), Arc::new(Expr::Neg(Arc::new(rhs)))))
}

impl Constraint {
    /// `lhs == rhs`.
    pub fn eq(lhs: Expr, rhs: Expr) -> Self {
        Constraint::Zero(difference(lhs, rhs))
    }

    /// `lhs <= rhs`, stored as `rhs - lhs >= 0`.
    pub fn leq(lhs: Expr, rhs: Expr) -> Self {
        Constraint::NonNeg(difference(rhs, lhs))
    }

    /// `lhs >= rhs`, stored as `lhs - rhs >= 0`.
    pub fn geq(lhs: Expr, rhs: Expr) -> Self {
        Constraint::NonNeg(difference(lhs, rhs))
    }

    /// `norm2(x) <= t` for scalar `t`.
    pub fn soc(t: Expr, x: Expr) -> Self {
        Constraint::Soc {
            t: Arc::new(t),
            x: Arc::new(x),
        }
    }

    /// `e` is positive semidefinite.
    pub fn psd(e: Expr) -> Self {
        Constraint::Psd(Arc::new(e))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Constraint::Zero(_) => "equality",
            Constraint::NonNeg(_) => "inequality",
            Constraint::Soc { .. } => "second-order cone",
            Constraint::Psd(_) => "PSD",
        }
    }

    pub fn expressions(&self) -> Vec<&Expr> {
        match self {
            Constraint::Zero(e) | Constraint::NonNeg(e) | Constraint::Psd(e) => vec![e.as_ref()],
            Constraint::Soc { t, x } => vec![t.as_ref(), x.as_ref()],
        }
    }

    pub fn variables(&self) -> Vec<ExprId> {
        let mut ids: Vec<_> = self
            .expressions()
            .into_iter()
            .flat_map(|e| e.variables())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// The curvature each expression must have, paired with what it has.
    fn requirements(&self) -> Vec<(&Expr, &'static str, bool)> {
        match self {
            Constraint::Zero(e) | Constraint::Psd(e) => {
                vec![(e.as_ref(), "affine", e.is_affine())]
            }
            Constraint::NonNeg(e) => vec![(e.as_ref(), "concave", e.is_concave())],
            Constraint::Soc { t, x } => vec![
                (t.as_ref(), "affine", t.is_affine()),
                (x.as_ref(), "affine", x.is_affine()),
            ],
        }
    }

    pub fn is_dcp(&self) -> bool {
        self.requirements().iter().all(|(_, _, ok)| *ok)
    }

    /// Why the constraint is not DCP, when its expressions have a known
    /// curvature of the wrong kind.
    pub fn curvature_issue(&self) -> Option<String> {
        self.requirements().into_iter().find_map(|(e, needed, ok)| {
            let got = e.curvature();
            if ok || got == Curvature::Unknown {
                None
            } else {
                Some(format!(
                    "{} constraint needs a {} expression, got {} `{}`",
                    self.kind_name(),
                    needed,
                    got,
                    e
                ))
            }
        })
    }

    /// Shape requirements specific to the constraint kind.
    pub fn check_shapes(&self) -> Result<()> {
        match self {
            Constraint::Zero(e) | Constraint::NonNeg(e) => e.try_shape().map(|_| ()),
            Constraint::Soc { t, x } => {
                let ts = t.try_shape()?;
                x.try_shape()?;
                if ts.is_singleton() {
                    Ok(())
                } else {
                    Err(Error::shape("second-order cone bound", "a scalar", ts))
                }
            }
            Constraint::Psd(e) => {
                let s = e.try_shape()?;
                if s.is_matrix() && s.rows() == s.cols() {
                    Ok(())
                } else {
                    Err(Error::shape("PSD constraint", "a square matrix", s))
                }
            }
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Zero(e) => write!(f, "{} == 0", e),
            Constraint::NonNeg(e) => write!(f, "{} >= 0", e),
            Constraint::Soc { t, x } => write!(f, "norm2({}) <= {}", x, t),
            Constraint::Psd(e) => write!(f, "{} >> 0", e),
        }
    }
}

/// Constraint builders on expressions.
///
/// `equals`, `leq` and `geq` take another expression by reference; `eq`,
/// `le` and `ge` take anything convertible into one, such as an `f64`.
pub trait ConstraintExt {
    fn equals(&self, rhs: &Expr) -> Constraint;
    fn leq(&self, rhs: &Expr) -> Constraint;
    fn geq(&self, rhs: &Expr) -> Constraint;
    fn eq(&self, rhs: impl Into<Expr>) -> Constraint;
    fn le(&self, rhs: impl Into<Expr>) -> Constraint;
    fn ge(&self, rhs: impl Into<Expr>) -> Constraint;
}

impl ConstraintExt for Expr {
    fn equals(&self, rhs: &Expr) -> Constraint {
        Constraint::eq(self.clone(), rhs.clone())
    }

    fn leq(&self, rhs: &Expr) -> Constraint {
        Constraint::leq(self.clone(), rhs.clone())
    }

    fn geq(&self, rhs: &Expr) -> Constraint {
        Constraint::geq(self.clone(), rhs.clone())
    }

    fn eq(&self, rhs: impl Into<Expr>) -> Constraint {
        Constraint::eq(self.clone(), rhs.into())
    }

    fn le(&self, rhs: impl Into<Expr>) -> Constraint {
        Constraint::leq(self.clone(), rhs.into())
    }

    fn ge(&self, rhs: impl Into<Expr>) -> Constraint {
        Constraint::geq(self.clone(), rhs.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{constant, variable, VariableExt};

    #[test]
    fn test_normalized_forms() {
        let x = variable(3);
        assert!(matches!(x.eq(1.0), Constraint::Zero(_)));
        assert!(matches!(x.le(1.0), Constraint::NonNeg(_)));
        assert!(matches!(x.geq(&constant(0.0)), Constraint::NonNeg(_)));
        assert!(x.le(1.0).is_dcp());
    }

    #[test]
    fn test_convex_lower_bound_is_rejected() {
        let x = variable(5);
        let norm = Expr::Norm2(Arc::new(x));
        let c = norm.ge(1.0);
        assert!(!c.is_dcp());
        let issue = c.curvature_issue().unwrap();
        assert!(issue.contains("needs a concave expression, got convex"), "{}", issue);
    }

    #[test]
    fn test_soc_needs_scalar_bound() {
        let c = Constraint::soc(variable(2), variable(2));
        assert!(matches!(c.check_shapes(), Err(Error::ShapeMismatch { .. })));
        assert!(Constraint::soc(variable(()), variable(4)).check_shapes().is_ok());
    }

    #[test]
    fn test_psd_needs_square() {
        assert!(Constraint::psd(variable((2, 3))).check_shapes().is_err());
        assert!(Constraint::psd(variable((3, 3))).check_shapes().is_ok());
    }

    #[test]
    fn test_display() {
        let x = variable(()).named("x");
        assert_eq!(x.le(2.0).to_string(), "2 - x >= 0");
    }
}
