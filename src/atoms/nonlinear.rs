//! Nonlinear atoms.
//!
//! Each atom records its intrinsic curvature and per-argument monotonicity
//! in [`crate::dcp`]; the verifier combines them with the curvature of the
//! arguments. Domain restrictions (`log` needs a positive argument, and so on)
//! are enforced by the cone each atom is rewritten into.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::expr::Expr;

fn unary(x: &Expr, build: impl FnOnce(Arc<Expr>) -> Expr) -> Expr {
    build(Arc::new(x.clone()))
}

/// Elementwise `|x|`.
pub fn abs(x: &Expr) -> Expr {
    unary(x, Expr::Abs)
}

/// `sum(|x|)` over all entries.
pub fn norm1(x: &Expr) -> Expr {
    unary(x, Expr::Norm1)
}

/// Euclidean norm of all entries (Frobenius for matrices).
pub fn norm2(x: &Expr) -> Expr {
    unary(x, Expr::Norm2)
}

/// `max(|x|)` over all entries.
pub fn norm_inf(x: &Expr) -> Expr {
    unary(x, Expr::NormInf)
}

/// The p-norm for p = 1, 2 or infinity.
///
/// # Panics
///
/// Panics for any other `p`; [`try_norm`] reports it as an error instead.
pub fn norm(x: &Expr, p: f64) -> Expr {
    match try_norm(x, p) {
        Ok(e) => e,
        Err(e) => panic!("{}", e),
    }
}

pub fn try_norm(x: &Expr, p: f64) -> Result<Expr> {
    if p == 1.0 {
        Ok(norm1(x))
    } else if p == 2.0 {
        Ok(norm2(x))
    } else if p.is_infinite() && p > 0.0 {
        Ok(norm_inf(x))
    } else {
        Err(Error::InvalidProblem(format!(
            "norm with p = {} is not supported; use 1, 2 or infinity",
            p
        )))
    }
}

/// Elementwise `max(x, 0)`.
pub fn pos(x: &Expr) -> Expr {
    unary(x, Expr::Pos)
}

/// Elementwise `max(-x, 0)`.
pub fn neg_part(x: &Expr) -> Expr {
    unary(x, Expr::NegPart)
}

/// Elementwise maximum, with scalar arguments broadcast.
pub fn maximum(mut exprs: Vec<Expr>) -> Expr {
    if exprs.len() == 1 {
        if let Some(only) = exprs.pop() {
            return only;
        }
    }
    Expr::Maximum(exprs.into_iter().map(Arc::new).collect())
}

pub fn max2(a: &Expr, b: &Expr) -> Expr {
    maximum(vec![a.clone(), b.clone()])
}

/// Elementwise minimum, with scalar arguments broadcast.
pub fn minimum(mut exprs: Vec<Expr>) -> Expr {
    if exprs.len() == 1 {
        if let Some(only) = exprs.pop() {
            return only;
        }
    }
    Expr::Minimum(exprs.into_iter().map(Arc::new).collect())
}

pub fn min2(a: &Expr, b: &Expr) -> Expr {
    minimum(vec![a.clone(), b.clone()])
}

/// `sum(x^2)` over all entries.
pub fn sum_squares(x: &Expr) -> Expr {
    unary(x, Expr::SumSquares)
}

/// `x' P x` for a constant symmetric `P`. Convex when `P` is PSD and
/// concave when it is NSD.
pub fn quad_form(x: &Expr, p: &Expr) -> Expr {
    Expr::QuadForm(Arc::new(x.clone()), Arc::new(p.clone()))
}

/// `sum(x^2) / y` for scalar `y > 0`.
pub fn quad_over_lin(x: &Expr, y: &Expr) -> Expr {
    Expr::QuadOverLin(Arc::new(x.clone()), Arc::new(y.clone()))
}

pub fn exp(x: &Expr) -> Expr {
    unary(x, Expr::Exp)
}

pub fn log(x: &Expr) -> Expr {
    unary(x, Expr::Log)
}

/// Elementwise `-x log x`.
pub fn entropy(x: &Expr) -> Expr {
    unary(x, Expr::Entropy)
}

/// Elementwise `x^p`.
///
/// | p | curvature | domain |
/// |---|-----------|--------|
/// | even integer > 1 | convex | all x |
/// | other p > 1 | convex | x >= 0 |
/// | 0 < p < 1 | concave | x >= 0 |
/// | p < 0 | convex | x > 0 |
pub fn power(x: &Expr, p: f64) -> Expr {
    Expr::Power(Arc::new(x.clone()), p)
}

pub fn sqrt(x: &Expr) -> Expr {
    power(x, 0.5)
}

/// Elementwise `1 / x` on `x > 0`.
pub fn inv_pos(x: &Expr) -> Expr {
    power(x, -1.0)
}

/// `log(sum(exp(x)))`.
pub fn log_sum_exp(x: &Expr) -> Expr {
    unary(x, Expr::LogSumExp)
}

/// Elementwise `log(1 + exp(x))`.
pub fn logistic(x: &Expr) -> Expr {
    unary(x, Expr::Logistic)
}
