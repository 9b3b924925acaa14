//! Cone constraints in affine form.

use super::lin_expr::AffineExpr;

/// A constraint `u(x) ∈ K` for an affine `u` and a convex cone `K`.
#[derive(Debug, Clone)]
pub enum ConeConstraint {
    /// `a = 0`.
    Zero(AffineExpr),
    /// `a ≥ 0` elementwise.
    NonNeg(AffineExpr),
    /// `‖x‖₂ ≤ t`, with scalar `t`.
    Soc { t: AffineExpr, x: AffineExpr },
    /// `yᵢ·exp(xᵢ/yᵢ) ≤ zᵢ` for every i; one 3-d cone per element.
    Exp {
        x: AffineExpr,
        y: AffineExpr,
        z: AffineExpr,
    },
    /// `xᵢ^α · yᵢ^(1-α) ≥ |zᵢ|` for every i; one 3-d cone per element.
    Power {
        x: AffineExpr,
        y: AffineExpr,
        z: AffineExpr,
        alpha: f64,
    },
    /// Scaled upper-triangle vectorization of an `n x n` PSD matrix.
    Psd { svec: AffineExpr, n: usize },
}

impl ConeConstraint {
    /// Exponential cones over the elements of `x`, `y`, `z`; single-element
    /// arguments broadcast.
    pub fn exp(x: AffineExpr, y: AffineExpr, z: AffineExpr) -> Self {
        let k = x.size().max(y.size()).max(z.size());
        ConeConstraint::Exp {
            x: x.broadcast_to(k),
            y: y.broadcast_to(k),
            z: z.broadcast_to(k),
        }
    }

    pub fn power(x: AffineExpr, y: AffineExpr, z: AffineExpr, alpha: f64) -> Self {
        let k = x.size().max(y.size()).max(z.size());
        ConeConstraint::Power {
            x: x.broadcast_to(k),
            y: y.broadcast_to(k),
            z: z.broadcast_to(k),
            alpha,
        }
    }

    /// Number of rows this constraint occupies.
    pub fn rows(&self) -> usize {
        match self {
            ConeConstraint::Zero(a) | ConeConstraint::NonNeg(a) => a.size(),
            ConeConstraint::Soc { t, x } => t.size() + x.size(),
            ConeConstraint::Exp { x, .. } | ConeConstraint::Power { x, .. } => 3 * x.size(),
            ConeConstraint::Psd { svec, .. } => svec.size(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ConeConstraint::Zero(_) => "zero",
            ConeConstraint::NonNeg(_) => "nonneg",
            ConeConstraint::Soc { .. } => "soc",
            ConeConstraint::Exp { .. } => "exp",
            ConeConstraint::Power { .. } => "power",
            ConeConstraint::Psd { .. } => "psd",
        }
    }

    /// Stacked affine rows in cone order. Exponential and power cones are
    /// interleaved as `(x₀, y₀, z₀, x₁, ...)`.
    pub fn stacked(&self) -> AffineExpr {
        use crate::expr::Shape;
        match self {
            ConeConstraint::Zero(a) | ConeConstraint::NonNeg(a) => a.clone(),
            ConeConstraint::Psd { svec, .. } => svec.clone(),
            ConeConstraint::Soc { t, x } => {
                let n = t.size() + x.size();
                AffineExpr::concat(&[t.clone(), x.clone()], Shape::vector(n))
            }
            ConeConstraint::Exp { x, y, z } | ConeConstraint::Power { x, y, z, .. } => {
                let k = x.size();
                let stacked =
                    AffineExpr::concat(&[x.clone(), y.clone(), z.clone()], Shape::vector(3 * k));
                // (x; y; z) -> (x₀, y₀, z₀, ...)
                let mut perm = crate::sparse::Triplets::new(3 * k, 3 * k);
                for i in 0..k {
                    for (c, block) in [0, k, 2 * k].into_iter().enumerate() {
                        perm.push(3 * i + c, block + i, 1.0);
                    }
                }
                stacked.apply(&perm.build(), Shape::vector(3 * k))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{ExprId, Shape};
    use nalgebra::DVector;
    use std::collections::BTreeMap;

    #[test]
    fn test_exp_broadcasts_and_interleaves() {
        let id = ExprId::new();
        let x = AffineExpr::variable(id, Shape::vector(2));
        let c = ConeConstraint::exp(x, AffineExpr::scalar(1.0), AffineExpr::scalar(5.0));
        assert_eq!(c.rows(), 6);
        assert_eq!(c.kind_name(), "exp");

        let mut vals = BTreeMap::new();
        vals.insert(id, DVector::from_vec(vec![-1.0, -2.0]));
        let v = c.stacked().eval(&vals).unwrap();
        assert_eq!(v.as_slice(), &[-1.0, 1.0, 5.0, -2.0, 1.0, 5.0]);
    }

    #[test]
    fn test_soc_rows() {
        let t = AffineExpr::variable(ExprId::new(), Shape::scalar());
        let x = AffineExpr::variable(ExprId::new(), Shape::vector(4));
        let c = ConeConstraint::Soc { t, x };
        assert_eq!(c.rows(), 5);
        assert_eq!(c.stacked().size(), 5);
    }
}
