//! Canonicalization of expressions into affine form plus cone constraints.
//!
//! Nonlinear atoms are replaced by fresh auxiliary variables (epigraph or
//! hypograph variables) constrained to the appropriate cone. DCP guarantees
//! that the relaxation is tight at the optimum.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::trace;
use nalgebra::{DMatrix, DVector};

use super::cone::ConeConstraint;
use super::lin_expr::{AffineExpr, QuadraticExpr};
use super::linop;
use crate::constraints::Constraint;
use crate::dcp::sign::is_even_integer;
use crate::error::{Error, Result};
use crate::expr::{Expr, ExprId, Shape, VariableData};
use crate::problem::Problem;
use crate::sparse::dense_to_csc;

/// Eigenvalues below this (relative to the largest magnitude) count as zero
/// when factoring a quad_form matrix.
const FACTOR_TOL: f64 = 1e-10;

/// A problem rewritten into affine form and cone constraints.
#[derive(Debug, Clone)]
pub struct CanonProblem {
    /// Objective to minimize; already negated for maximization.
    pub objective: QuadraticExpr,
    /// `1.0` for minimize, `-1.0` for maximize.
    pub objective_sign: f64,
    pub constraints: Vec<ConeConstraint>,
    /// For user constraint `i`, the index into `constraints` carrying its dual.
    pub constraint_map: Vec<usize>,
    /// User variables, sorted by id.
    pub variables: Vec<VariableData>,
    /// Auxiliary variables in creation order.
    pub aux: Vec<(ExprId, Shape)>,
}

/// Rewrite `problem` into conic form. Parameters are read at their current
/// values.
pub fn canonicalize(problem: &Problem) -> Result<CanonProblem> {
    let mut ctx = CanonContext::default();

    let objective_sign = if problem.objective.is_minimize() {
        1.0
    } else {
        -1.0
    };
    let objective_expr = problem.objective.expr();
    if !objective_expr.try_shape()?.is_singleton() {
        return Err(Error::shape("objective", Shape::scalar(), objective_expr.shape()));
    }
    let objective = ctx.objective(objective_expr)?.scale(objective_sign);

    let mut constraint_map = Vec::with_capacity(problem.constraints.len());
    for c in &problem.constraints {
        let cone = ctx.constraint(c)?;
        constraint_map.push(ctx.constraints.len());
        ctx.constraints.push(cone);
    }

    let mut variables: BTreeMap<ExprId, VariableData> = BTreeMap::new();
    let mut collect = |e: &Expr| {
        e.visit(&mut |node| {
            if let Expr::Variable(v) = node {
                variables.entry(v.id).or_insert_with(|| v.clone());
            }
        })
    };
    collect(objective_expr);
    for c in &problem.constraints {
        for e in c.expressions() {
            collect(e);
        }
    }
    let variables: Vec<VariableData> = variables.into_values().collect();

    for v in &variables {
        let x = AffineExpr::variable(v.id, v.shape.clone());
        if v.nonneg {
            ctx.constraints.push(ConeConstraint::NonNeg(x));
        } else if v.nonpos {
            ctx.constraints.push(ConeConstraint::NonNeg(x.neg()));
        }
    }

    trace!(
        "canonicalized: {} user variables, {} auxiliary, {} cone constraints",
        variables.len(),
        ctx.aux.len(),
        ctx.constraints.len()
    );

    Ok(CanonProblem {
        objective,
        objective_sign,
        constraints: ctx.constraints,
        constraint_map,
        variables,
        aux: ctx.aux,
    })
}

#[derive(Debug, Default)]
struct CanonContext {
    aux: Vec<(ExprId, Shape)>,
    constraints: Vec<ConeConstraint>,
}

impl CanonContext {
    fn new_aux_var(&mut self, shape: Shape) -> AffineExpr {
        let id = ExprId::new();
        self.aux.push((id, shape.clone()));
        AffineExpr::variable(id, shape)
    }

    fn push(&mut self, c: ConeConstraint) {
        self.constraints.push(c);
    }

    fn constraint(&mut self, c: &Constraint) -> Result<ConeConstraint> {
        c.check_shapes()?;
        Ok(match c {
            Constraint::Zero(e) => ConeConstraint::Zero(self.affine(e)?),
            Constraint::NonNeg(e) => ConeConstraint::NonNeg(self.affine(e)?),
            Constraint::Soc { t, x } => ConeConstraint::Soc {
                t: self.affine(t)?.with_shape(Shape::scalar()),
                x: self.affine(x)?,
            },
            Constraint::Psd(e) => {
                let n = e.try_shape()?.rows();
                let u = self.affine(e)?;
                ConeConstraint::Psd {
                    svec: u.apply(&linop::svec(n), Shape::vector(n * (n + 1) / 2)),
                    n,
                }
            }
        })
    }

    /// Objective canonicalization: squared terms stay quadratic.
    fn objective(&mut self, e: &Expr) -> Result<QuadraticExpr> {
        match e {
            Expr::Add(a, b) => self.objective(a)?.add(&self.objective(b)?),
            Expr::Neg(a) => Ok(self.objective(a)?.neg()),
            Expr::Mul(a, b) if is_scalar_constant(a) => {
                let c = self.affine(a)?.constant[0];
                Ok(self.objective(b)?.scale(c))
            }
            Expr::Mul(a, b) if is_scalar_constant(b) => {
                let c = self.affine(b)?.constant[0];
                Ok(self.objective(a)?.scale(c))
            }
            Expr::Sum(a, _) if a.shape().is_singleton() => self.objective(a),
            Expr::SumSquares(a) => Ok(QuadraticExpr::sum_squares(&self.affine(a)?)),
            Expr::Power(a, p) if *p == 2.0 && a.shape().is_singleton() => {
                Ok(QuadraticExpr::sum_squares(&self.affine(a)?))
            }
            Expr::QuadForm(x, p) => {
                let u = self.affine(x)?;
                let m = symmetric_part(&self.constant_matrix(p, "quad_form")?);
                Ok(QuadraticExpr::quad_form(&u, &dense_to_csc(&m)))
            }
            _ => Ok(QuadraticExpr::from_affine(
                self.affine(e)?.with_shape(Shape::scalar()),
            )),
        }
    }

    /// Affine representation of `e`, adding auxiliary variables and cone
    /// constraints for every nonlinear atom below it.
    fn affine(&mut self, e: &Expr) -> Result<AffineExpr> {
        let shape = e.try_shape()?;
        match e {
            Expr::Variable(v) => Ok(AffineExpr::variable(v.id, v.shape.clone())),
            Expr::Parameter(p) => {
                let value = p.require_value()?;
                Ok(AffineExpr::constant(value.flatten(), shape))
            }
            Expr::Constant(c) => Ok(AffineExpr::constant(c.value.flatten(), shape)),

            Expr::Add(a, b) => Ok(self.affine(a)?.add(&self.affine(b)?)?.with_shape(shape)),
            Expr::Neg(a) => Ok(self.affine(a)?.neg()),
            Expr::Mul(a, b) => self.mul(a, b, shape),
            Expr::MatMul(a, b) => self.matmul(a, b, shape),
            Expr::Sum(a, axis) => {
                let u = self.affine(a)?;
                let inner = a.shape();
                Ok(match axis {
                    Some(axis) if inner.is_matrix() => u.apply(
                        &linop::sum_axis(inner.rows(), inner.cols(), *axis),
                        shape,
                    ),
                    _ => u.sum(),
                })
            }
            Expr::Reshape(a, _) => Ok(self.affine(a)?.with_shape(shape)),
            Expr::Index(a, spec) => {
                let u = self.affine(a)?;
                let n = u.size();
                Ok(u.apply(&linop::select(spec.positions(), n), shape))
            }
            Expr::VStack(args) => self.stack(args, shape, true),
            Expr::HStack(args) => self.stack(args, shape, false),
            Expr::Transpose(a) => {
                let inner = a.shape();
                let u = self.affine(a)?;
                if inner.is_matrix() {
                    Ok(u.apply(&linop::transpose(inner.rows(), inner.cols()), shape))
                } else {
                    Ok(u.with_shape(shape))
                }
            }
            Expr::Trace(a) => {
                let n = a.shape().rows();
                Ok(self.affine(a)?.apply(&linop::trace(n), shape))
            }
            Expr::Cumsum(a, axis) => {
                let inner = a.shape();
                let u = self.affine(a)?;
                let op = match axis {
                    None => linop::cumsum(inner.size(), 1, 0),
                    Some(axis) => linop::cumsum(inner.rows(), inner.cols(), *axis),
                };
                Ok(u.apply(&op, shape))
            }
            Expr::Diag(a) => {
                let inner = a.shape();
                let u = self.affine(a)?;
                if inner.is_vector() {
                    Ok(u.apply(&linop::diag_embed(inner.size()), shape))
                } else {
                    Ok(u.apply(&linop::diag_extract(inner.rows()), shape))
                }
            }

            Expr::Abs(a) => {
                let u = self.affine(a)?;
                let t = self.new_aux_var(u.shape.clone());
                self.push(ConeConstraint::NonNeg(t.sub(&u)?));
                self.push(ConeConstraint::NonNeg(t.add(&u)?));
                Ok(t)
            }
            Expr::Norm1(a) => {
                let u = self.affine(a)?;
                let t = self.new_aux_var(Shape::vector(u.size()));
                let u = u.with_shape(Shape::vector(t.size()));
                self.push(ConeConstraint::NonNeg(t.sub(&u)?));
                self.push(ConeConstraint::NonNeg(t.add(&u)?));
                Ok(t.sum())
            }
            Expr::NormInf(a) => {
                let u = self.affine(a)?;
                let t = self.new_aux_var(Shape::scalar());
                self.push(ConeConstraint::NonNeg(t.sub(&u)?));
                self.push(ConeConstraint::NonNeg(t.add(&u)?));
                Ok(t)
            }
            Expr::Norm2(a) => {
                let x = self.affine(a)?;
                let t = self.new_aux_var(Shape::scalar());
                self.push(ConeConstraint::Soc { t: t.clone(), x });
                Ok(t)
            }
            Expr::Pos(a) => {
                let u = self.affine(a)?;
                let t = self.new_aux_var(u.shape.clone());
                self.push(ConeConstraint::NonNeg(t.clone()));
                self.push(ConeConstraint::NonNeg(t.sub(&u)?));
                Ok(t)
            }
            Expr::NegPart(a) => {
                let u = self.affine(a)?;
                let t = self.new_aux_var(u.shape.clone());
                self.push(ConeConstraint::NonNeg(t.clone()));
                self.push(ConeConstraint::NonNeg(t.add(&u)?));
                Ok(t)
            }
            Expr::Maximum(args) => {
                let t = self.new_aux_var(shape);
                for arg in args {
                    let u = self.affine(arg)?;
                    self.push(ConeConstraint::NonNeg(t.sub(&u)?));
                }
                Ok(t)
            }
            Expr::Minimum(args) => {
                let t = self.new_aux_var(shape);
                for arg in args {
                    let u = self.affine(arg)?;
                    self.push(ConeConstraint::NonNeg(u.sub(&t)?));
                }
                Ok(t)
            }
            Expr::SumSquares(a) => {
                let u = self.affine(a)?;
                self.sum_squares_epigraph(u)
            }
            Expr::QuadForm(x, p) => self.quad_form(x, p),
            Expr::QuadOverLin(x, y) => {
                let u = self.affine(x)?;
                let y = self.affine(y)?.with_shape(Shape::scalar());
                let t = self.new_aux_var(Shape::scalar());
                // ‖u‖² ≤ t·y  ⇔  ‖(2u, y - t)‖ ≤ y + t
                let n = u.size() + 1;
                let x = AffineExpr::concat(&[u.scale(2.0), y.sub(&t)?], Shape::vector(n));
                self.push(ConeConstraint::Soc { t: y.add(&t)?, x });
                Ok(t)
            }
            Expr::Exp(a) => {
                let u = self.affine(a)?;
                let t = self.new_aux_var(u.shape.clone());
                self.push(ConeConstraint::exp(u, AffineExpr::scalar(1.0), t.clone()));
                Ok(t)
            }
            Expr::Log(a) => {
                let u = self.affine(a)?;
                let t = self.new_aux_var(u.shape.clone());
                self.push(ConeConstraint::exp(t.clone(), AffineExpr::scalar(1.0), u));
                Ok(t)
            }
            Expr::Entropy(a) => {
                let u = self.affine(a)?;
                let t = self.new_aux_var(u.shape.clone());
                self.push(ConeConstraint::exp(t.clone(), u, AffineExpr::scalar(1.0)));
                Ok(t)
            }
            Expr::LogSumExp(a) => {
                let u = self.affine(a)?;
                let k = u.size();
                let t = self.new_aux_var(Shape::scalar());
                let w = self.new_aux_var(Shape::vector(k));
                let shifted = u.with_shape(Shape::vector(k)).sub(&t)?;
                self.push(ConeConstraint::exp(shifted, AffineExpr::scalar(1.0), w.clone()));
                self.push(ConeConstraint::NonNeg(AffineExpr::scalar(1.0).sub(&w.sum())?));
                Ok(t)
            }
            Expr::Logistic(a) => {
                let u = self.affine(a)?;
                let t = self.new_aux_var(u.shape.clone());
                let w1 = self.new_aux_var(u.shape.clone());
                let w2 = self.new_aux_var(u.shape.clone());
                let one = AffineExpr::scalar(1.0);
                // exp(-t) + exp(u - t) <= 1
                self.push(ConeConstraint::exp(t.neg(), one.clone(), w1.clone()));
                self.push(ConeConstraint::exp(u.sub(&t)?, one.clone(), w2.clone()));
                self.push(ConeConstraint::NonNeg(one.sub(&w1.add(&w2)?)?));
                Ok(t)
            }
            Expr::Power(a, p) => self.power(a, *p),
        }
    }

    fn power(&mut self, a: &Expr, p: f64) -> Result<AffineExpr> {
        let u = self.affine(a)?;
        let one = AffineExpr::scalar(1.0);
        if p.is_nan() {
            return Err(Error::InvalidProblem("power exponent is NaN".into()));
        }
        if p == 0.0 {
            let n = u.size();
            return Ok(AffineExpr::constant(DVector::from_element(n, 1.0), u.shape));
        }
        if p == 1.0 {
            return Ok(u);
        }
        let t = self.new_aux_var(u.shape.clone());
        if p > 1.0 {
            // t^(1/p) ≥ |u|
            if !is_even_integer(p) {
                self.push(ConeConstraint::NonNeg(u.clone()));
            }
            self.push(ConeConstraint::power(t.clone(), one, u, 1.0 / p));
        } else if p > 0.0 {
            // u^p ≥ |t|
            self.push(ConeConstraint::power(u, one, t.clone(), p));
        } else {
            // t^α u^(1-α) ≥ 1 with α = 1/(1-p)
            self.push(ConeConstraint::power(t.clone(), u, one, 1.0 / (1.0 - p)));
        }
        Ok(t)
    }

    /// `t ≥ ‖u‖²` as the rotated cone `‖(2u, t - 1)‖ ≤ t + 1`.
    fn sum_squares_epigraph(&mut self, u: AffineExpr) -> Result<AffineExpr> {
        let t = self.new_aux_var(Shape::scalar());
        let one = AffineExpr::scalar(1.0);
        let n = u.size() + 1;
        let x = AffineExpr::concat(&[u.scale(2.0), t.sub(&one)?], Shape::vector(n));
        self.push(ConeConstraint::Soc { t: t.add(&one)?, x });
        Ok(t)
    }

    /// `xᵀPx` outside the objective, via `P = FᵀF` (or `-P` when NSD).
    fn quad_form(&mut self, x: &Expr, p: &Expr) -> Result<AffineExpr> {
        let u = self.affine(x)?;
        let m = symmetric_part(&self.constant_matrix(p, "quad_form")?);
        let eig = m.clone().symmetric_eigen();
        let scale = eig.eigenvalues.amax().max(1.0);
        let tol = FACTOR_TOL * scale;

        let sign = if eig.eigenvalues.iter().all(|&l| l >= -tol) {
            1.0
        } else if eig.eigenvalues.iter().all(|&l| l <= tol) {
            -1.0
        } else {
            return Err(Error::InvalidProblem(format!(
                "quad_form matrix `{}` is indefinite",
                p
            )));
        };

        let n = m.nrows();
        let kept: Vec<usize> = (0..n)
            .filter(|&k| sign * eig.eigenvalues[k] > tol)
            .collect();
        if kept.is_empty() {
            return Ok(AffineExpr::scalar(0.0));
        }
        let mut factor = DMatrix::zeros(kept.len(), n);
        for (row, &k) in kept.iter().enumerate() {
            let root = (sign * eig.eigenvalues[k]).sqrt();
            for col in 0..n {
                factor[(row, col)] = root * eig.eigenvectors[(col, k)];
            }
        }
        let fu = u.apply(&dense_to_csc(&factor), Shape::vector(kept.len()));
        let t = self.sum_squares_epigraph(fu)?;
        Ok(t.scale(sign))
    }

    fn mul(&mut self, a: &Expr, b: &Expr, shape: Shape) -> Result<AffineExpr> {
        let ua = self.affine(a)?;
        let ub = self.affine(b)?;
        let (c, x) = if ua.is_constant() {
            (ua, ub)
        } else if ub.is_constant() {
            (ub, ua)
        } else {
            return Err(non_constant_product(a, b));
        };
        let n = shape.size();
        let out = if c.size() == 1 {
            x.scale(c.constant[0]).broadcast_to(n)
        } else {
            x.broadcast_to(n).scale_rows(&c.constant)
        };
        Ok(out.with_shape(shape))
    }

    fn matmul(&mut self, a: &Expr, b: &Expr, shape: Shape) -> Result<AffineExpr> {
        let (sa, sb) = (a.shape(), b.shape());
        // a vector on the left is a row, on the right a column
        let (m, n) = if sa.is_vector() {
            (1, sa.size())
        } else {
            (sa.rows(), sa.cols())
        };
        let (n2, k) = (sb.rows(), sb.cols());
        if n != n2 {
            return Err(Error::shape("matmul", &sa, &sb));
        }

        let ua = self.affine(a)?;
        let ub = self.affine(b)?;
        match (ua.is_constant(), ub.is_constant()) {
            (true, true) => {
                let product = ua.constant_matrix(m, n) * ub.constant_matrix(n, k);
                Ok(AffineExpr::constant(
                    DVector::from_column_slice(product.as_slice()),
                    shape,
                ))
            }
            (true, false) => {
                let op = linop::left_matmul(&ua.constant_matrix(m, n), k);
                Ok(ub.apply(&op, shape))
            }
            (false, true) => {
                let op = linop::right_matmul(&ub.constant_matrix(n, k), m);
                Ok(ua.apply(&op, shape))
            }
            (false, false) => Err(non_constant_product(a, b)),
        }
    }

    fn stack(&mut self, args: &[Arc<Expr>], shape: Shape, vertical: bool) -> Result<AffineExpr> {
        let parts = args
            .iter()
            .map(|a| self.affine(a))
            .collect::<Result<Vec<_>>>()?;
        let flat = AffineExpr::concat(&parts, Shape::vector(shape.size()));
        if !vertical || shape.is_vector() {
            return Ok(flat.with_shape(shape));
        }
        let rows: Vec<usize> = args.iter().map(|a| a.shape().rows()).collect();
        Ok(flat.apply(&linop::vstack_permutation(&rows, shape.cols()), shape))
    }

    /// Numeric value of a constant matrix operand.
    fn constant_matrix(&mut self, e: &Expr, context: &str) -> Result<DMatrix<f64>> {
        let s = e.try_shape()?;
        let u = self.affine(e)?;
        if !u.is_constant() {
            return Err(Error::InvalidProblem(format!(
                "{} needs a constant matrix, got `{}`",
                context, e
            )));
        }
        Ok(u.constant_matrix(s.rows(), s.cols()))
    }
}

fn is_scalar_constant(e: &Expr) -> bool {
    e.curvature().is_constant() && e.shape().is_singleton()
}

fn symmetric_part(m: &DMatrix<f64>) -> DMatrix<f64> {
    (m + m.transpose()) * 0.5
}

fn non_constant_product(a: &Expr, b: &Expr) -> Error {
    Error::InvalidProblem(format!(
        "product of two non-constant expressions `{}` and `{}`",
        a, b
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::{exp, norm2, power, quad_form, sum, sum_squares};
    use crate::constraints::ConstraintExt;
    use crate::expr::{constant_matrix, nonneg_variable, parameter, variable};

    fn count(p: &CanonProblem, kind: &str) -> usize {
        p.constraints.iter().filter(|c| c.kind_name() == kind).count()
    }

    #[test]
    fn test_lp_has_no_aux() {
        let x = variable(3);
        let problem = Problem::minimize(sum(&x))
            .subject_to([x.ge(1.0)])
            .build();
        let canon = canonicalize(&problem).unwrap();
        assert!(canon.objective.is_linear());
        assert!(canon.aux.is_empty());
        assert_eq!(canon.variables.len(), 1);
        assert_eq!(canon.constraint_map, vec![0]);
        assert_eq!(canon.constraints[0].rows(), 3);
    }

    #[test]
    fn test_sum_squares_objective_is_quadratic() {
        let x = variable(2);
        let canon = canonicalize(&Problem::minimize(sum_squares(&x)).build()).unwrap();
        assert!(!canon.objective.is_linear());
        assert!(canon.constraints.is_empty());
    }

    #[test]
    fn test_sum_squares_in_constraint_uses_soc() {
        let x = variable(2);
        let problem = Problem::minimize(sum(&x))
            .subject_to([sum_squares(&x).le(1.0)])
            .build();
        let canon = canonicalize(&problem).unwrap();
        assert_eq!(count(&canon, "soc"), 1);
        assert_eq!(canon.aux.len(), 1);
        // the soc is (t + 1, 2x, t - 1)
        let soc = canon.constraints.iter().find(|c| c.kind_name() == "soc").unwrap();
        assert_eq!(soc.rows(), 4);
    }

    #[test]
    fn test_norm_and_exp() {
        let x = variable(3);
        let problem = Problem::minimize(norm2(&x) + sum(&exp(&x))).build();
        let canon = canonicalize(&problem).unwrap();
        assert_eq!(count(&canon, "soc"), 1);
        assert_eq!(count(&canon, "exp"), 1);
        let e = canon.constraints.iter().find(|c| c.kind_name() == "exp").unwrap();
        assert_eq!(e.rows(), 9);
    }

    #[test]
    fn test_odd_power_adds_domain() {
        let x = variable(());
        let canon = canonicalize(&Problem::minimize(power(&x, 3.0)).build()).unwrap();
        assert_eq!(count(&canon, "power"), 1);
        assert_eq!(count(&canon, "nonneg"), 1);

        let canon = canonicalize(&Problem::minimize(power(&x, 2.0)).build()).unwrap();
        assert_eq!(count(&canon, "nonneg"), 0);
    }

    #[test]
    fn test_sign_attribute_becomes_constraint() {
        let x = nonneg_variable(2);
        let canon = canonicalize(&Problem::minimize(sum(&x)).build()).unwrap();
        assert_eq!(count(&canon, "nonneg"), 1);
        assert!(canon.constraint_map.is_empty());
    }

    #[test]
    fn test_maximize_negates_objective() {
        let x = variable(());
        let problem = Problem::maximize(-&x).subject_to([x.ge(0.0)]).build();
        let canon = canonicalize(&problem).unwrap();
        assert_eq!(canon.objective_sign, -1.0);
        let mut vals = BTreeMap::new();
        vals.insert(x.variable_id().unwrap(), DVector::from_element(1, 2.0));
        assert_eq!(canon.objective.eval(&vals), Some(2.0));
    }

    #[test]
    fn test_unset_parameter_is_an_error() {
        let x = variable(2);
        let p = parameter(());
        let problem = Problem::minimize(sum(&(&p * &x))).build();
        assert!(matches!(
            canonicalize(&problem),
            Err(Error::ParameterUnset(_))
        ));
    }

    #[test]
    fn test_quad_form_in_constraint_factors() {
        let x = variable(2);
        let p = constant_matrix(vec![2.0, 0.0, 0.0, 1.0], 2, 2);
        let problem = Problem::minimize(sum(&x))
            .subject_to([quad_form(&x, &p).le(1.0)])
            .build();
        let canon = canonicalize(&problem).unwrap();
        assert_eq!(count(&canon, "soc"), 1);
    }
}
