//! Affine and quadratic expressions in standard form.
//!
//! - Affine: `Σᵢ Aᵢ vec(xᵢ) + c`
//! - Quadratic: `Σᵢⱼ xᵢᵀ Qᵢⱼ xⱼ + Σᵢ qᵢᵀ xᵢ + r`
//!
//! Terms are keyed by variable id in a `BTreeMap`, so iteration order, and
//! with it the stuffed matrices, is deterministic.

use std::collections::BTreeMap;

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CscMatrix;

use super::linop;
use crate::error::{Error, Result};
use crate::expr::{ExprId, Shape};
use crate::sparse::{
    csc_add, csc_mul, csc_mul_vec, csc_ones_col, csc_scale, csc_tr_mul_vec, Triplets,
};

/// An affine function of the problem variables.
#[derive(Debug, Clone)]
pub struct AffineExpr {
    /// `var_id -> Aᵢ`, each of shape `(size, var_size)`.
    pub coeffs: BTreeMap<ExprId, CscMatrix<f64>>,
    /// Column-major constant term, of length `size`.
    pub constant: DVector<f64>,
    pub shape: Shape,
}

impl AffineExpr {
    pub fn zeros(shape: Shape) -> Self {
        AffineExpr {
            coeffs: BTreeMap::new(),
            constant: DVector::zeros(shape.size()),
            shape,
        }
    }

    pub fn variable(id: ExprId, shape: Shape) -> Self {
        let size = shape.size();
        let mut coeffs = BTreeMap::new();
        coeffs.insert(id, CscMatrix::identity(size));
        AffineExpr {
            coeffs,
            constant: DVector::zeros(size),
            shape,
        }
    }

    pub fn constant(values: DVector<f64>, shape: Shape) -> Self {
        debug_assert_eq!(values.len(), shape.size());
        AffineExpr {
            coeffs: BTreeMap::new(),
            constant: values,
            shape,
        }
    }

    pub fn scalar(value: f64) -> Self {
        Self::constant(DVector::from_element(1, value), Shape::scalar())
    }

    pub fn size(&self) -> usize {
        self.constant.len()
    }

    /// True when no variable appears.
    pub fn is_constant(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn variables(&self) -> Vec<ExprId> {
        self.coeffs.keys().copied().collect()
    }

    /// The constant term laid out as a `rows x cols` matrix.
    pub fn constant_matrix(&self, rows: usize, cols: usize) -> DMatrix<f64> {
        DMatrix::from_column_slice(rows, cols, self.constant.as_slice())
    }

    /// Same data, different shape of equal size.
    pub fn with_shape(mut self, shape: Shape) -> Self {
        debug_assert_eq!(shape.size(), self.size());
        self.shape = shape;
        self
    }

    /// Repeat a single-element expression `n` times (vector of length `n`).
    pub fn broadcast_to(&self, n: usize) -> Self {
        if self.size() == n {
            return self.clone();
        }
        debug_assert_eq!(self.size(), 1);
        self.apply(&csc_ones_col(n), Shape::vector(n))
    }

    /// Elementwise sum; a single-element side broadcasts.
    pub fn add(&self, other: &AffineExpr) -> Result<AffineExpr> {
        let shape = self
            .shape
            .broadcast(&other.shape)
            .or_else(|| match (self.size(), other.size()) {
                (1, _) => Some(other.shape.clone()),
                (_, 1) => Some(self.shape.clone()),
                _ => None,
            })
            .ok_or_else(|| Error::shape("add", &self.shape, &other.shape))?;
        let n = shape.size();
        let (a, b) = (self.broadcast_to(n), other.broadcast_to(n));

        let mut coeffs = a.coeffs;
        for (id, m) in b.coeffs {
            let merged = match coeffs.remove(&id) {
                Some(existing) => csc_add(&existing, &m),
                None => m,
            };
            coeffs.insert(id, merged);
        }
        Ok(AffineExpr {
            coeffs,
            constant: a.constant + b.constant,
            shape,
        })
    }

    pub fn sub(&self, other: &AffineExpr) -> Result<AffineExpr> {
        self.add(&other.neg())
    }

    pub fn neg(&self) -> AffineExpr {
        self.scale(-1.0)
    }

    pub fn scale(&self, s: f64) -> AffineExpr {
        AffineExpr {
            coeffs: self
                .coeffs
                .iter()
                .map(|(id, m)| (*id, csc_scale(m, s)))
                .collect(),
            constant: &self.constant * s,
            shape: self.shape.clone(),
        }
    }

    /// Multiply row `i` by `d[i]`.
    pub fn scale_rows(&self, d: &DVector<f64>) -> AffineExpr {
        debug_assert_eq!(d.len(), self.size());
        let mut diag = Triplets::new(d.len(), d.len());
        for (i, v) in d.iter().enumerate() {
            diag.push(i, i, *v);
        }
        self.apply(&diag.build(), self.shape.clone())
    }

    /// `op · self`, with `op` of shape `(shape.size(), self.size())`.
    pub fn apply(&self, op: &CscMatrix<f64>, shape: Shape) -> AffineExpr {
        debug_assert_eq!(op.ncols(), self.size());
        AffineExpr {
            coeffs: self
                .coeffs
                .iter()
                .map(|(id, m)| (*id, csc_mul(op, m)))
                .collect(),
            constant: csc_mul_vec(op, &self.constant),
            shape,
        }
    }

    /// Sum of all entries, as a scalar.
    pub fn sum(&self) -> AffineExpr {
        self.apply(&linop::sum_all(self.size()), Shape::scalar())
    }

    /// Flat concatenation of `parts`, given the resulting shape.
    pub fn concat(parts: &[AffineExpr], shape: Shape) -> AffineExpr {
        let rows: usize = parts.iter().map(AffineExpr::size).sum();
        debug_assert_eq!(rows, shape.size());

        let mut blocks: BTreeMap<ExprId, (usize, Triplets)> = BTreeMap::new();
        let mut constant = DVector::zeros(rows);
        let mut offset = 0;
        for part in parts {
            for (id, m) in &part.coeffs {
                let entry = blocks
                    .entry(*id)
                    .or_insert_with(|| (m.ncols(), Triplets::new(rows, m.ncols())));
                entry.1.push_block(m, offset, 0);
            }
            constant
                .rows_mut(offset, part.size())
                .copy_from(&part.constant);
            offset += part.size();
        }
        AffineExpr {
            coeffs: blocks.into_iter().map(|(id, (_, t))| (id, t.build())).collect(),
            constant,
            shape,
        }
    }

    /// Evaluate at the given variable values.
    pub fn eval(&self, values: &BTreeMap<ExprId, DVector<f64>>) -> Option<DVector<f64>> {
        let mut out = self.constant.clone();
        for (id, m) in &self.coeffs {
            out += csc_mul_vec(m, values.get(id)?);
        }
        Some(out)
    }
}

/// A scalar quadratic function of the problem variables.
#[derive(Debug, Clone)]
pub struct QuadraticExpr {
    /// `(var_i, var_j) -> Qᵢⱼ`, contributing `xᵢᵀ Qᵢⱼ xⱼ`.
    pub quad: BTreeMap<(ExprId, ExprId), CscMatrix<f64>>,
    /// Linear part and constant `r`, always scalar.
    pub linear: AffineExpr,
}

impl QuadraticExpr {
    pub fn from_affine(linear: AffineExpr) -> Self {
        debug_assert_eq!(linear.size(), 1);
        QuadraticExpr {
            quad: BTreeMap::new(),
            linear: linear.with_shape(Shape::scalar()),
        }
    }

    /// `uᵀ P u` for an affine `u = Σ Aᵢ xᵢ + d`.
    ///
    /// Expands to `Σᵢⱼ xᵢᵀ AᵢᵀPAⱼ xⱼ + 2 dᵀP Σ Aᵢxᵢ + dᵀPd`.
    pub fn quad_form(u: &AffineExpr, p: &CscMatrix<f64>) -> Self {
        let mut quad = BTreeMap::new();
        let transposed: BTreeMap<ExprId, CscMatrix<f64>> = u
            .coeffs
            .iter()
            .map(|(id, a)| (*id, a.transpose()))
            .collect();
        for (i, ai_t) in &transposed {
            let left = csc_mul(ai_t, p);
            for (j, aj) in &u.coeffs {
                quad.insert((*i, *j), csc_mul(&left, aj));
            }
        }

        let pd = csc_mul_vec(p, &u.constant);
        let mut linear = AffineExpr::scalar(u.constant.dot(&pd));
        for (id, a) in &u.coeffs {
            let q = csc_tr_mul_vec(a, &pd) * 2.0;
            let mut row = Triplets::new(1, q.len());
            for (k, v) in q.iter().enumerate() {
                row.push(0, k, *v);
            }
            linear.coeffs.insert(*id, row.build());
        }
        QuadraticExpr { quad, linear }
    }

    /// `‖u‖²`.
    pub fn sum_squares(u: &AffineExpr) -> Self {
        Self::quad_form(u, &CscMatrix::identity(u.size()))
    }

    pub fn is_linear(&self) -> bool {
        self.quad.is_empty()
    }

    pub fn add(&self, other: &QuadraticExpr) -> Result<QuadraticExpr> {
        let mut quad = self.quad.clone();
        for (key, m) in &other.quad {
            let merged = match quad.remove(key) {
                Some(existing) => csc_add(&existing, m),
                None => m.clone(),
            };
            quad.insert(*key, merged);
        }
        Ok(QuadraticExpr {
            quad,
            linear: self.linear.add(&other.linear)?,
        })
    }

    pub fn scale(&self, s: f64) -> QuadraticExpr {
        QuadraticExpr {
            quad: self
                .quad
                .iter()
                .map(|(k, m)| (*k, csc_scale(m, s)))
                .collect(),
            linear: self.linear.scale(s),
        }
    }

    pub fn neg(&self) -> QuadraticExpr {
        self.scale(-1.0)
    }

    /// Every variable with a linear or quadratic term.
    pub fn variables(&self) -> Vec<ExprId> {
        let mut ids: Vec<ExprId> = self
            .quad
            .keys()
            .flat_map(|(i, j)| [*i, *j])
            .chain(self.linear.coeffs.keys().copied())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Evaluate at the given variable values.
    pub fn eval(&self, values: &BTreeMap<ExprId, DVector<f64>>) -> Option<f64> {
        let mut total = self.linear.eval(values)?[0];
        for ((i, j), q) in &self.quad {
            let xi = values.get(i)?;
            total += xi.dot(&csc_mul_vec(q, values.get(j)?));
        }
        Some(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::dense_to_csc;

    fn values(pairs: &[(ExprId, Vec<f64>)]) -> BTreeMap<ExprId, DVector<f64>> {
        pairs
            .iter()
            .map(|(id, v)| (*id, DVector::from_vec(v.clone())))
            .collect()
    }

    #[test]
    fn test_variable_and_constant() {
        let id = ExprId::new();
        let x = AffineExpr::variable(id, Shape::vector(3));
        assert_eq!(x.size(), 3);
        assert!(!x.is_constant());
        assert!(AffineExpr::scalar(2.0).is_constant());
        assert_eq!(x.variables(), vec![id]);
    }

    #[test]
    fn test_add_broadcasts_scalar() {
        let id = ExprId::new();
        let x = AffineExpr::variable(id, Shape::vector(3));
        let y = x.add(&AffineExpr::scalar(1.0)).unwrap();
        assert_eq!(y.shape, Shape::vector(3));
        let v = y.eval(&values(&[(id, vec![1.0, 2.0, 3.0])])).unwrap();
        assert_eq!(v.as_slice(), &[2.0, 3.0, 4.0]);

        let z = AffineExpr::variable(ExprId::new(), Shape::vector(2));
        assert!(x.add(&z).is_err());
    }

    #[test]
    fn test_add_merges_same_variable() {
        let id = ExprId::new();
        let x = AffineExpr::variable(id, Shape::vector(2));
        let two_x = x.add(&x).unwrap();
        assert_eq!(two_x.coeffs.len(), 1);
        let v = two_x.eval(&values(&[(id, vec![1.0, -1.0])])).unwrap();
        assert_eq!(v.as_slice(), &[2.0, -2.0]);
    }

    #[test]
    fn test_scale_rows_and_sum() {
        let id = ExprId::new();
        let x = AffineExpr::variable(id, Shape::vector(3));
        let scaled = x.scale_rows(&DVector::from_vec(vec![1.0, 2.0, 3.0]));
        let total = scaled.sum();
        assert_eq!(total.shape, Shape::scalar());
        let v = total.eval(&values(&[(id, vec![1.0, 1.0, 1.0])])).unwrap();
        assert_eq!(v[0], 6.0);
    }

    #[test]
    fn test_concat() {
        let a = ExprId::new();
        let b = ExprId::new();
        let x = AffineExpr::variable(a, Shape::vector(2));
        let y = AffineExpr::variable(b, Shape::scalar()).add(&AffineExpr::scalar(5.0)).unwrap();
        let c = AffineExpr::concat(&[x, y], Shape::vector(3));
        let v = c
            .eval(&values(&[(a, vec![1.0, 2.0]), (b, vec![3.0])]))
            .unwrap();
        assert_eq!(v.as_slice(), &[1.0, 2.0, 8.0]);
    }

    #[test]
    fn test_quad_form_expansion() {
        let id = ExprId::new();
        // u = x - 1
        let u = AffineExpr::variable(id, Shape::vector(2))
            .add(&AffineExpr::scalar(-1.0))
            .unwrap();
        let p = dense_to_csc(&DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 3.0]));
        let q = QuadraticExpr::quad_form(&u, &p);
        assert!(!q.is_linear());
        // x = (2, 3): u = (1, 2), uᵀPu = 2 + 12
        let v = q.eval(&values(&[(id, vec![2.0, 3.0])])).unwrap();
        assert!((v - 14.0).abs() < 1e-12);
    }

    #[test]
    fn test_quadratic_add_and_scale() {
        let id = ExprId::new();
        let x = AffineExpr::variable(id, Shape::vector(2));
        let q = QuadraticExpr::sum_squares(&x)
            .add(&QuadraticExpr::from_affine(x.sum()))
            .unwrap()
            .scale(2.0);
        assert_eq!(q.variables(), vec![id]);
        let v = q.eval(&values(&[(id, vec![1.0, 2.0])])).unwrap();
        assert!((v - 16.0).abs() < 1e-12);
    }
}
