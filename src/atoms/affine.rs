//! Affine atoms.

use std::sync::Arc;

use crate::expr::{Expr, IndexSpec, Shape};

fn unary(expr: &Expr, build: impl FnOnce(Arc<Expr>) -> Expr) -> Expr {
    build(Arc::new(expr.clone()))
}

fn stack(exprs: impl IntoIterator<Item = Expr>) -> Vec<Arc<Expr>> {
    exprs.into_iter().map(Arc::new).collect()
}

/// Sum of all entries.
pub fn sum(expr: &Expr) -> Expr {
    unary(expr, |e| Expr::Sum(e, None))
}

/// Sum along `axis`: 0 sums each column, 1 sums each row.
pub fn sum_axis(expr: &Expr, axis: usize) -> Expr {
    unary(expr, |e| Expr::Sum(e, Some(axis)))
}

/// Reinterpret the column-major data with a new shape of the same size.
pub fn reshape(expr: &Expr, shape: impl Into<Shape>) -> Expr {
    let shape = shape.into();
    unary(expr, |e| Expr::Reshape(e, shape))
}

/// Column-major flattening into a vector.
pub fn flatten(expr: &Expr) -> Expr {
    reshape(expr, Shape::vector(expr.shape().size()))
}

pub fn transpose(expr: &Expr) -> Expr {
    unary(expr, Expr::Transpose)
}

pub fn trace(expr: &Expr) -> Expr {
    unary(expr, Expr::Trace)
}

/// Vertical concatenation. Vectors and scalars concatenate into a longer
/// vector; matrices stack by rows.
pub fn vstack(exprs: impl IntoIterator<Item = Expr>) -> Expr {
    Expr::VStack(stack(exprs))
}

/// Horizontal concatenation. Vectors act as columns.
pub fn hstack(exprs: impl IntoIterator<Item = Expr>) -> Expr {
    Expr::HStack(stack(exprs))
}

/// Matrix product. A vector on the left acts as a row vector, so
/// `matmul(&a, &b)` of two vectors is their inner product.
pub fn matmul(a: &Expr, b: &Expr) -> Expr {
    Expr::MatMul(Arc::new(a.clone()), Arc::new(b.clone()))
}

/// Elementwise (or scalar) product, same as `a * b`.
pub fn multiply(a: &Expr, b: &Expr) -> Expr {
    Expr::Mul(Arc::new(a.clone()), Arc::new(b.clone()))
}

/// Inner product `sum(a .* b)`.
pub fn dot(a: &Expr, b: &Expr) -> Expr {
    sum(&multiply(a, b))
}

/// Entry `i` of the column-major flattening, as a scalar.
pub fn index(expr: &Expr, i: usize) -> Expr {
    unary(expr, |e| Expr::Index(e, IndexSpec::element(i)))
}

/// Entries `start..stop` of the column-major flattening.
pub fn slice(expr: &Expr, start: usize, stop: usize) -> Expr {
    unary(expr, |e| Expr::Index(e, IndexSpec::range(start, stop)))
}

/// Entries `start, start + step, ..` below `stop`.
pub fn slice_step(expr: &Expr, start: usize, stop: usize, step: usize) -> Expr {
    unary(expr, |e| Expr::Index(e, IndexSpec { start, stop, step }))
}

/// Cumulative sum over the column-major flattening.
pub fn cumsum(expr: &Expr) -> Expr {
    unary(expr, |e| Expr::Cumsum(e, None))
}

/// Cumulative sum down each column (axis 0) or along each row (axis 1).
pub fn cumsum_axis(expr: &Expr, axis: usize) -> Expr {
    unary(expr, |e| Expr::Cumsum(e, Some(axis)))
}

/// Diagonal matrix from a vector, or the diagonal of a square matrix.
pub fn diag(expr: &Expr) -> Expr {
    unary(expr, Expr::Diag)
}
