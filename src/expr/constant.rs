//! Constant construction.

use nalgebra::DMatrix;
use nalgebra_sparse::CscMatrix;

use super::array::Array;
use super::expression::{ConstantData, Expr, ExprId};
use super::shape::Shape;

fn leaf(value: Array, shape: Shape) -> Expr {
    Expr::Constant(ConstantData {
        id: ExprId::new(),
        value,
        shape,
    })
}

pub fn constant(value: f64) -> Expr {
    leaf(Array::Scalar(value), Shape::scalar())
}

/// A vector constant of shape `(n,)`.
pub fn constant_vec(values: Vec<f64>) -> Expr {
    let shape = Shape::vector(values.len());
    leaf(Array::from_vec(values), shape)
}

/// A matrix constant from column-major data.
pub fn constant_matrix(values: Vec<f64>, rows: usize, cols: usize) -> Expr {
    constant_dmatrix(DMatrix::from_vec(rows, cols, values))
}

pub fn constant_dmatrix(matrix: DMatrix<f64>) -> Expr {
    let shape = Shape::matrix(matrix.nrows(), matrix.ncols());
    leaf(Array::Dense(matrix), shape)
}

pub fn constant_sparse(matrix: CscMatrix<f64>) -> Expr {
    let shape = Shape::matrix(matrix.nrows(), matrix.ncols());
    leaf(Array::Sparse(matrix), shape)
}

fn filled(shape: Shape, v: f64) -> Expr {
    if shape.is_scalar() {
        leaf(Array::Scalar(v), shape)
    } else {
        leaf(
            Array::Dense(DMatrix::from_element(shape.rows(), shape.cols(), v)),
            shape,
        )
    }
}

pub fn zeros(shape: impl Into<Shape>) -> Expr {
    filled(shape.into(), 0.0)
}

pub fn ones(shape: impl Into<Shape>) -> Expr {
    filled(shape.into(), 1.0)
}

pub fn eye(n: usize) -> Expr {
    constant_dmatrix(DMatrix::identity(n, n))
}

/// Conversion of plain numeric data into a constant expression.
pub trait IntoConstant {
    fn into_constant(self) -> Expr;
}

impl IntoConstant for f64 {
    fn into_constant(self) -> Expr {
        constant(self)
    }
}

impl IntoConstant for Vec<f64> {
    fn into_constant(self) -> Expr {
        constant_vec(self)
    }
}

impl IntoConstant for &[f64] {
    fn into_constant(self) -> Expr {
        constant_vec(self.to_vec())
    }
}

impl IntoConstant for DMatrix<f64> {
    fn into_constant(self) -> Expr {
        constant_dmatrix(self)
    }
}

impl IntoConstant for CscMatrix<f64> {
    fn into_constant(self) -> Expr {
        constant_sparse(self)
    }
}

impl From<Vec<f64>> for Expr {
    fn from(values: Vec<f64>) -> Self {
        constant_vec(values)
    }
}

impl From<DMatrix<f64>> for Expr {
    fn from(matrix: DMatrix<f64>) -> Self {
        constant_dmatrix(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_shapes() {
        assert_eq!(constant(5.0).shape(), Shape::scalar());
        assert_eq!(constant_vec(vec![1.0, 2.0, 3.0]).shape(), Shape::vector(3));
        assert_eq!(zeros((3, 4)).shape(), Shape::matrix(3, 4));
        assert_eq!(ones(5).shape(), Shape::vector(5));
        assert_eq!(eye(3).shape(), Shape::matrix(3, 3));
        assert_eq!(
            constant_sparse(CscMatrix::identity(2)).shape(),
            Shape::matrix(2, 2)
        );
    }

    #[test]
    fn test_matrix_is_column_major() {
        let c = constant_matrix(vec![1.0, 2.0, 3.0, 4.0], 2, 2);
        let dense = c.constant_value().unwrap().to_dense();
        assert_eq!(dense[(1, 0)], 2.0);
        assert_eq!(dense[(0, 1)], 3.0);
    }

    #[test]
    fn test_zeros_have_both_signs() {
        let z = zeros(4);
        let value = z.constant_value().unwrap();
        assert!(value.is_nonneg());
        assert!(value.is_nonpos());
    }
}
