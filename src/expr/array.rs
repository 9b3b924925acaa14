//! Numeric storage for constants and parameter values.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CscMatrix;

use super::shape::Shape;
use crate::sparse::csc_to_dense;

/// Tolerance used for symmetry and eigenvalue sign checks.
const DEFINITENESS_TOL: f64 = 1e-9;

/// Dense, sparse or scalar numeric data.
#[derive(Debug, Clone, PartialEq)]
pub enum Array {
    Scalar(f64),
    Dense(DMatrix<f64>),
    Sparse(CscMatrix<f64>),
}

/// Definiteness of a symmetric matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Definiteness {
    /// Positive semidefinite.
    Psd,
    /// Negative semidefinite.
    Nsd,
    /// Indefinite, non-square, or non-symmetric.
    Indefinite,
}

impl Array {
    /// Natural shape of the storage (dense data is always 2-D).
    pub fn shape(&self) -> Shape {
        let (m, n) = self.dims();
        match self {
            Array::Scalar(_) => Shape::scalar(),
            _ => Shape::matrix(m, n),
        }
    }

    /// (rows, cols) of the storage; scalars are 1x1.
    pub fn dims(&self) -> (usize, usize) {
        match self {
            Array::Scalar(_) => (1, 1),
            Array::Dense(m) => (m.nrows(), m.ncols()),
            Array::Sparse(m) => (m.nrows(), m.ncols()),
        }
    }

    pub fn size(&self) -> usize {
        let (m, n) = self.dims();
        m * n
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Array::Scalar(v) => Some(*v),
            Array::Dense(m) if m.len() == 1 => Some(m[(0, 0)]),
            Array::Sparse(m) if m.nrows() * m.ncols() == 1 => {
                Some(m.values().first().copied().unwrap_or(0.0))
            }
            _ => None,
        }
    }

    pub fn is_nonneg(&self) -> bool {
        match self {
            Array::Scalar(v) => *v >= 0.0,
            Array::Dense(m) => m.iter().all(|&v| v >= 0.0),
            // implicit zeros are nonnegative
            Array::Sparse(m) => m.values().iter().all(|&v| v >= 0.0),
        }
    }

    pub fn is_nonpos(&self) -> bool {
        match self {
            Array::Scalar(v) => *v <= 0.0,
            Array::Dense(m) => m.iter().all(|&v| v <= 0.0),
            Array::Sparse(m) => m.values().iter().all(|&v| v <= 0.0),
        }
    }

    /// Dense copy of the data.
    pub fn to_dense(&self) -> DMatrix<f64> {
        match self {
            Array::Scalar(v) => DMatrix::from_element(1, 1, *v),
            Array::Dense(m) => m.clone(),
            Array::Sparse(m) => csc_to_dense(m),
        }
    }

    /// Column-major flattening.
    pub fn flatten(&self) -> DVector<f64> {
        let dense = self.to_dense();
        DVector::from_column_slice(dense.as_slice())
    }

    /// Classify a square matrix by the signs of its eigenvalues.
    pub fn definiteness(&self) -> Definiteness {
        if let Array::Scalar(v) = self {
            return if *v >= 0.0 {
                Definiteness::Psd
            } else {
                Definiteness::Nsd
            };
        }
        let m = self.to_dense();
        if m.nrows() != m.ncols() || !is_symmetric(&m) {
            return Definiteness::Indefinite;
        }
        let scale = m.amax().max(1.0);
        let eigenvalues = m.symmetric_eigenvalues();
        if eigenvalues.iter().all(|&l| l >= -DEFINITENESS_TOL * scale) {
            Definiteness::Psd
        } else if eigenvalues.iter().all(|&l| l <= DEFINITENESS_TOL * scale) {
            Definiteness::Nsd
        } else {
            Definiteness::Indefinite
        }
    }

    pub fn from_vec(values: Vec<f64>) -> Self {
        let n = values.len();
        Array::Dense(DMatrix::from_vec(n, 1, values))
    }
}

pub(crate) fn is_symmetric(m: &DMatrix<f64>) -> bool {
    let scale = m.amax().max(1.0);
    (0..m.nrows()).all(|i| {
        (i + 1..m.ncols()).all(|j| (m[(i, j)] - m[(j, i)]).abs() <= DEFINITENESS_TOL * scale)
    })
}

impl From<f64> for Array {
    fn from(v: f64) -> Self {
        Array::Scalar(v)
    }
}

impl From<Vec<f64>> for Array {
    fn from(v: Vec<f64>) -> Self {
        Array::from_vec(v)
    }
}

impl From<&[f64]> for Array {
    fn from(v: &[f64]) -> Self {
        Array::from_vec(v.to_vec())
    }
}

impl From<DMatrix<f64>> for Array {
    fn from(m: DMatrix<f64>) -> Self {
        Array::Dense(m)
    }
}

impl From<DVector<f64>> for Array {
    fn from(v: DVector<f64>) -> Self {
        let n = v.len();
        Array::Dense(v.reshape_generic(nalgebra::Dyn(n), nalgebra::Dyn(1)))
    }
}

impl From<CscMatrix<f64>> for Array {
    fn from(m: CscMatrix<f64>) -> Self {
        Array::Sparse(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_queries() {
        let a = Array::Scalar(-2.0);
        assert_eq!(a.as_scalar(), Some(-2.0));
        assert!(a.is_nonpos());
        assert!(!a.is_nonneg());
        assert_eq!(a.dims(), (1, 1));
    }

    #[test]
    fn test_flatten_is_column_major() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let flat = Array::Dense(m).flatten();
        assert_eq!(flat.as_slice(), &[1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn test_definiteness() {
        let psd = Array::Dense(DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 2.0]));
        assert_eq!(psd.definiteness(), Definiteness::Psd);

        // singular PSD matrices are still PSD
        let singular = Array::Dense(DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]));
        assert_eq!(singular.definiteness(), Definiteness::Psd);

        let nsd = Array::Dense(-DMatrix::<f64>::identity(3, 3));
        assert_eq!(nsd.definiteness(), Definiteness::Nsd);

        let indefinite = Array::Dense(DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, -1.0]));
        assert_eq!(indefinite.definiteness(), Definiteness::Indefinite);

        let asymmetric = Array::Dense(DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 0.0, 1.0]));
        assert_eq!(asymmetric.definiteness(), Definiteness::Indefinite);
    }

    #[test]
    fn test_sparse_sign() {
        let sparse = CscMatrix::identity(3);
        let a = Array::Sparse(sparse);
        assert!(a.is_nonneg());
        assert_eq!(a.to_dense(), DMatrix::identity(3, 3));
    }
}
