//! Sparse matrix utilities.
//!
//! Thin helpers over nalgebra-sparse used by the canonicalizer and the
//! stuffing step. Everything is column-major and `f64`.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CscMatrix};

/// Accumulates `(row, col, value)` entries and builds a CSC matrix.
///
/// Duplicate entries are summed; explicit zeros are skipped.
#[derive(Debug, Clone)]
pub struct Triplets {
    coo: CooMatrix<f64>,
}

impl Triplets {
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Triplets {
            coo: CooMatrix::new(nrows, ncols),
        }
    }

    pub fn push(&mut self, row: usize, col: usize, value: f64) {
        if value != 0.0 {
            self.coo.push(row, col, value);
        }
    }

    /// Copy every entry of `m`, shifted by `(row_offset, col_offset)`.
    pub fn push_block(&mut self, m: &CscMatrix<f64>, row_offset: usize, col_offset: usize) {
        for (i, j, v) in m.triplet_iter() {
            self.push(row_offset + i, col_offset + j, *v);
        }
    }

    pub fn nnz(&self) -> usize {
        self.coo.nnz()
    }

    pub fn build(&self) -> CscMatrix<f64> {
        CscMatrix::from(&self.coo)
    }
}

/// Convert a dense matrix to CSC format, dropping zeros.
pub fn dense_to_csc(dense: &DMatrix<f64>) -> CscMatrix<f64> {
    let mut t = Triplets::new(dense.nrows(), dense.ncols());
    for j in 0..dense.ncols() {
        for i in 0..dense.nrows() {
            t.push(i, j, dense[(i, j)]);
        }
    }
    t.build()
}

/// Convert CSC to a dense matrix.
pub fn csc_to_dense(sparse: &CscMatrix<f64>) -> DMatrix<f64> {
    let mut dense = DMatrix::zeros(sparse.nrows(), sparse.ncols());
    for (i, j, v) in sparse.triplet_iter() {
        dense[(i, j)] += *v;
    }
    dense
}

/// Multiply every stored value by `scalar`.
pub fn csc_scale(a: &CscMatrix<f64>, scalar: f64) -> CscMatrix<f64> {
    let mut out = a.clone();
    out.values_mut().iter_mut().for_each(|v| *v *= scalar);
    out
}

/// `a + b`; both must have the same dimensions.
pub fn csc_add(a: &CscMatrix<f64>, b: &CscMatrix<f64>) -> CscMatrix<f64> {
    debug_assert_eq!((a.nrows(), a.ncols()), (b.nrows(), b.ncols()));
    let mut t = Triplets::new(a.nrows(), a.ncols());
    t.push_block(a, 0, 0);
    t.push_block(b, 0, 0);
    t.build()
}

/// Sparse product `a * b`.
pub fn csc_mul(a: &CscMatrix<f64>, b: &CscMatrix<f64>) -> CscMatrix<f64> {
    debug_assert_eq!(a.ncols(), b.nrows());
    let mut t = Triplets::new(a.nrows(), b.ncols());
    for j in 0..b.ncols() {
        let col = b.col(j);
        for (&k, &bkj) in col.row_indices().iter().zip(col.values()) {
            let a_col = a.col(k);
            for (&i, &aik) in a_col.row_indices().iter().zip(a_col.values()) {
                t.push(i, j, aik * bkj);
            }
        }
    }
    t.build()
}

/// Sparse matrix times dense vector.
pub fn csc_mul_vec(a: &CscMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    debug_assert_eq!(a.ncols(), x.len());
    let mut y = DVector::zeros(a.nrows());
    for (i, j, v) in a.triplet_iter() {
        y[i] += v * x[j];
    }
    y
}

/// `aᵀ x` without forming the transpose.
pub fn csc_tr_mul_vec(a: &CscMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    debug_assert_eq!(a.nrows(), x.len());
    let mut y = DVector::zeros(a.ncols());
    for (i, j, v) in a.triplet_iter() {
        y[j] += v * x[i];
    }
    y
}

/// Stack matrices with the same column count on top of each other.
pub fn csc_vstack(blocks: &[&CscMatrix<f64>], ncols: usize) -> CscMatrix<f64> {
    let nrows = blocks.iter().map(|b| b.nrows()).sum();
    let mut t = Triplets::new(nrows, ncols);
    let mut offset = 0;
    for b in blocks {
        t.push_block(b, offset, 0);
        offset += b.nrows();
    }
    t.build()
}

/// Upper triangle (diagonal included) of a square matrix.
pub fn csc_upper_triangle(a: &CscMatrix<f64>) -> CscMatrix<f64> {
    let mut t = Triplets::new(a.nrows(), a.ncols());
    for (i, j, v) in a.triplet_iter() {
        if i <= j {
            t.push(i, j, *v);
        }
    }
    t.build()
}

/// True when every stored entry lies on or above the diagonal.
pub fn is_upper_triangular(a: &CscMatrix<f64>) -> bool {
    a.triplet_iter().all(|(i, j, _)| i <= j)
}

/// Symmetric quadratic form `xᵀ P x` for an upper-triangular `P`.
pub fn upper_quad_form(p: &CscMatrix<f64>, x: &DVector<f64>) -> f64 {
    p.triplet_iter()
        .map(|(i, j, v)| {
            if i == j {
                v * x[i] * x[i]
            } else {
                2.0 * v * x[i] * x[j]
            }
        })
        .sum()
}

/// A column vector of ones as an `n x 1` sparse matrix.
pub fn csc_ones_col(n: usize) -> CscMatrix<f64> {
    let mut t = Triplets::new(n, 1);
    for i in 0..n {
        t.push(i, 0, 1.0);
    }
    t.build()
}

/// Convert to Clarabel's CSC representation.
pub fn to_clarabel(a: &CscMatrix<f64>) -> clarabel::algebra::CscMatrix<f64> {
    let (colptr, rowval, nzval) = a.csc_data();
    clarabel::algebra::CscMatrix::new(
        a.nrows(),
        a.ncols(),
        colptr.to_vec(),
        rowval.to_vec(),
        nzval.to_vec(),
    )
}
