//! Sparse linear operators on column-major flattened data.
//!
//! Each function returns the matrix `L` such that `vec(f(X)) = L vec(X)`.
//! Affine atoms are canonicalized by applying these to an [`AffineExpr`].
//!
//! [`AffineExpr`]: super::AffineExpr

use nalgebra::DMatrix;
use nalgebra_sparse::CscMatrix;

use crate::sparse::Triplets;

/// `1 x n` row of ones.
pub fn sum_all(n: usize) -> CscMatrix<f64> {
    let mut t = Triplets::new(1, n);
    for j in 0..n {
        t.push(0, j, 1.0);
    }
    t.build()
}

/// Column sums (axis 0) or row sums (axis 1) of a `rows x cols` matrix.
pub fn sum_axis(rows: usize, cols: usize, axis: usize) -> CscMatrix<f64> {
    let out = if axis == 0 { cols } else { rows };
    let mut t = Triplets::new(out, rows * cols);
    for j in 0..cols {
        for i in 0..rows {
            let target = if axis == 0 { j } else { i };
            t.push(target, j * rows + i, 1.0);
        }
    }
    t.build()
}

/// Pick the given flat positions out of `n` entries.
pub fn select(positions: impl IntoIterator<Item = usize>, n: usize) -> CscMatrix<f64> {
    let positions: Vec<usize> = positions.into_iter().collect();
    let mut t = Triplets::new(positions.len(), n);
    for (k, p) in positions.into_iter().enumerate() {
        t.push(k, p, 1.0);
    }
    t.build()
}

/// Transpose of a `rows x cols` matrix.
pub fn transpose(rows: usize, cols: usize) -> CscMatrix<f64> {
    let mut t = Triplets::new(rows * cols, rows * cols);
    for j in 0..cols {
        for i in 0..rows {
            // (i, j) of X is (j, i) of Xᵀ, which has `cols` rows
            t.push(i * cols + j, j * rows + i, 1.0);
        }
    }
    t.build()
}

/// Trace of an `n x n` matrix.
pub fn trace(n: usize) -> CscMatrix<f64> {
    let mut t = Triplets::new(1, n * n);
    for i in 0..n {
        t.push(0, i * n + i, 1.0);
    }
    t.build()
}

/// Vector of length `n` to the diagonal of an `n x n` matrix.
pub fn diag_embed(n: usize) -> CscMatrix<f64> {
    let mut t = Triplets::new(n * n, n);
    for i in 0..n {
        t.push(i * n + i, i, 1.0);
    }
    t.build()
}

/// Diagonal of an `n x n` matrix.
pub fn diag_extract(n: usize) -> CscMatrix<f64> {
    let mut t = Triplets::new(n, n * n);
    for i in 0..n {
        t.push(i, i * n + i, 1.0);
    }
    t.build()
}

/// Cumulative sum down each column (axis 0) or along each row (axis 1).
pub fn cumsum(rows: usize, cols: usize, axis: usize) -> CscMatrix<f64> {
    let mut t = Triplets::new(rows * cols, rows * cols);
    for j in 0..cols {
        for i in 0..rows {
            let out = j * rows + i;
            if axis == 0 {
                for k in 0..=i {
                    t.push(out, j * rows + k, 1.0);
                }
            } else {
                for k in 0..=j {
                    t.push(out, k * rows + i, 1.0);
                }
            }
        }
    }
    t.build()
}

/// `X -> A X` for `X` with `n` rows and `k` columns, where `A` is `m x n`.
/// This is `I_k ⊗ A`.
pub fn left_matmul(a: &DMatrix<f64>, k: usize) -> CscMatrix<f64> {
    let (m, n) = a.shape();
    let mut t = Triplets::new(m * k, n * k);
    for j in 0..k {
        for l in 0..n {
            for i in 0..m {
                t.push(j * m + i, j * n + l, a[(i, l)]);
            }
        }
    }
    t.build()
}

/// `X -> X B` for `X` with `m` rows, where `B` is `n x k`. This is `Bᵀ ⊗ I_m`.
pub fn right_matmul(b: &DMatrix<f64>, m: usize) -> CscMatrix<f64> {
    let (n, k) = b.shape();
    let mut t = Triplets::new(m * k, m * n);
    for j in 0..k {
        for l in 0..n {
            let blj = b[(l, j)];
            for i in 0..m {
                t.push(j * m + i, l * m + i, blj);
            }
        }
    }
    t.build()
}

/// Reorder the flat concatenation of blocks with `row_counts[k]` rows and
/// `cols` columns into their vertical stack.
pub fn vstack_permutation(row_counts: &[usize], cols: usize) -> CscMatrix<f64> {
    let total_rows: usize = row_counts.iter().sum();
    let n = total_rows * cols;
    let mut t = Triplets::new(n, n);
    let mut flat_offset = 0;
    let mut row_offset = 0;
    for &r in row_counts {
        for j in 0..cols {
            for i in 0..r {
                t.push(j * total_rows + row_offset + i, flat_offset + j * r + i, 1.0);
            }
        }
        flat_offset += r * cols;
        row_offset += r;
    }
    t.build()
}

/// Scaled upper-triangle vectorization of the symmetric part of an `n x n`
/// matrix: column by column, off-diagonal entries scaled by √2 so that the
/// inner product is preserved.
pub fn svec(n: usize) -> CscMatrix<f64> {
    let half_sqrt2 = std::f64::consts::SQRT_2 / 2.0;
    let mut t = Triplets::new(n * (n + 1) / 2, n * n);
    let mut row = 0;
    for j in 0..n {
        for i in 0..=j {
            if i == j {
                t.push(row, j * n + i, 1.0);
            } else {
                t.push(row, j * n + i, half_sqrt2);
                t.push(row, i * n + j, half_sqrt2);
            }
            row += 1;
        }
    }
    t.build()
}
