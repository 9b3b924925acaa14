//! Atoms: the functions expressions are built from.

pub mod affine;
pub mod nonlinear;
mod ops;

pub use affine::{
    cumsum, cumsum_axis, diag, dot, flatten, hstack, index, matmul, multiply, reshape, slice,
    slice_step, sum, sum_axis, trace, transpose, vstack,
};
pub use nonlinear::{
    abs, entropy, exp, inv_pos, log, log_sum_exp, logistic, max2, maximum, min2, minimum,
    neg_part, norm, norm1, norm2, norm_inf, pos, power, quad_form, quad_over_lin, sqrt,
    sum_squares, try_norm,
};
