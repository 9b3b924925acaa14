//! DCP analysis: sign, curvature, monotonicity and problem verification.

pub mod curvature;
pub mod sign;
pub mod verify;

pub use curvature::{
    add_curvature, compose, composes, matrix_definiteness, scale_curvature, Curvature,
    Monotonicity,
};
pub use sign::{add_sign, mul_sign, Sign};
pub use verify::{verify, DcpReport, DcpViolation};
