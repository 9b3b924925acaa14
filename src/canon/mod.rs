//! Canonicalization transforms expressions into conic standard form.
//!
//! This module converts DCP problems into:
//! - Affine expressions (`AffineExpr`) for affine parts
//! - Quadratic expressions (`QuadraticExpr`) for QP objectives
//! - Cone constraints (`ConeConstraint`) for nonlinear atoms

pub mod canonicalizer;
pub mod cone;
pub mod lin_expr;
pub mod linop;

pub use canonicalizer::{canonicalize, CanonProblem};
pub use cone::ConeConstraint;
pub use lin_expr::{AffineExpr, QuadraticExpr};
