//! # cvxpipe
//!
//! Disciplined Convex Programming (DCP) as an explicit five-stage pipeline:
//!
//! 1. **Build** expressions from variables, parameters, constants and atoms.
//! 2. **Verify** the problem against the DCP composition rules.
//! 3. **Canonicalize** it into conic form and stuff the matrices
//!    `c, P, A, b, G, h`.
//! 4. **Dispatch** the data to a solver chosen from a [`SolverRegistry`].
//! 5. **Unpack** the raw result onto the original variables and constraints.
//!
//! ## Quick Start
//!
//! ```ignore
//! use cvxpipe::prelude::*;
//!
//! let x = variable(5);
//! let a = constant_dmatrix(/* your matrix */);
//! let b = constant_vec(/* your vector */);
//!
//! let solution = Problem::minimize(sum_squares(&(&matmul(&a, &x) - &b)))
//!     .subject_to([x.ge(0.0)])
//!     .solve()?;
//!
//! println!("{}: {:?}", solution.status, solution.value);
//! ```
//!
//! ## Skipping the front of the pipeline
//!
//! When the same problem structure is solved many times, compile once
//! without verification and call the solver directly:
//!
//! ```ignore
//! let problem = Problem::minimize(objective).subject_to(constraints).build();
//! let (data, chain, inverse) =
//!     problem.get_problem_data_with(&SolverRegistry::default(), &CompileOptions::unchecked())?;
//! let raw = chain.solve_via_data(&data, &Settings::default())?;
//! let solution = problem.unpack_results(&raw, &chain, &inverse);
//! ```
//!
//! The result is identical to `problem.solve()`.
//!
//! ## DCP Rules
//!
//! - **Minimization** requires a **convex** objective
//! - **Maximization** requires a **concave** objective
//! - **Equality constraints** require **affine** expressions
//! - `lhs <= rhs` requires convex `lhs` and concave `rhs`
//!
//! ## Problem data
//!
//! The compiled problem is
//!
//! ```text
//! minimize    ½ xᵀPx + cᵀx + offset
//! subject to  Ax = b
//!             Gx + s = h,  s ∈ K
//! ```
//!
//! where `K` is a product of nonnegative, second-order, exponential, power
//! and PSD cones, in that order, described by [`ConeDims`].

pub mod atoms;
pub mod canon;
pub mod constraints;
pub mod data;
pub mod dcp;
pub mod error;
pub mod expr;
pub mod problem;
pub mod solution;
pub mod solver;
pub mod sparse;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use cvxpipe::prelude::*;
/// ```
pub mod prelude {
    pub use crate::expr::{
        constant, constant_dmatrix, constant_matrix, constant_sparse, constant_vec, eye,
        named_variable, nonneg_variable, nonpos_variable, ones, parameter, variable, zeros, Array,
        Expr, ExprId, IntoConstant, ParameterBuilder, Shape, VariableBuilder, VariableExt,
    };

    pub use crate::atoms::{
        abs, cumsum, cumsum_axis, diag, dot, entropy, exp, flatten, hstack, index, inv_pos, log,
        log_sum_exp, logistic, matmul, max2, maximum, min2, minimum, multiply, neg_part, norm,
        norm1, norm2, norm_inf, pos, power, quad_form, quad_over_lin, reshape, slice, slice_step,
        sqrt, sum, sum_axis, sum_squares, trace, transpose, try_norm, vstack,
    };

    pub use crate::constraints::{Constraint, ConstraintExt};

    pub use crate::dcp::{Curvature, DcpReport, Sign};

    pub use crate::problem::{Objective, Problem, ProblemBuilder};

    pub use crate::data::{CompileOptions, ConeDims, ProblemData};

    pub use crate::solver::{
        ProblemClass, ProblemKind, RawSolution, Settings, SolveStatus, SolverBackend,
        SolverRegistry, SolvingChain,
    };

    pub use crate::solution::Solution;

    pub use crate::error::{Error, Result};
}

// Re-export main types at crate root
pub use data::{CompileOptions, ConeDims, InverseData, ProblemData};
pub use error::{Error, Result};
pub use problem::Problem;
pub use solution::Solution;
pub use solver::{Settings, SolveStatus, SolverRegistry, SolvingChain};
