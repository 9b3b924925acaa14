//! Solver interface for cvxpipe.
//!
//! This module provides:
//! - Settings and solve statuses
//! - Problem classification and the solver registry
//! - Clarabel solver integration

pub mod clarabel;
pub mod dispatch;
pub mod settings;
pub mod status;

pub use self::clarabel::ClarabelBackend;
pub use dispatch::{
    ProblemClass, ProblemKind, RawSolution, SolverBackend, SolverRegistry, SolvingChain,
};
pub use settings::Settings;
pub use status::SolveStatus;
