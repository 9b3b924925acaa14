//! Error types for cvxpipe.
//!
//! Solver outcomes (infeasible, unbounded, inaccurate, ...) are *not* errors:
//! they are reported through [`crate::SolveStatus`] on a returned solution.
//! `Error` covers problems that stop the pipeline before a solver runs, or
//! misuse of the data-level API.

use thiserror::Error;

/// Error type for cvxpipe operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The problem violates the DCP composition rules.
    #[error("problem is not DCP: {}", .violations.join("; "))]
    NotDcp { violations: Vec<String> },

    /// Two shapes that must agree do not.
    #[error("shape mismatch in {context}: expected {expected}, got {got}")]
    ShapeMismatch {
        context: String,
        expected: String,
        got: String,
    },

    /// A parameter was used before a value was assigned.
    #[error("parameter {0} has no value")]
    ParameterUnset(String),

    /// Invalid problem specification.
    #[error("invalid problem: {0}")]
    InvalidProblem(String),

    /// Problem data handed to a solver is inconsistent.
    #[error("invalid problem data: {0}")]
    InvalidData(String),

    /// A solver was requested by a name the registry does not know.
    #[error("unknown solver '{0}'")]
    UnknownSolver(String),

    /// The requested solver cannot handle this problem class.
    #[error("solver '{solver}' does not support {kind} problems")]
    SolverIncompatible { solver: String, kind: String },

    /// No registered solver can handle this problem class.
    #[error("no available solver supports {kind} problems")]
    NoSolver { kind: String },

    /// The backend failed before producing a status.
    #[error("solver error: {0}")]
    Solver(String),

    /// A value was requested that the solution does not carry.
    #[error("value unavailable: {0}")]
    ValueUnavailable(String),
}

impl Error {
    pub(crate) fn shape(
        context: impl Into<String>,
        expected: impl ToString,
        got: impl ToString,
    ) -> Self {
        Error::ShapeMismatch {
            context: context.into(),
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }
}

/// Result type for cvxpipe operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_dcp_message_joins_violations() {
        let err = Error::NotDcp {
            violations: vec!["objective is concave".into(), "constraint[0] is convex".into()],
        };
        assert_eq!(
            err.to_string(),
            "problem is not DCP: objective is concave; constraint[0] is convex"
        );
    }

    #[test]
    fn test_shape_helper() {
        let err = Error::shape("add", "(3,)", "(4,)");
        assert_eq!(err.to_string(), "shape mismatch in add: expected (3,), got (4,)");
    }
}
