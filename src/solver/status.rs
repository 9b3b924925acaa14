//! Solve outcomes.

use std::fmt;

/// Outcome reported by a solver. Never an error: infeasible and unbounded
/// problems are valid answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolveStatus {
    /// Optimal solution found.
    Optimal,
    /// Solution found to reduced accuracy.
    OptimalInaccurate,
    /// Problem is infeasible.
    Infeasible,
    InfeasibleInaccurate,
    /// Problem is unbounded.
    Unbounded,
    UnboundedInaccurate,
    /// An iteration or time limit was hit.
    UserLimit,
    /// Numerical failure or any other solver breakdown.
    SolverError,
}

impl SolveStatus {
    pub fn is_optimal(self) -> bool {
        self == SolveStatus::Optimal
    }

    /// True when primal values are meaningful.
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::OptimalInaccurate)
    }

    pub fn is_inaccurate(self) -> bool {
        matches!(
            self,
            SolveStatus::OptimalInaccurate
                | SolveStatus::InfeasibleInaccurate
                | SolveStatus::UnboundedInaccurate
        )
    }

    pub fn is_infeasible(self) -> bool {
        matches!(
            self,
            SolveStatus::Infeasible | SolveStatus::InfeasibleInaccurate
        )
    }

    pub fn is_unbounded(self) -> bool {
        matches!(
            self,
            SolveStatus::Unbounded | SolveStatus::UnboundedInaccurate
        )
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::OptimalInaccurate => "optimal_inaccurate",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::InfeasibleInaccurate => "infeasible_inaccurate",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::UnboundedInaccurate => "unbounded_inaccurate",
            SolveStatus::UserLimit => "user_limit",
            SolveStatus::SolverError => "solver_error",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        assert!(SolveStatus::Optimal.is_optimal());
        assert!(SolveStatus::OptimalInaccurate.has_solution());
        assert!(!SolveStatus::OptimalInaccurate.is_optimal());
        assert!(!SolveStatus::Infeasible.has_solution());
        assert!(SolveStatus::InfeasibleInaccurate.is_infeasible());
        assert!(SolveStatus::UnboundedInaccurate.is_inaccurate());
        assert_eq!(SolveStatus::UserLimit.to_string(), "user_limit");
    }
}
