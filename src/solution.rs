//! Solutions mapped back onto the user's variables and constraints.

use std::collections::BTreeMap;
use std::time::Duration;

use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};
use crate::expr::{Expr, ExprId};
use crate::solver::SolveStatus;

/// Wall-clock time spent in each pipeline stage. Stages that did not run
/// (e.g. verification on the bypass path) stay zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageTimings {
    pub verify: Duration,
    pub canonicalize: Duration,
    pub dispatch: Duration,
    pub solve: Duration,
    pub unpack: Duration,
}

impl StageTimings {
    pub fn total(&self) -> Duration {
        self.verify + self.canonicalize + self.dispatch + self.solve + self.unpack
    }
}

/// Solver and problem statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolveStats {
    pub solver: String,
    pub iterations: u32,
    /// Seconds reported by the solver itself.
    pub solver_time: f64,
    pub timings: StageTimings,
    /// Columns of the compiled problem, auxiliary ones included.
    pub num_variables: usize,
    /// Rows of the compiled problem.
    pub num_constraints: usize,
}

/// Result of solving a problem.
///
/// A `Solution` is returned for every solver outcome; check [`status`]
/// before reading values.
///
/// [`status`]: Solution::status
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolveStatus,
    /// Objective value. `±∞` for infeasible or unbounded problems, `None`
    /// when the solver gave no answer.
    pub value: Option<f64>,
    pub(crate) primal: BTreeMap<ExprId, DMatrix<f64>>,
    pub(crate) names: BTreeMap<String, ExprId>,
    pub(crate) duals: Vec<DVector<f64>>,
    pub stats: SolveStats,
}

impl Solution {
    /// Value of the variable with id `id`, laid out in its shape (vectors as
    /// columns, scalars as 1x1).
    pub fn primal(&self, id: ExprId) -> Option<&DMatrix<f64>> {
        self.primal.get(&id)
    }

    pub fn get(&self, var: &Expr) -> Option<&DMatrix<f64>> {
        self.primal(var.variable_id()?)
    }

    /// Value of a variable looked up by its name.
    pub fn by_name(&self, name: &str) -> Option<&DMatrix<f64>> {
        self.names.get(name).and_then(|id| self.primal(*id))
    }

    /// Value of a single-element variable.
    ///
    /// # Errors
    ///
    /// `InvalidProblem` when `var` is not a variable, `ValueUnavailable` when
    /// the solution carries no value for it, `ShapeMismatch` when it has
    /// more than one element.
    pub fn scalar(&self, var: &Expr) -> Result<f64> {
        let id = var
            .variable_id()
            .ok_or_else(|| Error::InvalidProblem(format!("`{}` is not a variable", var)))?;
        let m = self
            .primal(id)
            .ok_or_else(|| Error::ValueUnavailable(format!("no value for `{}`", var)))?;
        if m.len() != 1 {
            return Err(Error::shape("Solution::scalar", "one element", var.shape()));
        }
        Ok(m[(0, 0)])
    }

    /// Dual values of user constraint `i`, in that constraint's row order.
    pub fn constraint_dual(&self, i: usize) -> Option<&DVector<f64>> {
        self.duals.get(i)
    }

    /// Duals of every user constraint, in order. Empty without a solution.
    pub fn duals(&self) -> &[DVector<f64>] {
        &self.duals
    }

    pub fn has_duals(&self) -> bool {
        !self.duals.is_empty()
    }
}

impl std::ops::Index<&Expr> for Solution {
    type Output = DMatrix<f64>;

    /// Value of a variable; see [`Solution::get`] for the fallible version.
    ///
    /// # Panics
    ///
    /// Panics if the solution has no value for `var`.
    fn index(&self, var: &Expr) -> &DMatrix<f64> {
        match self.get(var) {
            Some(m) => m,
            None => panic!("no value for `{}` in this solution", var),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{named_variable, variable};

    fn sample(x: &Expr) -> Solution {
        let id = x.variable_id().unwrap();
        let mut primal = BTreeMap::new();
        primal.insert(id, DMatrix::from_element(1, 1, 3.0));
        let mut names = BTreeMap::new();
        names.insert("x".to_string(), id);
        Solution {
            status: SolveStatus::Optimal,
            value: Some(3.0),
            primal,
            names,
            duals: vec![DVector::from_element(1, 1.0)],
            stats: SolveStats::default(),
        }
    }

    #[test]
    fn test_lookup() {
        let x = named_variable("x", ());
        let sol = sample(&x);
        assert_eq!(sol.scalar(&x).unwrap(), 3.0);
        assert_eq!(sol[&x][(0, 0)], 3.0);
        assert_eq!(sol.by_name("x").unwrap()[(0, 0)], 3.0);
        assert!(sol.by_name("y").is_none());
        assert_eq!(sol.constraint_dual(0).unwrap()[0], 1.0);
        assert!(sol.constraint_dual(1).is_none());
    }

    #[test]
    fn test_missing_variable() {
        let x = named_variable("x", ());
        let sol = sample(&x);
        let y = variable(());
        assert!(sol.get(&y).is_none());
        assert!(matches!(sol.scalar(&y), Err(Error::ValueUnavailable(_))));
        assert!(sol.scalar(&(&x + 1.0)).is_err());
    }

    #[test]
    fn test_timings_total() {
        let t = StageTimings {
            verify: Duration::from_millis(1),
            solve: Duration::from_millis(2),
            ..Default::default()
        };
        assert_eq!(t.total(), Duration::from_millis(3));
    }
}
