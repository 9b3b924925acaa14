//! Problem definition and solving API.
//!
//! The `Problem` struct represents an optimization problem with:
//! - An objective (minimize or maximize)
//! - A set of constraints
//!
//! Use the builder pattern to construct problems:
//! ```ignore
//! let solution = Problem::minimize(objective)
//!     .subject_to([constraint1, constraint2])
//!     .solve()?;
//! ```
//!
//! `solve` runs the whole pipeline. For repeated solves of the same
//! structure, fetch the solver data once with
//! [`Problem::get_problem_data_with`] and `CompileOptions::unchecked()`,
//! call [`SolvingChain::solve_via_data`] directly, and map the raw result
//! back with [`Problem::unpack_results`].

use std::collections::BTreeMap;
use std::time::Instant;

use log::{debug, info, warn};
use nalgebra::DMatrix;

use crate::constraints::Constraint;
use crate::data::{compile, CompileOptions, InverseData, ProblemData, RowBlock};
use crate::dcp::{verify, DcpReport};
use crate::error::Result;
use crate::expr::{Expr, ExprId};
use crate::solution::{SolveStats, Solution, StageTimings};
use crate::solver::{RawSolution, Settings, SolveStatus, SolverRegistry, SolvingChain};

/// Objective type for optimization problems.
#[derive(Debug, Clone)]
pub enum Objective {
    /// Minimize the expression.
    Minimize(Expr),
    /// Maximize the expression (internally converted to minimization).
    Maximize(Expr),
}

impl Objective {
    /// Get the expression being optimized.
    pub fn expr(&self) -> &Expr {
        match self {
            Objective::Minimize(e) | Objective::Maximize(e) => e,
        }
    }

    pub fn is_minimize(&self) -> bool {
        matches!(self, Objective::Minimize(_))
    }
}

/// An optimization problem.
#[derive(Debug, Clone)]
pub struct Problem {
    pub objective: Objective,
    pub constraints: Vec<Constraint>,
}

impl Problem {
    /// Create a minimization problem.
    pub fn minimize(expr: Expr) -> ProblemBuilder {
        ProblemBuilder {
            objective: Objective::Minimize(expr),
            constraints: Vec::new(),
        }
    }

    /// Create a maximization problem.
    pub fn maximize(expr: Expr) -> ProblemBuilder {
        ProblemBuilder {
            objective: Objective::Maximize(expr),
            constraints: Vec::new(),
        }
    }

    /// Full DCP report, listing every violation.
    pub fn report(&self) -> DcpReport {
        verify(self)
    }

    /// `Err(Error::NotDcp)` naming every violation, `Ok` otherwise.
    pub fn verify(&self) -> Result<()> {
        self.report().into_result()
    }

    /// Check if this problem is DCP-compliant.
    ///
    /// A problem is DCP if:
    /// - Minimize: objective is convex
    /// - Maximize: objective is concave
    /// - All constraints are DCP and all shapes agree
    pub fn is_dcp(&self) -> bool {
        self.report().is_dcp()
    }

    /// Ids of every variable in the problem, sorted.
    pub fn variables(&self) -> Vec<ExprId> {
        let mut vars = self.objective.expr().variables();
        for c in &self.constraints {
            vars.extend(c.variables());
        }
        vars.sort();
        vars.dedup();
        vars
    }

    /// Ids of every parameter in the problem, sorted.
    pub fn parameters(&self) -> Vec<ExprId> {
        let mut params = self.objective.expr().parameters();
        for c in &self.constraints {
            for e in c.expressions() {
                params.extend(e.parameters());
            }
        }
        params.sort();
        params.dedup();
        params
    }

    /// Solve the problem with default settings.
    pub fn solve(&self) -> Result<Solution> {
        self.solve_with(Settings::default())
    }

    /// Solve the problem with custom settings and the default registry.
    pub fn solve_with(&self, settings: Settings) -> Result<Solution> {
        self.solve_in(&SolverRegistry::default(), &settings)
    }

    /// Verify, canonicalize, dispatch, solve and unpack.
    ///
    /// Returns `Err` when the problem is not DCP, is malformed, or no
    /// solver can take it. Every solver outcome, including infeasible and
    /// unbounded, is an `Ok` solution with the matching status.
    pub fn solve_in(&self, registry: &SolverRegistry, settings: &Settings) -> Result<Solution> {
        let mut timings = StageTimings::default();

        let start = Instant::now();
        self.verify()?;
        timings.verify = start.elapsed();

        let start = Instant::now();
        let (data, inverse) = compile(self, &CompileOptions::unchecked())?;
        timings.canonicalize = start.elapsed();

        let start = Instant::now();
        let chain = registry.chain(data.class(), settings.solver.as_deref())?;
        timings.dispatch = start.elapsed();

        let start = Instant::now();
        let raw = chain.solve_via_data(&data, settings)?;
        timings.solve = start.elapsed();

        let mut solution = self.unpack_results(&raw, &chain, &inverse);
        timings.unpack = solution.stats.timings.unpack;
        solution.stats.timings = timings;

        debug!(
            "stage timings: verify {:?}, canonicalize {:?}, dispatch {:?}, solve {:?}, unpack {:?}",
            timings.verify, timings.canonicalize, timings.dispatch, timings.solve, timings.unpack
        );
        Ok(solution)
    }

    /// Compile for the default registry, optionally targeting `solver`.
    /// The problem is verified first.
    pub fn get_problem_data(
        &self,
        solver: Option<&str>,
    ) -> Result<(ProblemData, SolvingChain, InverseData)> {
        let options = CompileOptions {
            solver: solver.map(str::to_string),
            verify: true,
        };
        self.get_problem_data_with(&SolverRegistry::default(), &options)
    }

    /// Compile the problem and select a backend without solving.
    ///
    /// With `options.verify == false` the verifier is skipped entirely, so
    /// the caller is responsible for passing a DCP problem.
    pub fn get_problem_data_with(
        &self,
        registry: &SolverRegistry,
        options: &CompileOptions,
    ) -> Result<(ProblemData, SolvingChain, InverseData)> {
        let (data, inverse) = compile(self, options)?;
        let chain = registry.chain(data.class(), options.solver.as_deref())?;
        Ok((data, chain, inverse))
    }

    /// Map a raw solver result back onto this problem's variables and
    /// constraints.
    pub fn unpack_results(
        &self,
        raw: &RawSolution,
        chain: &SolvingChain,
        inverse: &InverseData,
    ) -> Solution {
        let start = Instant::now();
        let status = raw.status;
        let has_values = status.has_solution() && raw.x.len() == inverse.num_columns;
        let has_duals = has_values
            && raw.y.len() == inverse.num_eq_rows
            && raw.z.len() == inverse.num_rows - inverse.num_eq_rows;
        if has_values && !has_duals {
            warn!(
                "{} returned duals of length {}+{}, expected {}+{}; dropping them",
                chain.solver_name(),
                raw.y.len(),
                raw.z.len(),
                inverse.num_eq_rows,
                inverse.num_rows - inverse.num_eq_rows
            );
        }

        let mut primal = BTreeMap::new();
        let mut names = BTreeMap::new();
        for slot in &inverse.variables {
            names.insert(slot.name.clone(), slot.id);
            if has_values {
                let values = raw.x.rows(slot.offset, slot.shape.size());
                primal.insert(
                    slot.id,
                    DMatrix::from_iterator(slot.shape.rows(), slot.shape.cols(), values.iter().copied()),
                );
            }
        }

        let duals = if has_duals {
            inverse
                .constraints
                .iter()
                .map(|rows| {
                    let source = match rows.block {
                        RowBlock::Equality => &raw.y,
                        RowBlock::Cone => &raw.z,
                    };
                    source.rows(rows.start, rows.len).into_owned()
                })
                .collect()
        } else {
            Vec::new()
        };

        let sign = inverse.objective_sign;
        let value = if has_values {
            Some(inverse.objective_value(&raw.x))
        } else if status.is_infeasible() {
            Some(sign * f64::INFINITY)
        } else if status.is_unbounded() {
            Some(-sign * f64::INFINITY)
        } else {
            None
        };

        match status {
            SolveStatus::Optimal => info!("{} solved: optimal value {:?}", chain.solver_name(), value),
            s if s.has_solution() => warn!("{} solved: {} value {:?}", chain.solver_name(), s, value),
            s => info!("{} finished: {}", chain.solver_name(), s),
        }

        let stats = SolveStats {
            solver: raw.solver.clone(),
            iterations: raw.iterations,
            solver_time: raw.solve_time,
            timings: StageTimings {
                unpack: start.elapsed(),
                ..Default::default()
            },
            num_variables: inverse.num_columns,
            num_constraints: inverse.num_rows,
        };

        Solution {
            status,
            value,
            primal,
            names,
            duals,
            stats,
        }
    }
}

/// Builder for constructing problems.
#[derive(Debug, Clone)]
pub struct ProblemBuilder {
    objective: Objective,
    constraints: Vec<Constraint>,
}

impl ProblemBuilder {
    /// Add constraints to the problem.
    pub fn subject_to(mut self, constraints: impl IntoIterator<Item = Constraint>) -> Self {
        self.constraints.extend(constraints);
        self
    }

    /// Add a single constraint.
    pub fn constraint(mut self, c: Constraint) -> Self {
        self.constraints.push(c);
        self
    }

    pub fn build(self) -> Problem {
        Problem {
            objective: self.objective,
            constraints: self.constraints,
        }
    }

    /// Build and solve the problem with default settings.
    pub fn solve(self) -> Result<Solution> {
        self.build().solve()
    }

    /// Build and solve the problem with custom settings.
    pub fn solve_with(self, settings: Settings) -> Result<Solution> {
        self.build().solve_with(settings)
    }
}
