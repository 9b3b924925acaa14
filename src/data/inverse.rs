//! What it takes to map a raw solver result back onto the user's problem.

use std::ops::Range;

use nalgebra::DVector;
use nalgebra_sparse::CscMatrix;

use crate::expr::{ExprId, Shape};
use crate::sparse::upper_quad_form;

/// Position of a user variable in the solver's `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSlot {
    pub id: ExprId,
    /// Name, or `var{id}` when unnamed.
    pub name: String,
    pub shape: Shape,
    /// First column of the variable in `x`.
    pub offset: usize,
}

impl VariableSlot {
    pub fn columns(&self) -> Range<usize> {
        self.offset..self.offset + self.shape.size()
    }
}

/// Which block of the problem data a constraint lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowBlock {
    /// Rows of `A`; duals come from `y`.
    Equality,
    /// Rows of `G`; duals come from `z`.
    Cone,
}

/// Rows occupied by one user constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintRows {
    pub block: RowBlock,
    pub start: usize,
    pub len: usize,
}

impl ConstraintRows {
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }
}

/// Inverse mapping produced alongside `ProblemData`.
#[derive(Debug, Clone, PartialEq)]
pub struct InverseData {
    /// User variables in column order. Auxiliary columns follow them.
    pub variables: Vec<VariableSlot>,
    /// Total columns, auxiliary variables included.
    pub num_columns: usize,
    /// Total rows of `A` and `G`.
    pub num_rows: usize,
    /// Rows of `A`. Cone rows are `num_rows - num_eq_rows`.
    pub num_eq_rows: usize,
    /// `1.0` for minimize, `-1.0` for maximize.
    pub objective_sign: f64,
    /// Cost of the minimized objective: `½xᵀPx + cᵀx + offset`.
    pub p: Option<CscMatrix<f64>>,
    pub c: DVector<f64>,
    pub offset: f64,
    /// One entry per user constraint, in order.
    pub constraints: Vec<ConstraintRows>,
}

impl InverseData {
    pub fn slot(&self, id: ExprId) -> Option<&VariableSlot> {
        self.variables.iter().find(|v| v.id == id)
    }

    /// Objective value in the user's sense at the solver point `x`.
    pub fn objective_value(&self, x: &DVector<f64>) -> f64 {
        let quad = self.p.as_ref().map_or(0.0, |p| 0.5 * upper_quad_form(p, x));
        self.objective_sign * (quad + self.c.dot(x) + self.offset)
    }

    /// Columns belonging to auxiliary variables.
    pub fn num_aux(&self) -> usize {
        let user: usize = self.variables.iter().map(|v| v.shape.size()).sum();
        self.num_columns - user
    }
}
