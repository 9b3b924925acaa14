//! Variable construction.

use super::expression::{Expr, ExprId, VariableData};
use super::shape::Shape;

/// Builder for variables with a name or sign attribute.
///
/// ```
/// use cvxpipe::expr::VariableBuilder;
///
/// let w = VariableBuilder::vector(4).name("w").nonneg().build();
/// assert_eq!(w.to_string(), "w");
/// ```
#[derive(Debug, Default)]
pub struct VariableBuilder {
    shape: Shape,
    name: Option<String>,
    nonneg: bool,
    nonpos: bool,
}

impl VariableBuilder {
    pub fn new(shape: impl Into<Shape>) -> Self {
        Self {
            shape: shape.into(),
            ..Default::default()
        }
    }

    pub fn scalar() -> Self {
        Self::new(Shape::scalar())
    }

    pub fn vector(n: usize) -> Self {
        Self::new(Shape::vector(n))
    }

    pub fn matrix(m: usize, n: usize) -> Self {
        Self::new(Shape::matrix(m, n))
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Require `x >= 0`. Replaces a previous `nonpos`.
    pub fn nonneg(mut self) -> Self {
        self.nonneg = true;
        self.nonpos = false;
        self
    }

    /// Require `x <= 0`. Replaces a previous `nonneg`.
    pub fn nonpos(mut self) -> Self {
        self.nonpos = true;
        self.nonneg = false;
        self
    }

    pub fn build(self) -> Expr {
        Expr::Variable(VariableData {
            id: ExprId::new(),
            shape: self.shape,
            name: self.name,
            nonneg: self.nonneg,
            nonpos: self.nonpos,
        })
    }
}

/// A fresh variable: `variable(())`, `variable(5)` or `variable((3, 4))`.
pub fn variable(shape: impl Into<Shape>) -> Expr {
    VariableBuilder::new(shape).build()
}

pub fn named_variable(name: impl Into<String>, shape: impl Into<Shape>) -> Expr {
    VariableBuilder::new(shape).name(name).build()
}

pub fn nonneg_variable(shape: impl Into<Shape>) -> Expr {
    VariableBuilder::new(shape).nonneg().build()
}

pub fn nonpos_variable(shape: impl Into<Shape>) -> Expr {
    VariableBuilder::new(shape).nonpos().build()
}

/// Attribute setters on an existing leaf.
///
/// These apply to variables and parameters and leave any other expression
/// untouched. A leaf keeps its id, so handles cloned before the call still
/// refer to the same unknown.
pub trait VariableExt {
    fn nonneg(self) -> Expr;
    fn nonpos(self) -> Expr;
    fn named(self, name: impl Into<String>) -> Expr;
}

impl VariableExt for Expr {
    fn nonneg(self) -> Expr {
        match self {
            Expr::Variable(mut v) => {
                v.nonneg = true;
                v.nonpos = false;
                Expr::Variable(v)
            }
            Expr::Parameter(mut p) => {
                p.nonneg = true;
                p.nonpos = false;
                Expr::Parameter(p)
            }
            other => other,
        }
    }

    fn nonpos(self) -> Expr {
        match self {
            Expr::Variable(mut v) => {
                v.nonpos = true;
                v.nonneg = false;
                Expr::Variable(v)
            }
            Expr::Parameter(mut p) => {
                p.nonpos = true;
                p.nonneg = false;
                Expr::Parameter(p)
            }
            other => other,
        }
    }

    fn named(self, name: impl Into<String>) -> Expr {
        match self {
            Expr::Variable(mut v) => {
                v.name = Some(name.into());
                Expr::Variable(v)
            }
            Expr::Parameter(mut p) => {
                p.name = Some(name.into());
                Expr::Parameter(p)
            }
            other => other,
        }
    }
}
