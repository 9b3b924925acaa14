//! Parameters: constants whose value can change without rebuilding a problem.

use std::sync::{Arc, RwLock};

use super::array::Array;
use super::expression::{Expr, ExprId, ParameterData};
use super::shape::Shape;
use crate::error::Result;

/// Builder for parameters.
///
/// ```
/// use cvxpipe::expr::ParameterBuilder;
///
/// let gamma = ParameterBuilder::scalar().name("gamma").nonneg().value(0.5).build().unwrap();
/// assert_eq!(gamma.param_value().and_then(|v| v.as_scalar()), Some(0.5));
/// ```
#[derive(Debug, Default)]
pub struct ParameterBuilder {
    shape: Shape,
    name: Option<String>,
    nonneg: bool,
    nonpos: bool,
    value: Option<Array>,
}

impl ParameterBuilder {
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

    pub fn nonneg(mut self) -> Self {
        self.nonneg = true;
        self.nonpos = false;
        self
    }

    pub fn nonpos(mut self) -> Self {
        self.nonpos = true;
        self.nonneg = false;
        self
    }

    /// Initial value, checked when the parameter is built.
    pub fn value(mut self, value: impl Into<Array>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Build the parameter, validating any initial value.
    pub fn build(self) -> Result<Expr> {
        let data = ParameterData {
            id: ExprId::new(),
            shape: self.shape,
            name: self.name,
            nonneg: self.nonneg,
            nonpos: self.nonpos,
            value: Arc::new(RwLock::new(None)),
        };
        if let Some(value) = self.value {
            data.set_value(value)?;
        }
        Ok(Expr::Parameter(data))
    }
}

/// A parameter with no value yet.
pub fn parameter(shape: impl Into<Shape>) -> Expr {
    Expr::Parameter(ParameterData {
        id: ExprId::new(),
        shape: shape.into(),
        name: None,
        nonneg: false,
        nonpos: false,
        value: Arc::new(RwLock::new(None)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_clones_share_the_value() {
        let p = parameter(3);
        let alias = p.clone();
        p.set_value(vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(
            alias.param_value().unwrap().flatten().as_slice(),
            &[1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn test_builder_rejects_bad_initial_value() {
        let err = ParameterBuilder::scalar().nonneg().value(-1.0).build().unwrap_err();
        assert!(matches!(err, Error::InvalidProblem(_)));
    }

    #[test]
    fn test_unset_value() {
        let p = parameter(()).clone();
        match &p {
            Expr::Parameter(data) => {
                assert!(matches!(data.require_value(), Err(Error::ParameterUnset(_))));
            }
            other => panic!("expected a parameter, got {:?}", other),
        }
    }
}
