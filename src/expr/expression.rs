//! The expression tree.
//!
//! `Expr` is an immutable DAG: children are shared through `Arc`, so cloning
//! an expression is cheap and a sub-expression can appear in many places.
//! Leaves carry a process-unique [`ExprId`]; variables are keyed by it during
//! canonicalization and unpacking.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use super::array::Array;
use super::shape::Shape;
use crate::error::{Error, Result};

/// Unique identifier of a leaf expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExprId(u64);

impl ExprId {
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        ExprId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ExprId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A decision variable.
#[derive(Debug, Clone)]
pub struct VariableData {
    pub id: ExprId,
    pub shape: Shape,
    pub name: Option<String>,
    /// Enforced as `x >= 0` when the problem is canonicalized.
    pub nonneg: bool,
    /// Enforced as `x <= 0` when the problem is canonicalized.
    pub nonpos: bool,
}

impl VariableData {
    /// The user-facing name, or `var{id}`.
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("var{}", self.id))
    }
}

/// A symbolic constant whose value may change between solves.
///
/// The value cell is shared by every clone of the parameter expression, so
/// assigning through any handle is visible to problems that already hold it.
#[derive(Debug, Clone)]
pub struct ParameterData {
    pub id: ExprId,
    pub shape: Shape,
    pub name: Option<String>,
    pub nonneg: bool,
    pub nonpos: bool,
    pub(crate) value: Arc<RwLock<Option<Array>>>,
}

impl ParameterData {
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("param{}", self.id))
    }

    /// Current value, if one has been assigned.
    pub fn value(&self) -> Option<Array> {
        match self.value.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Current value, or `Error::ParameterUnset`.
    pub fn require_value(&self) -> Result<Array> {
        self.value()
            .ok_or_else(|| Error::ParameterUnset(self.label()))
    }

    pub fn set_value(&self, value: Array) -> Result<()> {
        if !value_fits(&value, &self.shape) {
            return Err(Error::shape(
                format!("value of parameter {}", self.label()),
                &self.shape,
                value.shape(),
            ));
        }
        if self.nonneg && !value.is_nonneg() {
            return Err(Error::InvalidProblem(format!(
                "parameter {} is declared nonneg but was given a negative value",
                self.label()
            )));
        }
        if self.nonpos && !value.is_nonpos() {
            return Err(Error::InvalidProblem(format!(
                "parameter {} is declared nonpos but was given a positive value",
                self.label()
            )));
        }
        match self.value.write() {
            Ok(mut guard) => *guard = Some(value),
            Err(poisoned) => *poisoned.into_inner() = Some(value),
        }
        Ok(())
    }
}

/// A fixed numeric value with a declared shape.
#[derive(Debug, Clone)]
pub struct ConstantData {
    pub id: ExprId,
    pub value: Array,
    pub shape: Shape,
}

/// True when `value` can stand for an expression of `shape`.
pub(crate) fn value_fits(value: &Array, shape: &Shape) -> bool {
    match value {
        Array::Scalar(_) => shape.is_singleton(),
        _ => value.dims() == (shape.rows(), shape.cols()),
    }
}

/// A strided range over the column-major flattening of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    pub start: usize,
    pub stop: usize,
    pub step: usize,
}

impl IndexSpec {
    pub fn element(i: usize) -> Self {
        IndexSpec {
            start: i,
            stop: i + 1,
            step: 1,
        }
    }

    pub fn range(start: usize, stop: usize) -> Self {
        IndexSpec {
            start,
            stop,
            step: 1,
        }
    }

    /// Number of selected elements.
    pub fn len(&self) -> usize {
        if self.step == 0 || self.stop <= self.start {
            0
        } else {
            (self.stop - self.start).div_ceil(self.step)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat positions selected, in order.
    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).map(move |k| self.start + k * self.step)
    }
}

/// A node of the expression DAG.
#[derive(Debug, Clone)]
pub enum Expr {
    Variable(VariableData),
    Parameter(ParameterData),
    Constant(ConstantData),

    // affine
    Add(Arc<Expr>, Arc<Expr>),
    Neg(Arc<Expr>),
    /// Scalar or elementwise product; one side must be constant.
    Mul(Arc<Expr>, Arc<Expr>),
    MatMul(Arc<Expr>, Arc<Expr>),
    /// Sum of all entries, or along an axis.
    Sum(Arc<Expr>, Option<usize>),
    Reshape(Arc<Expr>, Shape),
    Index(Arc<Expr>, IndexSpec),
    VStack(Vec<Arc<Expr>>),
    HStack(Vec<Arc<Expr>>),
    Transpose(Arc<Expr>),
    Trace(Arc<Expr>),
    Cumsum(Arc<Expr>, Option<usize>),
    /// Vector to diagonal matrix, or square matrix to its diagonal.
    Diag(Arc<Expr>),

    // nonlinear
    Abs(Arc<Expr>),
    Norm1(Arc<Expr>),
    Norm2(Arc<Expr>),
    NormInf(Arc<Expr>),
    Pos(Arc<Expr>),
    NegPart(Arc<Expr>),
    Maximum(Vec<Arc<Expr>>),
    Minimum(Vec<Arc<Expr>>),
    SumSquares(Arc<Expr>),
    /// `x' P x` with constant `P`.
    QuadForm(Arc<Expr>, Arc<Expr>),
    /// `sum(x^2) / y` with scalar `y`.
    QuadOverLin(Arc<Expr>, Arc<Expr>),
    Exp(Arc<Expr>),
    Log(Arc<Expr>),
    /// `-x log x`, elementwise.
    Entropy(Arc<Expr>),
    Power(Arc<Expr>, f64),
    LogSumExp(Arc<Expr>),
    /// `log(1 + exp(x))`, elementwise.
    Logistic(Arc<Expr>),
}

impl Expr {
    /// Direct children in argument order.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Variable(_) | Expr::Parameter(_) | Expr::Constant(_) => Vec::new(),
            Expr::Add(a, b)
            | Expr::Mul(a, b)
            | Expr::MatMul(a, b)
            | Expr::QuadForm(a, b)
            | Expr::QuadOverLin(a, b) => vec![a.as_ref(), b.as_ref()],
            Expr::VStack(args) | Expr::HStack(args) | Expr::Maximum(args) | Expr::Minimum(args) => {
                args.iter().map(|a| a.as_ref()).collect()
            }
            Expr::Neg(a)
            | Expr::Sum(a, _)
            | Expr::Reshape(a, _)
            | Expr::Index(a, _)
            | Expr::Transpose(a)
            | Expr::Trace(a)
            | Expr::Cumsum(a, _)
            | Expr::Diag(a)
            | Expr::Abs(a)
            | Expr::Norm1(a)
            | Expr::Norm2(a)
            | Expr::NormInf(a)
            | Expr::Pos(a)
            | Expr::NegPart(a)
            | Expr::SumSquares(a)
            | Expr::Exp(a)
            | Expr::Log(a)
            | Expr::Entropy(a)
            | Expr::Power(a, _)
            | Expr::LogSumExp(a)
            | Expr::Logistic(a) => vec![a.as_ref()],
        }
    }

    /// Short operator name used in DCP reports.
    pub fn op_name(&self) -> &'static str {
        match self {
            Expr::Variable(_) => "variable",
            Expr::Parameter(_) => "parameter",
            Expr::Constant(_) => "constant",
            Expr::Add(..) => "add",
            Expr::Neg(_) => "neg",
            Expr::Mul(..) => "multiply",
            Expr::MatMul(..) => "matmul",
            Expr::Sum(..) => "sum",
            Expr::Reshape(..) => "reshape",
            Expr::Index(..) => "index",
            Expr::VStack(_) => "vstack",
            Expr::HStack(_) => "hstack",
            Expr::Transpose(_) => "transpose",
            Expr::Trace(_) => "trace",
            Expr::Cumsum(..) => "cumsum",
            Expr::Diag(_) => "diag",
            Expr::Abs(_) => "abs",
            Expr::Norm1(_) => "norm1",
            Expr::Norm2(_) => "norm2",
            Expr::NormInf(_) => "norm_inf",
            Expr::Pos(_) => "pos",
            Expr::NegPart(_) => "neg_part",
            Expr::Maximum(_) => "maximum",
            Expr::Minimum(_) => "minimum",
            Expr::SumSquares(_) => "sum_squares",
            Expr::QuadForm(..) => "quad_form",
            Expr::QuadOverLin(..) => "quad_over_lin",
            Expr::Exp(_) => "exp",
            Expr::Log(_) => "log",
            Expr::Entropy(_) => "entropy",
            Expr::Power(..) => "power",
            Expr::LogSumExp(_) => "log_sum_exp",
            Expr::Logistic(_) => "logistic",
        }
    }

    /// Shape of the expression.
    ///
    /// Inconsistent trees fall back to the first operand's shape; use
    /// [`Expr::try_shape`] to detect them.
    pub fn shape(&self) -> Shape {
        let kids: Vec<Shape> = self.children().into_iter().map(Expr::shape).collect();
        self.node_shape(&kids).unwrap_or_else(|_| {
            kids.into_iter().next().unwrap_or_else(Shape::scalar)
        })
    }

    /// Shape of the expression, checking every node of the tree.
    pub fn try_shape(&self) -> Result<Shape> {
        let kids = self
            .children()
            .into_iter()
            .map(Expr::try_shape)
            .collect::<Result<Vec<_>>>()?;
        self.node_shape(&kids)
    }

    pub(crate) fn node_shape(&self, kids: &[Shape]) -> Result<Shape> {
        let ctx = self.op_name();
        match self {
            Expr::Variable(v) => Ok(v.shape.clone()),
            Expr::Parameter(p) => Ok(p.shape.clone()),
            Expr::Constant(c) => Ok(c.shape.clone()),
            Expr::Neg(_) => Ok(kids[0].clone()),
            Expr::Add(..) | Expr::Mul(..) => kids[0]
                .broadcast(&kids[1])
                .ok_or_else(|| Error::shape(ctx, &kids[0], &kids[1])),
            Expr::MatMul(..) => kids[0]
                .matmul(&kids[1])
                .ok_or_else(|| Error::shape(ctx, &kids[0], &kids[1])),
            Expr::Sum(_, None) => Ok(Shape::scalar()),
            Expr::Sum(_, Some(axis)) => reduce_axis(ctx, &kids[0], *axis),
            Expr::Reshape(_, shape) => {
                if shape.size() == kids[0].size() {
                    Ok(shape.clone())
                } else {
                    Err(Error::shape(ctx, format!("{} elements", kids[0].size()), shape))
                }
            }
            Expr::Index(_, spec) => {
                let size = kids[0].size();
                let last = spec.positions().last();
                if spec.is_empty() || last.map_or(true, |p| p >= size) {
                    return Err(Error::shape(
                        ctx,
                        format!("a non-empty range within {} elements", size),
                        format!("{}:{}:{}", spec.start, spec.stop, spec.step),
                    ));
                }
                Ok(if spec.len() == 1 {
                    Shape::scalar()
                } else {
                    Shape::vector(spec.len())
                })
            }
            Expr::VStack(_) => stack_shape(ctx, kids, true),
            Expr::HStack(_) => stack_shape(ctx, kids, false),
            Expr::Transpose(_) => Ok(kids[0].transpose()),
            Expr::Trace(_) => {
                if kids[0].rows() == kids[0].cols() {
                    Ok(Shape::scalar())
                } else {
                    Err(Error::shape(ctx, "a square matrix", &kids[0]))
                }
            }
            Expr::Cumsum(_, None) => Ok(kids[0].clone()),
            Expr::Cumsum(_, Some(axis)) => {
                if *axis < 2 {
                    Ok(kids[0].clone())
                } else {
                    Err(Error::shape(ctx, "axis 0 or 1", format!("axis {}", axis)))
                }
            }
            Expr::Diag(_) => {
                let s = &kids[0];
                if s.is_vector() {
                    Ok(Shape::matrix(s.size(), s.size()))
                } else if s.is_matrix() && s.rows() == s.cols() {
                    Ok(Shape::vector(s.rows()))
                } else {
                    Err(Error::shape(ctx, "a vector or square matrix", s))
                }
            }
            Expr::Norm1(_) | Expr::Norm2(_) | Expr::NormInf(_) | Expr::SumSquares(_) => {
                Ok(Shape::scalar())
            }
            Expr::LogSumExp(_) => Ok(Shape::scalar()),
            Expr::Abs(_)
            | Expr::Pos(_)
            | Expr::NegPart(_)
            | Expr::Exp(_)
            | Expr::Log(_)
            | Expr::Entropy(_)
            | Expr::Power(..)
            | Expr::Logistic(_) => Ok(kids[0].clone()),
            Expr::Maximum(_) | Expr::Minimum(_) => {
                let (first, rest) = kids
                    .split_first()
                    .ok_or_else(|| Error::InvalidProblem(format!("{} of no arguments", ctx)))?;
                rest.iter().try_fold(first.clone(), |acc, s| {
                    acc.broadcast(s).ok_or_else(|| Error::shape(ctx, &acc, s))
                })
            }
            Expr::QuadForm(..) => {
                let (x, p) = (&kids[0], &kids[1]);
                let n = x.size();
                if (x.is_vector() || x.is_singleton()) && p.rows() == n && p.cols() == n {
                    Ok(Shape::scalar())
                } else {
                    Err(Error::shape(ctx, format!("({}, {})", n, n), p))
                }
            }
            Expr::QuadOverLin(..) => {
                if kids[1].is_singleton() {
                    Ok(Shape::scalar())
                } else {
                    Err(Error::shape(ctx, Shape::scalar(), &kids[1]))
                }
            }
        }
    }

    /// Pre-order traversal over every node.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        f(self);
        for child in self.children() {
            child.visit(f);
        }
    }

    /// Ids of the variables in the expression, sorted and deduplicated.
    pub fn variables(&self) -> Vec<ExprId> {
        let mut ids = Vec::new();
        self.visit(&mut |e| {
            if let Expr::Variable(v) = e {
                ids.push(v.id);
            }
        });
        ids.sort();
        ids.dedup();
        ids
    }

    /// Ids of the parameters in the expression, sorted and deduplicated.
    pub fn parameters(&self) -> Vec<ExprId> {
        let mut ids = Vec::new();
        self.visit(&mut |e| {
            if let Expr::Parameter(p) = e {
                ids.push(p.id);
            }
        });
        ids.sort();
        ids.dedup();
        ids
    }

    pub fn variable_id(&self) -> Option<ExprId> {
        match self {
            Expr::Variable(v) => Some(v.id),
            _ => None,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Expr::Variable(_))
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Expr::Constant(_))
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self, Expr::Parameter(_))
    }

    /// The literal value of a constant leaf.
    pub fn constant_value(&self) -> Option<&Array> {
        match self {
            Expr::Constant(c) => Some(&c.value),
            _ => None,
        }
    }

    /// Assign the value of a parameter.
    pub fn set_value(&self, value: impl Into<Array>) -> Result<()> {
        match self {
            Expr::Parameter(p) => p.set_value(value.into()),
            other => Err(Error::InvalidProblem(format!(
                "set_value called on {}, which is not a parameter",
                other
            ))),
        }
    }

    /// Current value of a parameter.
    pub fn param_value(&self) -> Option<Array> {
        match self {
            Expr::Parameter(p) => p.value(),
            _ => None,
        }
    }

    /// Whether this node prints as an infix operation.
    fn is_infix(&self) -> bool {
        matches!(self, Expr::Add(..) | Expr::Mul(..) | Expr::MatMul(..))
    }
}

fn reduce_axis(ctx: &str, s: &Shape, axis: usize) -> Result<Shape> {
    match (s.ndim(), axis) {
        (0, 0) | (1, 0) => Ok(Shape::scalar()),
        (2, 0) => Ok(Shape::vector(s.cols())),
        (2, 1) => Ok(Shape::vector(s.rows())),
        _ => Err(Error::shape(ctx, format!("an axis of {}", s), format!("axis {}", axis))),
    }
}

/// Vectors and scalars stack into a longer vector; anything involving a
/// matrix stacks as 2-D blocks with vectors read as columns.
fn stack_shape(ctx: &str, kids: &[Shape], vertical: bool) -> Result<Shape> {
    if kids.is_empty() {
        return Err(Error::InvalidProblem(format!("{} of no arguments", ctx)));
    }
    let all_flat = kids.iter().all(|s| s.ndim() < 2);
    if vertical && all_flat {
        return Ok(Shape::vector(kids.iter().map(Shape::size).sum()));
    }
    let first = &kids[0];
    if vertical {
        for s in &kids[1..] {
            if s.cols() != first.cols() {
                return Err(Error::shape(ctx, format!("{} columns", first.cols()), s));
            }
        }
        Ok(Shape::matrix(kids.iter().map(Shape::rows).sum(), first.cols()))
    } else {
        for s in &kids[1..] {
            if s.rows() != first.rows() {
                return Err(Error::shape(ctx, format!("{} rows", first.rows()), s));
            }
        }
        Ok(Shape::matrix(first.rows(), kids.iter().map(Shape::cols).sum()))
    }
}

struct Operand<'a>(&'a Expr);

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_infix() {
            write!(f, "({})", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

fn write_call(f: &mut fmt::Formatter<'_>, name: &str, args: &[Arc<Expr>]) -> fmt::Result {
    write!(f, "{}(", name)?;
    for (i, a) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", a)?;
    }
    write!(f, ")")
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Variable(v) => write!(f, "{}", v.label()),
            Expr::Parameter(p) => write!(f, "{}", p.label()),
            Expr::Constant(c) => match c.value.as_scalar() {
                Some(v) if c.shape.is_scalar() => write!(f, "{}", v),
                _ => write!(f, "const{}", c.shape),
            },
            Expr::Add(a, b) => match b.as_ref() {
                Expr::Neg(inner) => write!(f, "{} - {}", a, Operand(inner)),
                _ => write!(f, "{} + {}", a, b),
            },
            Expr::Neg(a) => write!(f, "-{}", Operand(a)),
            Expr::Mul(a, b) => write!(f, "{} * {}", Operand(a), Operand(b)),
            Expr::MatMul(a, b) => write!(f, "{} @ {}", Operand(a), Operand(b)),
            Expr::Sum(a, None) => write!(f, "sum({})", a),
            Expr::Sum(a, Some(axis)) => write!(f, "sum({}, axis={})", a, axis),
            Expr::Reshape(a, s) => write!(f, "reshape({}, {})", a, s),
            Expr::Index(a, spec) if spec.len() == 1 => {
                write!(f, "{}[{}]", Operand(a), spec.start)
            }
            Expr::Index(a, spec) if spec.step == 1 => {
                write!(f, "{}[{}:{}]", Operand(a), spec.start, spec.stop)
            }
            Expr::Index(a, spec) => {
                write!(f, "{}[{}:{}:{}]", Operand(a), spec.start, spec.stop, spec.step)
            }
            Expr::VStack(args) => write_call(f, "vstack", args),
            Expr::HStack(args) => write_call(f, "hstack", args),
            Expr::Transpose(a) => write!(f, "{}.T", Operand(a)),
            Expr::Cumsum(a, None) => write!(f, "cumsum({})", a),
            Expr::Cumsum(a, Some(axis)) => write!(f, "cumsum({}, axis={})", a, axis),
            Expr::Power(a, p) => write!(f, "power({}, {})", a, p),
            Expr::QuadForm(x, p) => write!(f, "quad_form({}, {})", x, p),
            Expr::QuadOverLin(x, y) => write!(f, "quad_over_lin({}, {})", x, y),
            Expr::Maximum(args) => write_call(f, "maximum", args),
            Expr::Minimum(args) => write_call(f, "minimum", args),
            Expr::Trace(a)
            | Expr::Diag(a)
            | Expr::Abs(a)
            | Expr::Norm1(a)
            | Expr::Norm2(a)
            | Expr::NormInf(a)
            | Expr::Pos(a)
            | Expr::NegPart(a)
            | Expr::SumSquares(a)
            | Expr::Exp(a)
            | Expr::Log(a)
            | Expr::Entropy(a)
            | Expr::LogSumExp(a)
            | Expr::Logistic(a) => write!(f, "{}({})", self.op_name(), a),
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        crate::expr::constant(value)
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        crate::expr::constant(value as f64)
    }
}

impl From<&Expr> for Expr {
    fn from(expr: &Expr) -> Self {
        expr.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{constant, constant_vec, parameter, variable, VariableExt};

    #[test]
    fn test_ids_are_unique_and_ordered() {
        let a = ExprId::new();
        let b = ExprId::new();
        assert!(a < b);
    }

    #[test]
    fn test_negation_keeps_shape() {
        for shape in [Shape::scalar(), Shape::vector(3), Shape::matrix(2, 4)] {
            let x = variable(shape.clone());
            assert_eq!((-&x).try_shape().unwrap(), shape);
            assert_eq!((&x - &x).try_shape().unwrap(), shape);
        }
    }

    #[test]
    fn test_index_spec_len() {
        assert_eq!(IndexSpec::range(2, 5).len(), 3);
        let strided = IndexSpec {
            start: 0,
            stop: 7,
            step: 3,
        };
        assert_eq!(strided.positions().collect::<Vec<_>>(), vec![0, 3, 6]);
        assert!(IndexSpec::range(4, 4).is_empty());
    }

    #[test]
    fn test_try_shape_reports_mismatch() {
        let x = variable(3);
        let y = variable(4);
        let sum = Expr::Add(Arc::new(x), Arc::new(y));
        assert!(matches!(sum.try_shape(), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_stack_shapes() {
        let a = variable(2);
        let b = variable(3);
        let v = Expr::VStack(vec![Arc::new(a.clone()), Arc::new(b)]);
        assert_eq!(v.try_shape().unwrap(), Shape::vector(5));

        let h = Expr::HStack(vec![Arc::new(a.clone()), Arc::new(a)]);
        assert_eq!(h.try_shape().unwrap(), Shape::matrix(2, 2));
    }

    #[test]
    fn test_variables_and_parameters() {
        let x = variable(2);
        let p = parameter(());
        let e = Expr::Mul(Arc::new(p.clone()), Arc::new(x.clone()));
        let e = Expr::Add(Arc::new(e), Arc::new(x.clone()));
        assert_eq!(e.variables(), vec![x.variable_id().unwrap()]);
        assert_eq!(e.parameters().len(), 1);
    }

    #[test]
    fn test_display() {
        let x = variable(3).named("x");
        let c = constant_vec(vec![1.0, 2.0, 3.0]);
        let e = Expr::Norm2(Arc::new(Expr::Add(
            Arc::new(x.clone()),
            Arc::new(Expr::Neg(Arc::new(c))),
        )));
        assert_eq!(e.to_string(), "norm2(x - const(3,))");

        let scaled = Expr::Mul(Arc::new(constant(2.0)), Arc::new(x));
        assert_eq!(scaled.to_string(), "2 * x");
    }

    #[test]
    fn test_set_value_checks_shape_and_sign() {
        let p = crate::expr::ParameterBuilder::vector(2).nonneg().build().unwrap();
        assert!(p.set_value(vec![1.0, 2.0]).is_ok());
        assert!(matches!(
            p.set_value(vec![1.0, 2.0, 3.0]),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(matches!(
            p.set_value(vec![-1.0, 2.0]),
            Err(Error::InvalidProblem(_))
        ));
        // a failed assignment leaves the previous value in place
        assert_eq!(p.param_value().unwrap().flatten().as_slice(), &[1.0, 2.0]);
    }
}
