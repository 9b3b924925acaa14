//! Curvature analysis and the DCP composition rule.

use std::fmt;
use std::sync::Arc;

use super::sign::{is_even_integer, Sign};
use crate::expr::{Definiteness, Expr};

/// Curvature of an expression, from most to least specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curvature {
    /// Contains no variables.
    Constant,
    Affine,
    Convex,
    Concave,
    /// Not provably convex or concave under the DCP rules.
    Unknown,
}

impl Curvature {
    pub fn is_convex(self) -> bool {
        matches!(self, Curvature::Constant | Curvature::Affine | Curvature::Convex)
    }

    pub fn is_concave(self) -> bool {
        matches!(self, Curvature::Constant | Curvature::Affine | Curvature::Concave)
    }

    pub fn is_affine(self) -> bool {
        matches!(self, Curvature::Constant | Curvature::Affine)
    }

    pub fn is_constant(self) -> bool {
        matches!(self, Curvature::Constant)
    }

    pub fn is_unknown(self) -> bool {
        matches!(self, Curvature::Unknown)
    }

    pub fn negate(self) -> Self {
        match self {
            Curvature::Convex => Curvature::Concave,
            Curvature::Concave => Curvature::Convex,
            other => other,
        }
    }
}

impl fmt::Display for Curvature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Curvature::Constant => "constant",
            Curvature::Affine => "affine",
            Curvature::Convex => "convex",
            Curvature::Concave => "concave",
            Curvature::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Curvature of `a + b`.
pub fn add_curvature(a: Curvature, b: Curvature) -> Curvature {
    use Curvature::*;
    match (a, b) {
        (Unknown, _) | (_, Unknown) => Unknown,
        (Constant, x) | (x, Constant) => x,
        (Affine, x) | (x, Affine) => x,
        (Convex, Convex) => Convex,
        (Concave, Concave) => Concave,
        (Convex, Concave) | (Concave, Convex) => Unknown,
    }
}

/// Curvature of `c * e` for a constant `c` of the given sign.
pub fn scale_curvature(c: Sign, e: Curvature) -> Curvature {
    if c.is_zero() || e.is_constant() {
        Curvature::Constant
    } else if e.is_affine() {
        Curvature::Affine
    } else if c.is_nonneg() {
        e
    } else if c.is_nonpos() {
        e.negate()
    } else {
        Curvature::Unknown
    }
}

/// How an atom responds to growth in one of its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Monotonicity {
    Increasing,
    Decreasing,
    None,
}

impl fmt::Display for Monotonicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Monotonicity::Increasing => "increasing",
            Monotonicity::Decreasing => "decreasing",
            Monotonicity::None => "non-monotone",
        };
        f.write_str(s)
    }
}

/// Monotonicity of functions like `|x|` that grow away from zero.
fn away_from_zero(arg: Sign) -> Monotonicity {
    if arg.is_nonneg() {
        Monotonicity::Increasing
    } else if arg.is_nonpos() {
        Monotonicity::Decreasing
    } else {
        Monotonicity::None
    }
}

/// True when an argument of curvature `arg` may be passed to an atom of
/// curvature `atom` that has monotonicity `mono` in that argument.
pub fn composes(atom: Curvature, mono: Monotonicity, arg: Curvature) -> bool {
    if arg.is_affine() {
        return true;
    }
    match (atom, mono) {
        (Curvature::Convex, Monotonicity::Increasing)
        | (Curvature::Concave, Monotonicity::Decreasing) => arg == Curvature::Convex,
        (Curvature::Convex, Monotonicity::Decreasing)
        | (Curvature::Concave, Monotonicity::Increasing) => arg == Curvature::Concave,
        _ => false,
    }
}

/// The DCP composition rule: `f(g1, .., gk)` keeps the curvature of `f`
/// when every argument composes, and is unknown otherwise.
pub fn compose(atom: Curvature, args: &[(Curvature, Monotonicity)]) -> Curvature {
    match atom {
        Curvature::Constant => Curvature::Constant,
        Curvature::Affine => args
            .iter()
            .map(|&(c, m)| match m {
                Monotonicity::Increasing => c,
                Monotonicity::Decreasing => c.negate(),
                Monotonicity::None if c.is_affine() => c,
                Monotonicity::None => Curvature::Unknown,
            })
            .fold(Curvature::Constant, add_curvature),
        Curvature::Convex | Curvature::Concave => {
            if args.iter().all(|&(c, m)| composes(atom, m, c)) {
                atom
            } else {
                Curvature::Unknown
            }
        }
        Curvature::Unknown => Curvature::Unknown,
    }
}

/// Definiteness of a constant matrix operand, when it can be determined.
///
/// Parameters are judged by their current value.
pub fn matrix_definiteness(p: &Expr) -> Option<Definiteness> {
    match p {
        Expr::Constant(c) => Some(c.value.definiteness()),
        Expr::Parameter(data) => data.value().map(|v| v.definiteness()),
        Expr::Neg(inner) => matrix_definiteness(inner).map(|d| match d {
            Definiteness::Psd => Definiteness::Nsd,
            Definiteness::Nsd => Definiteness::Psd,
            Definiteness::Indefinite => Definiteness::Indefinite,
        }),
        _ => None,
    }
}

impl Expr {
    /// Intrinsic curvature of a nonlinear atom, ignoring its arguments.
    ///
    /// `None` for leaves and affine operators.
    pub fn atom_curvature(&self) -> Option<Curvature> {
        let c = match self {
            Expr::Abs(_)
            | Expr::Norm1(_)
            | Expr::Norm2(_)
            | Expr::NormInf(_)
            | Expr::Pos(_)
            | Expr::NegPart(_)
            | Expr::Maximum(_)
            | Expr::SumSquares(_)
            | Expr::QuadOverLin(..)
            | Expr::Exp(_)
            | Expr::LogSumExp(_)
            | Expr::Logistic(_) => Curvature::Convex,
            Expr::Minimum(_) | Expr::Log(_) | Expr::Entropy(_) => Curvature::Concave,
            Expr::QuadForm(_, p) => match matrix_definiteness(p) {
                Some(Definiteness::Psd) => Curvature::Convex,
                Some(Definiteness::Nsd) => Curvature::Concave,
                _ => Curvature::Unknown,
            },
            Expr::Power(_, p) => {
                if *p == 0.0 {
                    Curvature::Constant
                } else if *p == 1.0 {
                    Curvature::Affine
                } else if *p > 1.0 || *p < 0.0 {
                    Curvature::Convex
                } else if *p > 0.0 && *p < 1.0 {
                    Curvature::Concave
                } else {
                    Curvature::Unknown
                }
            }
            _ => return None,
        };
        Some(c)
    }

    /// Monotonicity of a nonlinear atom in its `arg`-th argument.
    pub fn monotonicity(&self, arg: usize) -> Monotonicity {
        let children = self.children();
        let sign_of = |i: usize| {
            children
                .get(i)
                .map(|c| c.sign())
                .unwrap_or(Sign::Unknown)
        };
        match self {
            Expr::Abs(_) | Expr::Norm1(_) | Expr::Norm2(_) | Expr::NormInf(_) => {
                away_from_zero(sign_of(arg))
            }
            Expr::SumSquares(_) => away_from_zero(sign_of(arg)),
            Expr::QuadOverLin(..) if arg == 0 => away_from_zero(sign_of(0)),
            Expr::QuadOverLin(..) => Monotonicity::Decreasing,
            Expr::Pos(_)
            | Expr::Maximum(_)
            | Expr::Minimum(_)
            | Expr::Exp(_)
            | Expr::Log(_)
            | Expr::LogSumExp(_)
            | Expr::Logistic(_) => Monotonicity::Increasing,
            Expr::NegPart(_) => Monotonicity::Decreasing,
            Expr::Entropy(_) | Expr::QuadForm(..) => Monotonicity::None,
            Expr::Power(_, p) => {
                if *p > 1.0 && is_even_integer(*p) {
                    away_from_zero(sign_of(0))
                } else if *p > 0.0 {
                    Monotonicity::Increasing
                } else {
                    Monotonicity::Decreasing
                }
            }
            _ => Monotonicity::Increasing,
        }
    }

    pub fn curvature(&self) -> Curvature {
        match self {
            Expr::Variable(_) => Curvature::Affine,
            Expr::Parameter(_) | Expr::Constant(_) => Curvature::Constant,

            Expr::Add(a, b) => add_curvature(a.curvature(), b.curvature()),
            Expr::Neg(a) => a.curvature().negate(),
            Expr::Mul(a, b) | Expr::MatMul(a, b) => product_curvature(a, b),
            Expr::Sum(a, _)
            | Expr::Reshape(a, _)
            | Expr::Index(a, _)
            | Expr::Transpose(a)
            | Expr::Trace(a)
            | Expr::Cumsum(a, _)
            | Expr::Diag(a) => a.curvature(),
            Expr::VStack(args) | Expr::HStack(args) => stacked_curvature(args),

            Expr::QuadForm(x, p) => {
                // P enters as data, never as an argument
                if !p.curvature().is_constant() {
                    return Curvature::Unknown;
                }
                let atom = self.atom_curvature().unwrap_or(Curvature::Unknown);
                compose(atom, &[(x.curvature(), self.monotonicity(0))])
            }
            _ => {
                let atom = self.atom_curvature().unwrap_or(Curvature::Unknown);
                let args: Vec<_> = self
                    .children()
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (c.curvature(), self.monotonicity(i)))
                    .collect();
                compose(atom, &args)
            }
        }
    }

    pub fn is_convex(&self) -> bool {
        self.curvature().is_convex()
    }

    pub fn is_concave(&self) -> bool {
        self.curvature().is_concave()
    }

    pub fn is_affine(&self) -> bool {
        self.curvature().is_affine()
    }
}

/// Products need a constant on at least one side.
fn product_curvature(a: &Expr, b: &Expr) -> Curvature {
    let (ac, bc) = (a.curvature(), b.curvature());
    match (ac.is_constant(), bc.is_constant()) {
        (true, true) => Curvature::Constant,
        (true, false) => scale_curvature(a.sign(), bc),
        (false, true) => scale_curvature(b.sign(), ac),
        (false, false) => Curvature::Unknown,
    }
}

fn stacked_curvature(args: &[Arc<Expr>]) -> Curvature {
    args.iter()
        .map(|a| a.curvature())
        .fold(Curvature::Constant, add_curvature)
}
