//! Sign analysis.

use std::sync::Arc;

use crate::expr::{Array, Expr};

/// Sign of every entry of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    Nonnegative,
    Nonpositive,
    Zero,
    Unknown,
}

impl Sign {
    pub fn is_nonneg(self) -> bool {
        matches!(self, Sign::Nonnegative | Sign::Zero)
    }

    pub fn is_nonpos(self) -> bool {
        matches!(self, Sign::Nonpositive | Sign::Zero)
    }

    pub fn is_zero(self) -> bool {
        matches!(self, Sign::Zero)
    }

    pub fn negate(self) -> Self {
        match self {
            Sign::Nonnegative => Sign::Nonpositive,
            Sign::Nonpositive => Sign::Nonnegative,
            other => other,
        }
    }

    /// Sign of a numeric value.
    pub fn of_array(value: &Array) -> Self {
        match (value.is_nonneg(), value.is_nonpos()) {
            (true, true) => Sign::Zero,
            (true, false) => Sign::Nonnegative,
            (false, true) => Sign::Nonpositive,
            (false, false) => Sign::Unknown,
        }
    }

    fn of_attributes(nonneg: bool, nonpos: bool) -> Self {
        if nonneg {
            Sign::Nonnegative
        } else if nonpos {
            Sign::Nonpositive
        } else {
            Sign::Unknown
        }
    }
}

impl std::fmt::Display for Sign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Sign::Nonnegative => "nonnegative",
            Sign::Nonpositive => "nonpositive",
            Sign::Zero => "zero",
            Sign::Unknown => "of unknown sign",
        };
        f.write_str(s)
    }
}

/// Sign of `a + b`.
pub fn add_sign(a: Sign, b: Sign) -> Sign {
    use Sign::*;
    match (a, b) {
        (Zero, x) | (x, Zero) => x,
        (Nonnegative, Nonnegative) => Nonnegative,
        (Nonpositive, Nonpositive) => Nonpositive,
        _ => Unknown,
    }
}

/// Sign of `a * b`.
pub fn mul_sign(a: Sign, b: Sign) -> Sign {
    use Sign::*;
    match (a, b) {
        (Zero, _) | (_, Zero) => Zero,
        (Nonnegative, Nonnegative) | (Nonpositive, Nonpositive) => Nonnegative,
        (Nonnegative, Nonpositive) | (Nonpositive, Nonnegative) => Nonpositive,
        _ => Unknown,
    }
}

/// Sign shared by every argument of a stack or reduction.
fn common_sign(args: &[Arc<Expr>]) -> Sign {
    args.iter()
        .map(|a| a.sign())
        .reduce(|acc, s| match (acc, s) {
            (Sign::Zero, Sign::Zero) => Sign::Zero,
            (a, b) if a.is_nonneg() && b.is_nonneg() => Sign::Nonnegative,
            (a, b) if a.is_nonpos() && b.is_nonpos() => Sign::Nonpositive,
            _ => Sign::Unknown,
        })
        .unwrap_or(Sign::Zero)
}

/// True for integer exponents that are even.
pub(crate) fn is_even_integer(p: f64) -> bool {
    p.fract() == 0.0 && (p / 2.0).fract() == 0.0
}

impl Expr {
    pub fn sign(&self) -> Sign {
        match self {
            Expr::Variable(v) => Sign::of_attributes(v.nonneg, v.nonpos),
            // only the declared attribute counts, values may change between solves
            Expr::Parameter(p) => Sign::of_attributes(p.nonneg, p.nonpos),
            Expr::Constant(c) => Sign::of_array(&c.value),

            Expr::Add(a, b) => add_sign(a.sign(), b.sign()),
            Expr::Neg(a) => a.sign().negate(),
            Expr::Mul(a, b) => mul_sign(a.sign(), b.sign()),
            // sums of same-signed products keep the sign
            Expr::MatMul(a, b) => mul_sign(a.sign(), b.sign()),
            Expr::Sum(a, _)
            | Expr::Reshape(a, _)
            | Expr::Index(a, _)
            | Expr::Transpose(a)
            | Expr::Trace(a)
            | Expr::Cumsum(a, _)
            | Expr::Diag(a) => a.sign(),
            Expr::VStack(args) | Expr::HStack(args) => common_sign(args),

            Expr::Abs(_)
            | Expr::Norm1(_)
            | Expr::Norm2(_)
            | Expr::NormInf(_)
            | Expr::Pos(_)
            | Expr::NegPart(_)
            | Expr::SumSquares(_)
            | Expr::QuadOverLin(..)
            | Expr::Exp(_)
            | Expr::Logistic(_) => Sign::Nonnegative,
            Expr::Maximum(args) => {
                if args.iter().any(|a| a.sign().is_nonneg()) {
                    Sign::Nonnegative
                } else if args.iter().all(|a| a.sign().is_nonpos()) {
                    Sign::Nonpositive
                } else {
                    Sign::Unknown
                }
            }
            Expr::Minimum(args) => {
                if args.iter().any(|a| a.sign().is_nonpos()) {
                    Sign::Nonpositive
                } else if args.iter().all(|a| a.sign().is_nonneg()) {
                    Sign::Nonnegative
                } else {
                    Sign::Unknown
                }
            }
            Expr::QuadForm(x, p) => {
                use crate::expr::Definiteness;
                if x.sign().is_zero() {
                    return Sign::Zero;
                }
                match super::curvature::matrix_definiteness(p) {
                    Some(Definiteness::Psd) => Sign::Nonnegative,
                    Some(Definiteness::Nsd) => Sign::Nonpositive,
                    _ => Sign::Unknown,
                }
            }
            Expr::Log(_) | Expr::Entropy(_) | Expr::LogSumExp(_) => Sign::Unknown,
            Expr::Power(a, p) => {
                if *p == 1.0 {
                    a.sign()
                } else {
                    // every other exponent is either even or restricted to x >= 0
                    Sign::Nonnegative
                }
            }
        }
    }

    pub fn is_nonneg(&self) -> bool {
        self.sign().is_nonneg()
    }

    pub fn is_nonpos(&self) -> bool {
        self.sign().is_nonpos()
    }
}
