//! Operator overloading for expressions.
//!
//! `+`, `-` and `*` accept any mix of `Expr`, `&Expr` and `f64`; `/` divides
//! by a scalar. `*` is the scalar or elementwise product. Use
//! [`matmul`](super::matmul) for matrix products.

use std::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::Arc;

use crate::expr::{constant, Expr};

fn add_exprs(a: Expr, b: Expr) -> Expr {
    Expr::Add(Arc::new(a), Arc::new(b))
}

fn sub_exprs(a: Expr, b: Expr) -> Expr {
    Expr::Add(Arc::new(a), Arc::new(Expr::Neg(Arc::new(b))))
}

fn mul_exprs(a: Expr, b: Expr) -> Expr {
    Expr::Mul(Arc::new(a), Arc::new(b))
}

macro_rules! impl_binary_op {
    ($op:ident, $method:ident, $build:ident) => {
        impl $op<Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                $build(self, rhs)
            }
        }

        impl $op<&Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                $build(self, rhs.clone())
            }
        }

        impl $op<Expr> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                $build(self.clone(), rhs)
            }
        }

        impl $op<&Expr> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                $build(self.clone(), rhs.clone())
            }
        }

        impl $op<f64> for Expr {
            type Output = Expr;
            fn $method(self, rhs: f64) -> Expr {
                $build(self, constant(rhs))
            }
        }

        impl $op<f64> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: f64) -> Expr {
                $build(self.clone(), constant(rhs))
            }
        }

        impl $op<Expr> for f64 {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                $build(constant(self), rhs)
            }
        }

        impl $op<&Expr> for f64 {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                $build(constant(self), rhs.clone())
            }
        }
    };
}

impl_binary_op!(Add, add, add_exprs);
impl_binary_op!(Sub, sub, sub_exprs);
impl_binary_op!(Mul, mul, mul_exprs);

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::Neg(Arc::new(self))
    }
}

impl Neg for &Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::Neg(Arc::new(self.clone()))
    }
}

impl Div<f64> for Expr {
    type Output = Expr;
    fn div(self, rhs: f64) -> Expr {
        mul_exprs(constant(1.0 / rhs), self)
    }
}

impl Div<f64> for &Expr {
    type Output = Expr;
    fn div(self, rhs: f64) -> Expr {
        mul_exprs(constant(1.0 / rhs), self.clone())
    }
}

#[cfg(test)]
mod tests {
    use crate::dcp::Curvature;
    use crate::expr::{variable, Shape, VariableExt};

    #[test]
    fn test_mixed_operands() {
        let x = variable(5).named("x");
        let y = variable(5).named("y");
        assert_eq!((&x + &y).shape(), Shape::vector(5));
        assert_eq!((&x - 1.0).to_string(), "x - 1");
        assert_eq!((2.0 * &x).to_string(), "2 * x");
        assert_eq!((x.clone() / 4.0).to_string(), "0.25 * x");
        assert_eq!((-&x).to_string(), "-x");
        assert_eq!((1.0 - x.clone() * 3.0).to_string(), "1 - (x * 3)");
    }

    #[test]
    fn test_curvature_through_operators() {
        let x = variable(3);
        let y = variable(3);
        assert_eq!((&x + 2.0 * &y).curvature(), Curvature::Affine);
        assert_eq!((&x * &y).curvature(), Curvature::Unknown);
    }
}
