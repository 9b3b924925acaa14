//! Expression shapes.
//!
//! Three kinds are supported: scalar `()`, vector `(n,)` and matrix `(m, n)`.
//! Data is laid out column-major throughout the crate, so a vector `(n,)`
//! occupies the same storage as an `(n, 1)` matrix.

use std::fmt;

/// Shape of an expression.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shape(Vec<usize>);

impl Shape {
    pub fn scalar() -> Self {
        Shape(Vec::new())
    }

    pub fn vector(n: usize) -> Self {
        Shape(vec![n])
    }

    pub fn matrix(m: usize, n: usize) -> Self {
        Shape(vec![m, n])
    }

    /// Total number of elements.
    pub fn size(&self) -> usize {
        self.0.iter().product()
    }

    /// 0 for scalars, 1 for vectors, 2 for matrices.
    pub fn ndim(&self) -> usize {
        self.0.len()
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    pub fn is_scalar(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_vector(&self) -> bool {
        self.0.len() == 1
    }

    pub fn is_matrix(&self) -> bool {
        self.0.len() == 2
    }

    /// Rows in the column-major layout (vectors are columns).
    pub fn rows(&self) -> usize {
        self.0.first().copied().unwrap_or(1)
    }

    /// Columns in the column-major layout.
    pub fn cols(&self) -> usize {
        self.0.get(1).copied().unwrap_or(1)
    }

    /// True for scalars and for any shape holding exactly one element.
    pub fn is_singleton(&self) -> bool {
        self.size() == 1
    }

    /// True when both shapes have the same column-major layout.
    pub fn same_layout(&self, other: &Shape) -> bool {
        self.rows() == other.rows() && self.cols() == other.cols()
    }

    pub fn transpose(&self) -> Self {
        match self.0.as_slice() {
            [] => Shape::scalar(),
            [n] => Shape::matrix(1, *n),
            [m, n] => Shape::matrix(*n, *m),
            _ => unreachable!("shapes have at most two dimensions"),
        }
    }

    /// Shape of an elementwise combination of `self` and `other`.
    ///
    /// A scalar broadcasts against anything. Otherwise the layouts must
    /// match; a vector wins over the equivalent `(n, 1)` matrix.
    pub fn broadcast(&self, other: &Shape) -> Option<Shape> {
        if self.is_scalar() {
            return Some(other.clone());
        }
        if other.is_scalar() {
            return Some(self.clone());
        }
        if !self.same_layout(other) {
            return None;
        }
        if self.is_vector() || !other.is_vector() {
            Some(self.clone())
        } else {
            Some(other.clone())
        }
    }

    /// Result shape of `self @ other`.
    pub fn matmul(&self, other: &Shape) -> Option<Shape> {
        match (self.ndim(), other.ndim()) {
            (2, 2) if self.cols() == other.rows() => {
                Some(Shape::matrix(self.rows(), other.cols()))
            }
            (2, 1) if self.cols() == other.rows() => Some(Shape::vector(self.rows())),
            // vector on the left acts as a row vector
            (1, 2) if self.rows() == other.rows() => Some(Shape::vector(other.cols())),
            (1, 1) if self.rows() == other.rows() => Some(Shape::scalar()),
            _ => None,
        }
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shape{}", self)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => write!(f, "()"),
            [n] => write!(f, "({},)", n),
            [m, n] => write!(f, "({}, {})", m, n),
            _ => unreachable!("shapes have at most two dimensions"),
        }
    }
}

impl From<()> for Shape {
    fn from(_: ()) -> Self {
        Shape::scalar()
    }
}

impl From<usize> for Shape {
    fn from(n: usize) -> Self {
        Shape::vector(n)
    }
}

impl From<(usize,)> for Shape {
    fn from((n,): (usize,)) -> Self {
        Shape::vector(n)
    }
}

impl From<(usize, usize)> for Shape {
    fn from((m, n): (usize, usize)) -> Self {
        Shape::matrix(m, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_queries() {
        let s = Shape::scalar();
        assert_eq!((s.size(), s.rows(), s.cols()), (1, 1, 1));

        let v = Shape::vector(4);
        assert_eq!((v.size(), v.rows(), v.cols()), (4, 4, 1));
        assert!(v.same_layout(&Shape::matrix(4, 1)));

        let m = Shape::matrix(2, 3);
        assert_eq!((m.size(), m.rows(), m.cols()), (6, 2, 3));
    }

    #[test]
    fn test_transpose() {
        assert_eq!(Shape::vector(3).transpose(), Shape::matrix(1, 3));
        assert_eq!(Shape::matrix(2, 5).transpose(), Shape::matrix(5, 2));
    }

    #[test]
    fn test_broadcast_prefers_vector() {
        assert_eq!(
            Shape::matrix(3, 1).broadcast(&Shape::vector(3)),
            Some(Shape::vector(3))
        );
        assert_eq!(
            Shape::scalar().broadcast(&Shape::matrix(2, 2)),
            Some(Shape::matrix(2, 2))
        );
        assert_eq!(Shape::vector(3).broadcast(&Shape::vector(4)), None);
        // no numpy-style outer broadcasting
        assert_eq!(Shape::vector(3).broadcast(&Shape::matrix(1, 3)), None);
    }

    #[test]
    fn test_matmul_shapes() {
        assert_eq!(
            Shape::matrix(3, 4).matmul(&Shape::vector(4)),
            Some(Shape::vector(3))
        );
        assert_eq!(
            Shape::vector(3).matmul(&Shape::matrix(3, 2)),
            Some(Shape::vector(2))
        );
        assert_eq!(Shape::vector(3).matmul(&Shape::vector(3)), Some(Shape::scalar()));
        assert_eq!(Shape::matrix(3, 4).matmul(&Shape::matrix(3, 4)), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Shape::scalar().to_string(), "()");
        assert_eq!(Shape::vector(7).to_string(), "(7,)");
        assert_eq!(Shape::matrix(2, 3).to_string(), "(2, 3)");
    }
}
