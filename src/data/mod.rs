//! Problem data: the solver-facing form of a compiled problem.
//!
//! A compiled problem is
//!
//! ```text
//! minimize    ½ xᵀ P x + cᵀ x + offset
//! subject to  A x = b
//!             G x + s = h,  s ∈ K
//! ```
//!
//! where `K` is the product of the cones listed in [`ConeDims`], in the order
//! nonnegative, second-order, exponential, power, PSD.

mod inverse;
mod stuffing;

use nalgebra::DVector;
use nalgebra_sparse::CscMatrix;

use crate::error::{Error, Result};
use crate::solver::ProblemClass;
use crate::sparse::is_upper_triangular;

pub use inverse::{ConstraintRows, InverseData, RowBlock, VariableSlot};
pub use stuffing::compile;

/// Sizes of the cones making up `K`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConeDims {
    /// Equality rows; always equals the rows of `A`.
    pub zero: usize,
    /// Rows of the nonnegative orthant.
    pub nonneg: usize,
    /// Dimension of each second-order cone.
    pub soc: Vec<usize>,
    /// Number of 3-d exponential cones.
    pub exp: usize,
    /// `α` of each 3-d power cone.
    pub power: Vec<f64>,
    /// Side length `n` of each PSD cone; it occupies `n(n+1)/2` rows.
    pub psd: Vec<usize>,
}

impl ConeDims {
    /// Rows of `G` covered by these cones.
    pub fn cone_rows(&self) -> usize {
        self.nonneg
            + self.soc.iter().sum::<usize>()
            + 3 * self.exp
            + 3 * self.power.len()
            + self.psd.iter().map(|n| n * (n + 1) / 2).sum::<usize>()
    }
}

/// Options for [`compile`] and `Problem::get_problem_data_with`.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Name of the solver to target; `None` picks the first capable one.
    pub solver: Option<String>,
    /// Run the DCP verifier before canonicalizing.
    pub verify: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            solver: None,
            verify: true,
        }
    }
}

impl CompileOptions {
    /// Skip DCP verification.
    pub fn unchecked() -> Self {
        CompileOptions {
            verify: false,
            ..Default::default()
        }
    }

    pub fn with_solver(mut self, name: impl Into<String>) -> Self {
        self.solver = Some(name.into());
        self
    }
}

/// Canonical solver input.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProblemData {
    pub c: DVector<f64>,
    /// Upper triangle of the quadratic cost; `None` for linear objectives.
    #[cfg_attr(feature = "serde", serde(rename = "P"))]
    pub p: Option<CscMatrix<f64>>,
    #[cfg_attr(feature = "serde", serde(rename = "A"))]
    pub a: CscMatrix<f64>,
    pub b: DVector<f64>,
    #[cfg_attr(feature = "serde", serde(rename = "G"))]
    pub g: CscMatrix<f64>,
    pub h: DVector<f64>,
    pub dims: ConeDims,
    pub offset: f64,
}

impl ProblemData {
    /// Keys present in this mapping.
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys = vec!["c"];
        if self.p.is_some() {
            keys.push("P");
        }
        keys.extend(["A", "b", "G", "h", "dims", "offset"]);
        keys
    }

    pub fn num_variables(&self) -> usize {
        self.c.len()
    }

    /// Equality plus cone rows.
    pub fn num_constraints(&self) -> usize {
        self.a.nrows() + self.g.nrows()
    }

    /// Cone features used by this problem.
    pub fn class(&self) -> ProblemClass {
        ProblemClass {
            quadratic: self.p.as_ref().map_or(false, |p| p.nnz() > 0),
            soc: !self.dims.soc.is_empty(),
            exp: self.dims.exp > 0,
            power: !self.dims.power.is_empty(),
            psd: !self.dims.psd.is_empty(),
        }
    }

    /// Check that every block has consistent dimensions.
    pub fn validate(&self) -> Result<()> {
        let n = self.c.len();
        let invalid = |msg: String| Err(Error::InvalidData(msg));

        if let Some(p) = &self.p {
            if p.nrows() != n || p.ncols() != n {
                return invalid(format!("P is {}x{}, expected {}x{}", p.nrows(), p.ncols(), n, n));
            }
            if !is_upper_triangular(p) {
                return invalid("P must be upper triangular".into());
            }
        }
        if self.a.ncols() != n || self.a.nrows() != self.b.len() {
            return invalid(format!(
                "A is {}x{} and b has {} entries, expected {} columns and matching rows",
                self.a.nrows(),
                self.a.ncols(),
                self.b.len(),
                n
            ));
        }
        if self.g.ncols() != n || self.g.nrows() != self.h.len() {
            return invalid(format!(
                "G is {}x{} and h has {} entries, expected {} columns and matching rows",
                self.g.nrows(),
                self.g.ncols(),
                self.h.len(),
                n
            ));
        }
        if self.dims.zero != self.a.nrows() {
            return invalid(format!(
                "dims.zero is {} but A has {} rows",
                self.dims.zero,
                self.a.nrows()
            ));
        }
        if self.dims.cone_rows() != self.g.nrows() {
            return invalid(format!(
                "cones cover {} rows but G has {}",
                self.dims.cone_rows(),
                self.g.nrows()
            ));
        }
        if let Some(alpha) = self.dims.power.iter().find(|a| !(**a > 0.0 && **a < 1.0)) {
            return invalid(format!("power cone exponent {} is outside (0, 1)", alpha));
        }
        let finite = |v: &DVector<f64>| v.iter().all(|x| x.is_finite());
        if !finite(&self.c) || !finite(&self.b) || !finite(&self.h) || !self.offset.is_finite() {
            return invalid("non-finite entry in c, b, h or offset".into());
        }
        Ok(())
    }
}
