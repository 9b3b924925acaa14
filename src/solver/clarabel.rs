//! Clarabel solver integration.
//!
//! Clarabel solves `min ½xᵀPx + qᵀx  s.t.  Ax + s = b, s ∈ K`. The equality
//! and cone blocks of `ProblemData` are stacked into one `A`, with a zero
//! cone covering the equality rows.

use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use log::trace;
use nalgebra::DVector;
use nalgebra_sparse::CscMatrix;

use super::dispatch::{ProblemClass, RawSolution, SolverBackend};
use super::settings::Settings;
use super::status::SolveStatus;
use crate::data::{ConeDims, ProblemData};
use crate::error::{Error, Result};
use crate::sparse::{csc_vstack, to_clarabel};

/// Tolerance used to decide feasibility of problems without variables.
const EMPTY_TOL: f64 = 1e-9;

impl From<SolverStatus> for SolveStatus {
    fn from(status: SolverStatus) -> Self {
        match status {
            SolverStatus::Solved => SolveStatus::Optimal,
            SolverStatus::AlmostSolved => SolveStatus::OptimalInaccurate,
            SolverStatus::PrimalInfeasible => SolveStatus::Infeasible,
            SolverStatus::AlmostPrimalInfeasible => SolveStatus::InfeasibleInaccurate,
            SolverStatus::DualInfeasible => SolveStatus::Unbounded,
            SolverStatus::AlmostDualInfeasible => SolveStatus::UnboundedInaccurate,
            SolverStatus::MaxIterations | SolverStatus::MaxTime => SolveStatus::UserLimit,
            _ => SolveStatus::SolverError,
        }
    }
}

/// The Clarabel interior-point solver.
///
/// Handles LP, QP, SOCP, exponential and power cones. PSD cones need a
/// LAPACK-enabled Clarabel build and are reported as unsupported.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClarabelBackend;

impl SolverBackend for ClarabelBackend {
    fn name(&self) -> &str {
        "clarabel"
    }

    fn supports(&self, class: &ProblemClass) -> bool {
        !class.psd
    }

    fn solve(&self, data: &ProblemData, settings: &Settings) -> Result<RawSolution> {
        if !data.dims.psd.is_empty() {
            return Err(Error::SolverIncompatible {
                solver: self.name().to_string(),
                kind: "SDP".to_string(),
            });
        }
        let n = data.num_variables();
        if n == 0 {
            return Ok(self.trivial(data));
        }

        let p = match &data.p {
            Some(p) => to_clarabel(p),
            None => to_clarabel(&CscMatrix::zeros(n, n)),
        };
        let a = to_clarabel(&csc_vstack(&[&data.a, &data.g], n));
        let b: Vec<f64> = data.b.iter().chain(data.h.iter()).copied().collect();
        let cones = to_clarabel_cones(&data.dims);
        trace!("clarabel: {} columns, {} rows, {} cones", n, b.len(), cones.len());

        let clarabel_settings = DefaultSettingsBuilder::default()
            .verbose(settings.verbose)
            .max_iter(settings.max_iter)
            .time_limit(settings.time_limit)
            .tol_gap_abs(settings.tol_gap_abs)
            .tol_gap_rel(settings.tol_gap_rel)
            .tol_feas(settings.tol_feas)
            .build()
            .map_err(|e| Error::Solver(e.to_string()))?;

        let mut solver = DefaultSolver::new(&p, data.c.as_slice(), &a, &b, &cones, clarabel_settings);
        solver.solve();

        let split = data.dims.zero;
        let z_all = &solver.solution.z;
        Ok(RawSolution {
            status: solver.solution.status.into(),
            x: DVector::from_column_slice(&solver.solution.x),
            y: DVector::from_column_slice(&z_all[..split]),
            z: DVector::from_column_slice(&z_all[split..]),
            iterations: solver.info.iterations,
            solve_time: solver.solution.solve_time,
            solver: self.name().to_string(),
        })
    }
}

impl ClarabelBackend {
    /// A problem with no columns is feasible iff its constant rows are.
    fn trivial(&self, data: &ProblemData) -> RawSolution {
        let eq_ok = data.b.iter().all(|v| v.abs() <= EMPTY_TOL);
        let cones_ok = slack_in_cones(data.h.as_slice(), &data.dims);
        trace!("clarabel: no columns, eq_ok={}, cones_ok={}", eq_ok, cones_ok);
        RawSolution {
            status: if eq_ok && cones_ok {
                SolveStatus::Optimal
            } else {
                SolveStatus::Infeasible
            },
            x: DVector::zeros(0),
            y: DVector::zeros(data.b.len()),
            z: DVector::zeros(data.h.len()),
            iterations: 0,
            solve_time: 0.0,
            solver: self.name().to_string(),
        }
    }
}

/// Whether a constant slack `s = h` lies in the cone product described by
/// `dims`, up to `EMPTY_TOL`.
fn slack_in_cones(h: &[f64], dims: &ConeDims) -> bool {
    let expected = dims.nonneg + dims.soc.iter().sum::<usize>() + 3 * dims.exp + 3 * dims.power.len();
    if h.len() < expected {
        return false;
    }
    let (nonneg, mut rest) = h.split_at(dims.nonneg);
    if nonneg.iter().any(|v| *v < -EMPTY_TOL) {
        return false;
    }
    for &len in &dims.soc {
        let (block, tail) = rest.split_at(len);
        rest = tail;
        if let Some((t, x)) = block.split_first() {
            let norm = x.iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm > t + EMPTY_TOL {
                return false;
            }
        }
    }
    for _ in 0..dims.exp {
        let (block, tail) = rest.split_at(3);
        rest = tail;
        if !in_exp_cone(block[0], block[1], block[2]) {
            return false;
        }
    }
    for &alpha in &dims.power {
        let (block, tail) = rest.split_at(3);
        rest = tail;
        let (x, y, z) = (block[0], block[1], block[2]);
        if x < -EMPTY_TOL || y < -EMPTY_TOL {
            return false;
        }
        if x.max(0.0).powf(alpha) * y.max(0.0).powf(1.0 - alpha) < z.abs() - EMPTY_TOL {
            return false;
        }
    }
    true
}

/// `(x, y, z)` with `y exp(x / y) <= z, y > 0`, or its closure
/// `x <= 0, y = 0, z >= 0`.
fn in_exp_cone(x: f64, y: f64, z: f64) -> bool {
    if y > EMPTY_TOL {
        y * (x / y).exp() <= z + EMPTY_TOL
    } else {
        y.abs() <= EMPTY_TOL && x <= EMPTY_TOL && z >= -EMPTY_TOL
    }
}

/// Convert cone dimensions to Clarabel cones, zero cone first.
fn to_clarabel_cones(dims: &ConeDims) -> Vec<SupportedConeT<f64>> {
    let mut cones = Vec::new();

    if dims.zero > 0 {
        cones.push(SupportedConeT::ZeroConeT(dims.zero));
    }
    if dims.nonneg > 0 {
        cones.push(SupportedConeT::NonnegativeConeT(dims.nonneg));
    }
    for &soc_dim in &dims.soc {
        cones.push(SupportedConeT::SecondOrderConeT(soc_dim));
    }
    for _ in 0..dims.exp {
        cones.push(SupportedConeT::ExponentialConeT());
    }
    for &alpha in &dims.power {
        cones.push(SupportedConeT::PowerConeT(alpha));
    }

    cones
}
