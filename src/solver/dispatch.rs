//! Problem classification and solver selection.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use nalgebra::DVector;

use super::clarabel::ClarabelBackend;
use super::settings::Settings;
use super::status::SolveStatus;
use crate::data::ProblemData;
use crate::error::{Error, Result};

/// Cone features a problem needs from its solver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ProblemClass {
    pub quadratic: bool,
    pub soc: bool,
    pub exp: bool,
    pub power: bool,
    pub psd: bool,
}

/// The most general feature of a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProblemKind {
    LP,
    QP,
    SOCP,
    ExpCone,
    PowCone,
    SDP,
}

impl ProblemClass {
    pub fn kind(&self) -> ProblemKind {
        if self.psd {
            ProblemKind::SDP
        } else if self.power {
            ProblemKind::PowCone
        } else if self.exp {
            ProblemKind::ExpCone
        } else if self.soc {
            ProblemKind::SOCP
        } else if self.quadratic {
            ProblemKind::QP
        } else {
            ProblemKind::LP
        }
    }
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProblemKind::LP => "LP",
            ProblemKind::QP => "QP",
            ProblemKind::SOCP => "SOCP",
            ProblemKind::ExpCone => "exponential cone",
            ProblemKind::PowCone => "power cone",
            ProblemKind::SDP => "SDP",
        };
        f.write_str(s)
    }
}

/// Raw output of a backend, in the column and row order of `ProblemData`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSolution {
    pub status: SolveStatus,
    /// Primal values for every column.
    pub x: DVector<f64>,
    /// Duals of the equality rows `A x = b`.
    pub y: DVector<f64>,
    /// Duals of the cone rows `G x + s = h`.
    pub z: DVector<f64>,
    pub iterations: u32,
    /// Seconds spent inside the solver.
    pub solve_time: f64,
    /// Registry name of the backend that produced this.
    pub solver: String,
}

/// A conic solver the dispatcher can call.
pub trait SolverBackend: Send + Sync {
    /// Registry name, e.g. `"clarabel"`.
    fn name(&self) -> &str;

    /// Whether the backend handles every feature of `class`.
    fn supports(&self, class: &ProblemClass) -> bool;

    /// Solve validated problem data. Solver outcomes go in the returned
    /// status; `Err` is reserved for failures to run at all.
    fn solve(&self, data: &ProblemData, settings: &Settings) -> Result<RawSolution>;
}

/// Ordered collection of available backends.
#[derive(Clone)]
pub struct SolverRegistry {
    backends: Vec<Arc<dyn SolverBackend>>,
}

impl Default for SolverRegistry {
    /// A registry holding Clarabel.
    fn default() -> Self {
        let mut registry = SolverRegistry::empty();
        registry.register(ClarabelBackend);
        registry
    }
}

impl fmt::Debug for SolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolverRegistry")
            .field("backends", &self.names())
            .finish()
    }
}

impl SolverRegistry {
    pub fn empty() -> Self {
        SolverRegistry {
            backends: Vec::new(),
        }
    }

    /// Add a backend, replacing any existing one with the same name.
    pub fn register(&mut self, backend: impl SolverBackend + 'static) {
        let backend: Arc<dyn SolverBackend> = Arc::new(backend);
        match self.backends.iter().position(|b| b.name() == backend.name()) {
            Some(i) => self.backends[i] = backend,
            None => self.backends.push(backend),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.name().to_string()).collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn SolverBackend>> {
        self.backends
            .iter()
            .find(|b| b.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Pick a backend for `class`: the preferred one if named, otherwise
    /// the first registered backend that supports it.
    pub fn select(
        &self,
        class: &ProblemClass,
        preferred: Option<&str>,
    ) -> Result<Arc<dyn SolverBackend>> {
        let kind = class.kind();
        if let Some(name) = preferred {
            let backend = self
                .get(name)
                .ok_or_else(|| Error::UnknownSolver(name.to_string()))?;
            if !backend.supports(class) {
                return Err(Error::SolverIncompatible {
                    solver: backend.name().to_string(),
                    kind: kind.to_string(),
                });
            }
            return Ok(backend);
        }
        self.backends
            .iter()
            .find(|b| b.supports(class))
            .cloned()
            .ok_or_else(|| Error::NoSolver {
                kind: kind.to_string(),
            })
    }

    /// Select a backend and wrap it in a [`SolvingChain`].
    pub fn chain(&self, class: ProblemClass, preferred: Option<&str>) -> Result<SolvingChain> {
        let backend = self.select(&class, preferred)?;
        debug!("dispatching {} problem to {}", class.kind(), backend.name());
        Ok(SolvingChain { backend, class })
    }
}

/// The selected backend for a compiled problem.
#[derive(Clone)]
pub struct SolvingChain {
    pub backend: Arc<dyn SolverBackend>,
    pub class: ProblemClass,
}

impl fmt::Debug for SolvingChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolvingChain")
            .field("backend", &self.backend.name())
            .field("class", &self.class)
            .finish()
    }
}

impl SolvingChain {
    pub fn solver_name(&self) -> &str {
        self.backend.name()
    }

    /// Validate `data` and hand it to the backend. No DCP verification or
    /// recompilation happens here.
    pub fn solve_via_data(&self, data: &ProblemData, settings: &Settings) -> Result<RawSolution> {
        data.validate()?;
        let start = Instant::now();
        let raw = self.backend.solve(data, settings)?;
        info!(
            "{}: {} after {} iterations ({:.3} ms)",
            raw.solver,
            raw.status,
            raw.iterations,
            start.elapsed().as_secs_f64() * 1e3
        );
        if raw.status.is_inaccurate() || raw.status == SolveStatus::SolverError {
            warn!("{} finished with status {}", raw.solver, raw.status);
        }
        Ok(raw)
    }
}
