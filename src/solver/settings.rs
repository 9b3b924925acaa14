//! Solver settings.

use std::str::FromStr;

use log::{info, warn};

/// Settings forwarded to the solver backend.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Settings {
    /// Print solver output.
    pub verbose: bool,
    /// Maximum iterations.
    pub max_iter: u32,
    /// Time limit in seconds.
    pub time_limit: f64,
    /// Absolute duality gap tolerance.
    pub tol_gap_abs: f64,
    /// Relative duality gap tolerance.
    pub tol_gap_rel: f64,
    /// Feasibility tolerance.
    pub tol_feas: f64,
    /// Preferred solver by registry name.
    pub solver: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            verbose: false,
            max_iter: 100,
            time_limit: f64::INFINITY,
            tol_gap_abs: 1e-8,
            tol_gap_rel: 1e-8,
            tol_feas: 1e-8,
            solver: None,
        }
    }
}

fn num_by_env<N: FromStr + std::fmt::Display>(key: &str) -> Option<N> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<N>() {
        Ok(v) => {
            info!("{}: {}", key, v);
            Some(v)
        }
        Err(_) => {
            warn!("{}: ignoring unparsable value {:?}", key, raw);
            None
        }
    }
}

/// `1/0`, `true/false`, `yes/no`, `on/off`, any case.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn flag_by_env(key: &str) -> Option<bool> {
    let raw = std::env::var(key).ok()?;
    match parse_flag(&raw) {
        Some(v) => {
            info!("{}: {}", key, v);
            Some(v)
        }
        None => {
            warn!("{}: ignoring unparsable flag {:?}", key, raw);
            None
        }
    }
}

impl Settings {
    /// Defaults overlaid with `CVXPIPE_*` environment variables.
    pub fn from_env() -> Self {
        Settings::default().with_env()
    }

    /// Overlay `CVXPIPE_MAX_ITER`, `CVXPIPE_TIME_LIMIT`, `CVXPIPE_TOL_GAP_ABS`,
    /// `CVXPIPE_TOL_GAP_REL`, `CVXPIPE_TOL_FEAS`, `CVXPIPE_VERBOSE` and
    /// `CVXPIPE_SOLVER` onto `self`. `CVXPIPE_VERBOSE` accepts `1`/`0`,
    /// `true`/`false`, `yes`/`no` or `on`/`off`.
    pub fn with_env(mut self) -> Self {
        self.max_iter = num_by_env("CVXPIPE_MAX_ITER").unwrap_or(self.max_iter);
        self.time_limit = num_by_env("CVXPIPE_TIME_LIMIT").unwrap_or(self.time_limit);
        self.tol_gap_abs = num_by_env("CVXPIPE_TOL_GAP_ABS").unwrap_or(self.tol_gap_abs);
        self.tol_gap_rel = num_by_env("CVXPIPE_TOL_GAP_REL").unwrap_or(self.tol_gap_rel);
        self.tol_feas = num_by_env("CVXPIPE_TOL_FEAS").unwrap_or(self.tol_feas);
        self.verbose = flag_by_env("CVXPIPE_VERBOSE").unwrap_or(self.verbose);
        if let Ok(name) = std::env::var("CVXPIPE_SOLVER") {
            info!("CVXPIPE_SOLVER: {}", name);
            self.solver = Some(name);
        }
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn max_iter(mut self, max_iter: u32) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = seconds;
        self
    }

    pub fn solver(mut self, name: impl Into<String>) -> Self {
        self.solver = Some(name.into());
        self
    }
}
