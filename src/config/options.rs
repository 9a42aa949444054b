//! API options for the shifted solver and its driver.
//!
//! `SolverOptions` carries the relative-residual threshold and the Lanczos breakdown
//! tolerance used by [`crate::solver::GsMinresSolver`], plus the outer iteration budget
//! and progress-report interval consumed by [`crate::context::ShiftedSolveContext`].
//! The inner CG tolerances apply when B is solved iteratively.

/// Solver parameters.
#[derive(Debug, Clone, Copy)]
pub struct SolverOptions {
    /// Relative residual bound `h_m / r0_norm < threshold`
    pub threshold: f64,

    /// Outer iteration budget for the driver loop
    pub max_iters: usize,

    /// `beta_curr <= breakdown_tol * max(|alpha|, beta_prev)` marks an invariant subspace
    pub breakdown_tol: f64,

    /// Log residual estimates every `report_interval` iterations (0 = never)
    pub report_interval: usize,

    /// Relative tolerance of an inner CG B-solve
    pub cg_tol: f64,

    /// Iteration budget of an inner CG B-solve
    pub cg_max_iters: usize,
}

pub const DEFAULT_BREAKDOWN_TOL: f64 = 1e-12;

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            threshold: 1e-12,
            max_iters: 10_000,
            breakdown_tol: DEFAULT_BREAKDOWN_TOL,
            report_interval: 0,
            cg_tol: 1e-12,
            cg_max_iters: 10_000,
        }
    }
}

impl SolverOptions {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    pub fn with_breakdown_tol(mut self, tol: f64) -> Self {
        self.breakdown_tol = tol;
        self
    }

    pub fn with_report_interval(mut self, interval: usize) -> Self {
        self.report_interval = interval;
        self
    }
}
