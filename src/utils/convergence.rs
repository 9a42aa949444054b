//! Convergence tracking & threshold checks for the shifted solver.

/// Relative-residual stopping test shared by every shift.
#[derive(Clone, Copy, Debug)]
pub struct Convergence {
    pub threshold: f64,
}

impl Convergence {
    /// True once `res_norm / res0_norm` drops strictly below the threshold.
    pub fn check(&self, res_norm: f64, res0_norm: f64) -> bool {
        res_norm / res0_norm < self.threshold
    }
}

/// Per-shift outcome returned by `finalize`.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvergenceReport {
    /// Iteration at which each shift converged, 0 if it never did.
    pub conv_itr: Vec<usize>,
    /// Residual-norm estimate of each shift.
    pub conv_res: Vec<f64>,
}

impl ConvergenceReport {
    pub fn converged_count(&self) -> usize {
        self.conv_itr.iter().filter(|&&it| it != 0).count()
    }

    pub fn all_converged(&self) -> bool {
        self.conv_itr.iter().all(|&it| it != 0)
    }
}

/// Stats of a complete driver run.
#[derive(Clone, Debug)]
pub struct SolveStats {
    /// Number of outer iterations performed.
    pub iterations: usize,
    /// Whether every shift converged.
    pub converged: bool,
    /// Whether the run stopped on an exhausted Krylov subspace.
    pub breakdown: bool,
    pub report: ConvergenceReport,
}
