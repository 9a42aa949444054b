//! Driver for the shifted solver.
//!
//! `ShiftedSolveContext` bundles the A operator, a B-solve and the solver options, and
//! runs the full `initialize → {pre, B-solve, pst, update}* → finalize` protocol of
//! [`GsMinresSolver`] for one right-hand side and a set of shifts.
//!
//! # Usage
//!
//! 1. Construct a `ShiftedSolveContext` with an operator for A (anything implementing
//!    `MatVec<[Complex64]>` and `Indexing`), a `BSolve` (packed Cholesky, inner CG, or
//!    `IdentityB`) and `SolverOptions`.
//! 2. Call `solve` with `b`, the shifts and a solution buffer of length `n·m`.

use crate::config::SolverOptions;
use crate::core::traits::{BSolve, Indexing, MatVec};
use crate::error::GsError;
use crate::solver::{GsMinresSolver, LanczosStatus};
use crate::utils::convergence::SolveStats;
use num_complex::Complex64 as C64;
use num_traits::Zero;

/// Context and configuration for a shifted solve.
pub struct ShiftedSolveContext<A, S> {
    /// Hermitian operator A
    pub a: A,
    /// Solver for systems with the HPD matrix B
    pub b_solver: S,
    pub options: SolverOptions,
}

impl<A, S> ShiftedSolveContext<A, S>
where
    A: MatVec<[C64]> + Indexing,
    S: BSolve,
{
    pub fn new(a: A, b_solver: S, options: SolverOptions) -> Self {
        Self { a, b_solver, options }
    }

    /// Solve `(A + σ_m B) x_m = b` for every shift.
    ///
    /// `x` has length `b.len() * sigma.len()`; shift m occupies `x[m·n..(m+1)·n]`.
    /// Running out of iterations is not an error: the returned stats report which
    /// shifts converged.
    pub fn solve(&mut self, b: &[C64], sigma: &[C64], x: &mut [C64]) -> Result<SolveStats, GsError> {
        let n = b.len();
        let m = sigma.len();
        if self.a.nrows() != n {
            return Err(GsError::mismatch("operator A", n, self.a.nrows()));
        }
        let mut solver = GsMinresSolver::new(n, m)?.with_breakdown_tol(self.options.breakdown_tol);
        let mut w = vec![C64::zero(); n];
        let mut u = vec![C64::zero(); n];
        let mut res = vec![0.0; m];

        self.b_solver.solve_b(b, &mut w)?;
        solver.initialize(x, b, &mut w, sigma, self.options.threshold)?;

        let mut iterations = 0;
        let mut converged = false;
        let mut breakdown = false;
        for j in 1..=self.options.max_iters {
            self.a.matvec(&w, &mut u);
            solver.glanczos_pre(&mut u)?;
            self.b_solver.solve_b(&u, &mut w)?;
            let status = solver.glanczos_pst(&mut w, &mut u)?;
            converged = solver.update(x)?;
            iterations = j;

            let interval = self.options.report_interval;
            if interval > 0 && j % interval == 0 {
                solver.get_residual(&mut res)?;
                let worst = res.iter().cloned().fold(0.0, f64::max);
                log::info!(
                    "iter {}: {}/{} shifts converged, max residual estimate {:e}",
                    j,
                    solver.converged_count(),
                    m,
                    worst / solver.r0_norm()
                );
            }
            if converged {
                break;
            }
            if status == LanczosStatus::Breakdown {
                log::warn!(
                    "stopping at iteration {}: Krylov subspace exhausted with {}/{} shifts converged",
                    j,
                    solver.converged_count(),
                    m
                );
                breakdown = true;
                break;
            }
        }

        Ok(SolveStats {
            iterations,
            converged,
            breakdown,
            report: solver.finalize(),
        })
    }
}

/// True residual norms `‖A x_m + σ_m B x_m − b‖₂` for every shift.
pub fn shifted_residual_norms<A, B>(a: &A, b_mat: &B, b: &[C64], sigma: &[C64], x: &[C64]) -> Vec<f64>
where
    A: MatVec<[C64]> + ?Sized,
    B: MatVec<[C64]> + ?Sized,
{
    let n = b.len();
    let mut ax = vec![C64::zero(); n];
    let mut bx = vec![C64::zero(); n];
    sigma
        .iter()
        .zip(x.chunks(n))
        .map(|(s, xm)| {
            a.matvec(xm, &mut ax);
            b_mat.matvec(xm, &mut bx);
            ax.iter()
                .zip(&bx)
                .zip(b)
                .map(|((axi, bxi), bi)| (axi + s * bxi - bi).norm_sqr())
                .sum::<f64>()
                .sqrt()
        })
        .collect()
}
