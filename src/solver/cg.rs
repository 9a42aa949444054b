//! Conjugate Gradient for Hermitian positive-definite systems (Saad §6.7).
//!
//! Used as an inner solver for `B·w = u` when B is only available as an operator.
//! A solve that does not reach its tolerance is an error: the shifted solver has no
//! way to detect an inaccurate `B⁻¹u` and would silently lose B-orthogonality.

use crate::config::SolverOptions;
use crate::core::traits::{BSolve, InnerProduct, MatVec};
use crate::error::GsError;
use num_complex::Complex64 as C64;
use num_traits::Zero;

#[derive(Clone, Debug)]
pub struct CgStats {
    pub iterations: usize,
    pub final_residual: f64,
    pub converged: bool,
}

pub struct CgSolver {
    pub tol: f64,
    pub max_iters: usize,
}

impl CgSolver {
    pub fn new(tol: f64, max_iters: usize) -> Self {
        Self { tol, max_iters }
    }

    /// Solve `a·x = b` from a zero initial guess. `x` is overwritten.
    pub fn solve<M>(&self, a: &M, b: &[C64], x: &mut [C64]) -> Result<CgStats, GsError>
    where
        M: MatVec<[C64]> + ?Sized,
    {
        let n = b.len();
        if x.len() != n {
            return Err(GsError::mismatch("CG solution", n, x.len()));
        }
        let ip = ();
        x.fill(C64::zero());
        let b_norm = ip.norm(b);
        if b_norm == 0.0 {
            return Ok(CgStats { iterations: 0, final_residual: 0.0, converged: true });
        }

        let mut r = b.to_vec();
        let mut p = r.clone();
        let mut ap = vec![C64::zero(); n];
        let mut rr = ip.dot(&r, &r).re;
        let mut stats = CgStats { iterations: 0, final_residual: 1.0, converged: false };

        for i in 1..=self.max_iters {
            a.matvec(&p, &mut ap);
            let pap = ip.dot(&p, &ap).re;
            if !(pap > 0.0) {
                return Err(GsError::NotPositiveDefinite { pivot: i });
            }
            let alpha = rr / pap;
            for (xj, pj) in x.iter_mut().zip(&p) {
                *xj += *pj * alpha;
            }
            for (rj, apj) in r.iter_mut().zip(&ap) {
                *rj -= *apj * alpha;
            }
            let rel = ip.norm(&r) / b_norm;
            stats = CgStats { iterations: i, final_residual: rel, converged: rel < self.tol };
            if stats.converged {
                return Ok(stats);
            }
            let rr_new = ip.dot(&r, &r).re;
            let beta = rr_new / rr;
            for (pj, rj) in p.iter_mut().zip(&r) {
                *pj = *rj + *pj * beta;
            }
            rr = rr_new;
        }
        Ok(stats)
    }
}

/// B-solve by inner CG against an operator for B.
pub struct CgBSolve<M> {
    pub b: M,
    pub cg: CgSolver,
}

impl<M: MatVec<[C64]>> CgBSolve<M> {
    pub fn new(b: M, tol: f64, max_iters: usize) -> Self {
        Self { b, cg: CgSolver::new(tol, max_iters) }
    }

    /// Take the inner tolerance and budget from `cg_tol` / `cg_max_iters`.
    pub fn with_options(b: M, options: &SolverOptions) -> Self {
        Self::new(b, options.cg_tol, options.cg_max_iters)
    }
}

impl<M: MatVec<[C64]>> BSolve for CgBSolve<M> {
    fn solve_b(&mut self, rhs: &[C64], x: &mut [C64]) -> Result<(), GsError> {
        let stats = self.cg.solve(&self.b, rhs, x)?;
        if !stats.converged {
            return Err(GsError::InnerSolveFailed {
                iterations: stats.iterations,
                residual: stats.final_residual,
            });
        }
        Ok(())
    }
}
