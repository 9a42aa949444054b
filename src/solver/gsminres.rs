//! Generalized shifted MINRES
//!
//! Solves the family `(A + σ_m B) x_m = b`, m = 1..M, with A Hermitian, B Hermitian
//! positive definite and complex shifts σ_m. All shifts share one generalized Lanczos
//! basis for the pencil (A, B); each shift keeps its own incremental QR factorisation
//! of the shifted tridiagonal matrix (three retained Givens rotations) and its own
//! three-term search-direction recurrence.
//!
//! The solver is matrix-free. The caller drives it through a five-call protocol and
//! supplies every product with A and every solve with B:
//!
//! ```text
//! solver.initialize(x, b, w /* = B⁻¹b */, sigma, threshold)?;
//! loop {
//!     u = A·w;
//!     solver.glanczos_pre(u)?;
//!     w = B⁻¹·u;
//!     solver.glanczos_pst(w, u)?;
//!     if solver.update(x)? { break; }
//! }
//! let report = solver.finalize();
//! ```
//!
//! # Deflation
//! A shift whose residual estimate `h_m / r0_norm` drops below the threshold is frozen:
//! its solution, residual estimate and rotation history are never touched again, and it
//! costs nothing in later iterations.
//!
//! # Breakdown
//! If `beta_curr` vanishes relative to the current column, `A·w_curr` lies in the span
//! of the existing basis. The step is completed without dividing by the vanishing value
//! ([`LanczosStatus::Breakdown`]); the following `update` records the residual
//! estimates, and any attempt to extend the basis afterwards fails with
//! [`GsError::Breakdown`].
//!
//! # References
//! - Paige, C. C. & Saunders, M. A. (1975). Solution of sparse indefinite systems of
//!   linear equations. SIAM J. Numer. Anal. 12(4).
//! - Frommer, A. (2003). BiCGStab(ℓ) for families of shifted linear systems. Computing 70.

use crate::config::options::DEFAULT_BREAKDOWN_TOL;
use crate::core::blas;
use crate::error::GsError;
use crate::utils::convergence::{Convergence, ConvergenceReport};
use num_complex::Complex64 as C64;
use num_traits::{One, Zero};

// Slots of the rolling Lanczos windows.
const PREV: usize = 0;
const CURR: usize = 1;
const NEXT: usize = 2;

/// Outcome of the post-processing half of a Lanczos step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LanczosStatus {
    /// A new basis vector was produced.
    Continue,
    /// `beta_curr` vanished: the Krylov subspace is invariant and cannot be extended.
    Breakdown,
}

/// Last four entries of the current tridiagonal column, rotated in place.
#[derive(Copy, Clone, Debug)]
struct TridiagColumn {
    prev2: C64,
    prev: C64,
    curr: C64,
    next: C64,
}

/// Quantities shared by every shift during one `update`.
struct LanczosStep<'a> {
    alpha: f64,
    beta_prev: f64,
    beta_curr: f64,
    iter: usize,
    r0_norm: f64,
    conv: Convergence,
    w_curr: &'a [C64],
}

/// QR and search-direction state of a single shift.
#[derive(Clone, Debug)]
struct ShiftState {
    sigma: C64,
    /// Rotation cosines, oldest first.
    gc: [f64; 3],
    /// Rotation sines, oldest first.
    gs: [C64; 3],
    /// `[p_prev2, p_prev, p_curr]`
    p: [Vec<C64>; 3],
    f: C64,
    h: f64,
    conv_itr: usize,
}

impl ShiftState {
    fn new(n: usize) -> Self {
        Self {
            sigma: C64::zero(),
            gc: [0.0; 3],
            gs: [C64::zero(); 3],
            p: [vec![C64::zero(); n], vec![C64::zero(); n], vec![C64::zero(); n]],
            f: C64::one(),
            h: 1.0,
            conv_itr: 0,
        }
    }

    fn reset(&mut self, sigma: C64, r0_norm: f64) {
        self.sigma = sigma;
        self.gc = [0.0; 3];
        self.gs = [C64::zero(); 3];
        for p in self.p.iter_mut() {
            p.fill(C64::zero());
        }
        self.f = C64::one();
        self.h = r0_norm;
        self.conv_itr = 0;
    }

    fn is_active(&self) -> bool {
        self.conv_itr == 0
    }

    /// Fold the current Lanczos column into this shift's QR factorisation and update
    /// its solution `x`. Returns true if the shift converged in this step.
    fn advance(&mut self, step: &LanczosStep<'_>, x: &mut [C64]) -> bool {
        let mut t = TridiagColumn {
            prev2: C64::zero(),
            prev: C64::from(step.beta_prev),
            curr: C64::from(step.alpha) + self.sigma,
            next: C64::from(step.beta_curr),
        };
        if step.iter >= 3 {
            blas::rot_pair(&mut t.prev2, &mut t.prev, self.gc[0], self.gs[0]);
        }
        if step.iter >= 2 {
            blas::rot_pair(&mut t.prev, &mut t.curr, self.gc[1], self.gs[1]);
        }
        let (c, s) = blas::zrotg(&mut t.curr, t.next);
        self.gc[2] = c;
        self.gs[2] = s;

        // p_prev2 <- p_prev, p_prev <- p_curr; the old p_prev2 buffer is reused for p_curr.
        self.p.rotate_left(1);
        let [p_prev2, p_prev, p_curr] = &mut self.p;
        blas::zcopy(step.w_curr, p_curr);
        blas::zaxpy(-t.prev2, p_prev2.as_slice(), p_curr);
        blas::zaxpy(-t.prev, p_prev.as_slice(), p_curr);
        if t.curr.is_zero() {
            // Singular on the current subspace; c is 0 so x would not move anyway.
            p_curr.fill(C64::zero());
        } else {
            blas::zscal(C64::one() / t.curr, p_curr);
        }

        blas::zaxpy(C64::from(step.r0_norm * c) * self.f, p_curr.as_slice(), x);

        self.f = -s.conj() * self.f;
        self.h *= s.norm();

        if step.conv.check(self.h, step.r0_norm) {
            self.conv_itr = step.iter;
            log::debug!(
                "shift {} converged at iteration {} (h = {:e})",
                self.sigma,
                step.iter,
                self.h
            );
            return true;
        }

        self.gc.rotate_left(1);
        self.gs.rotate_left(1);
        false
    }
}

/// Generalized shifted MINRES solver for `(A + σ_m B) x_m = b`.
///
/// All buffers are sized at construction from the matrix size N and the shift count M
/// and never reallocated. Solutions are stored shift-major in one buffer of length N·M:
/// shift m occupies `x[m·N..(m+1)·N]`.
#[derive(Clone, Debug)]
pub struct GsMinresSolver {
    matrix_size: usize,
    shift_size: usize,
    /// 1-based, advanced by `update`.
    iter: usize,
    r0_norm: f64,
    conv: Convergence,
    breakdown_tol: f64,
    alpha: f64,
    beta_prev: f64,
    beta_curr: f64,
    /// Basis vectors `[prev, curr, next]`.
    w: [Vec<C64>; 3],
    /// Their images `B·w`, `[prev, curr, next]`.
    u: [Vec<C64>; 3],
    shifts: Vec<ShiftState>,
    conv_num: usize,
    initialized: bool,
    breakdown: bool,
    exhausted: bool,
}

impl GsMinresSolver {
    /// Allocate a solver for matrices of size `matrix_size` and `shift_size` shifts.
    pub fn new(matrix_size: usize, shift_size: usize) -> Result<Self, GsError> {
        if matrix_size == 0 || shift_size == 0 {
            return Err(GsError::EmptyProblem {
                n: matrix_size,
                m: shift_size,
            });
        }
        let zeros = || vec![C64::zero(); matrix_size];
        Ok(Self {
            matrix_size,
            shift_size,
            iter: 1,
            r0_norm: 0.0,
            conv: Convergence { threshold: 1e-12 },
            breakdown_tol: DEFAULT_BREAKDOWN_TOL,
            alpha: 0.0,
            beta_prev: 0.0,
            beta_curr: 0.0,
            w: [zeros(), zeros(), zeros()],
            u: [zeros(), zeros(), zeros()],
            shifts: (0..shift_size).map(|_| ShiftState::new(matrix_size)).collect(),
            conv_num: 0,
            initialized: false,
            breakdown: false,
            exhausted: false,
        })
    }

    /// Set the relative tolerance used to detect a vanishing `beta_curr`.
    pub fn with_breakdown_tol(mut self, tol: f64) -> Self {
        self.breakdown_tol = tol;
        self
    }

    /// Reset the solver for a new right-hand side.
    ///
    /// # Arguments
    /// * `x` - Solution buffer (length N·M), zeroed on return
    /// * `b` - Right-hand side
    /// * `w` - On input `B⁻¹b`; on output the first basis vector, `B⁻¹b / ‖b‖_{B⁻¹}`
    /// * `sigma` - Shifts (length M)
    /// * `threshold` - Relative residual bound for convergence
    pub fn initialize(
        &mut self,
        x: &mut [C64],
        b: &[C64],
        w: &mut [C64],
        sigma: &[C64],
        threshold: f64,
    ) -> Result<(), GsError> {
        let n = self.matrix_size;
        self.check_len("solution buffer", n * self.shift_size, x.len())?;
        self.check_len("right-hand side", n, b.len())?;
        self.check_len("initial basis vector", n, w.len())?;
        self.check_len("shift array", self.shift_size, sigma.len())?;
        if !(threshold > 0.0 && threshold.is_finite()) {
            return Err(GsError::InvalidThreshold(threshold));
        }

        let bw = blas::zdotc(b, w).re;
        if bw == 0.0 {
            return Err(GsError::ZeroRightHandSide);
        }
        if !(bw > 0.0) {
            return Err(GsError::IndefiniteB {
                iteration: 0,
                value: bw,
            });
        }

        x.fill(C64::zero());
        self.r0_norm = bw.sqrt();
        let scale = 1.0 / self.r0_norm;
        blas::zcopy(w, &mut self.w[CURR]);
        blas::zcopy(b, &mut self.u[CURR]);
        blas::zdscal(scale, &mut self.w[CURR]);
        blas::zdscal(scale, &mut self.u[CURR]);
        blas::zcopy(&self.w[CURR], w);
        for slot in [PREV, NEXT] {
            self.w[slot].fill(C64::zero());
            self.u[slot].fill(C64::zero());
        }

        for (state, &s) in self.shifts.iter_mut().zip(sigma) {
            state.reset(s, self.r0_norm);
        }
        self.conv = Convergence { threshold };
        self.iter = 1;
        self.alpha = 0.0;
        self.beta_prev = 0.0;
        self.beta_curr = 0.0;
        self.conv_num = 0;
        self.breakdown = false;
        self.exhausted = false;
        self.initialized = true;
        log::debug!(
            "gsminres initialized: n = {}, shifts = {}, r0_norm = {:e}, threshold = {:e}",
            n,
            self.shift_size,
            self.r0_norm,
            threshold
        );
        Ok(())
    }

    /// First half of a generalized Lanczos step.
    ///
    /// `u` holds `A·w_curr` on entry. On return it holds
    /// `A·w_curr − alpha·u_curr − beta_prev·u_prev`, ready for the caller's B-solve.
    pub fn glanczos_pre(&mut self, u: &mut [C64]) -> Result<(), GsError> {
        self.ensure_initialized()?;
        if self.exhausted {
            return Err(GsError::Breakdown {
                iteration: self.iter,
            });
        }
        self.check_len("Lanczos vector u", self.matrix_size, u.len())?;

        self.alpha = blas::zdotc(&self.w[CURR], u).re;
        blas::zaxpy(C64::from(-self.alpha), &self.u[CURR], u);
        blas::zaxpy(C64::from(-self.beta_prev), &self.u[PREV], u);
        Ok(())
    }

    /// Second half of a generalized Lanczos step.
    ///
    /// `u` is the vector left by [`Self::glanczos_pre`] and `w` holds `B⁻¹u`. On return
    /// both are normalised by `beta_curr = sqrt(Re⟨u, w⟩)` and stored as the next basis
    /// pair; `w` is the vector the caller multiplies by A next.
    pub fn glanczos_pst(&mut self, w: &mut [C64], u: &mut [C64]) -> Result<LanczosStatus, GsError> {
        self.ensure_initialized()?;
        self.check_len("Lanczos vector w", self.matrix_size, w.len())?;
        self.check_len("Lanczos vector u", self.matrix_size, u.len())?;

        let uw = blas::zdotc(u, w).re;
        let floor = (self.breakdown_tol * self.alpha.abs().max(self.beta_prev)).powi(2);
        if uw.is_nan() || uw < -floor {
            return Err(GsError::IndefiniteB {
                iteration: self.iter,
                value: uw,
            });
        }
        if uw <= floor {
            self.beta_curr = uw.max(0.0).sqrt();
            self.w[NEXT].fill(C64::zero());
            self.u[NEXT].fill(C64::zero());
            w.fill(C64::zero());
            u.fill(C64::zero());
            self.breakdown = true;
            log::warn!(
                "Lanczos breakdown at iteration {}: beta = {:e}, Krylov subspace is invariant",
                self.iter,
                self.beta_curr
            );
            return Ok(LanczosStatus::Breakdown);
        }

        self.beta_curr = uw.sqrt();
        let scale = 1.0 / self.beta_curr;
        blas::zdscal(scale, w);
        blas::zdscal(scale, u);
        blas::zcopy(w, &mut self.w[NEXT]);
        blas::zcopy(u, &mut self.u[NEXT]);
        Ok(LanczosStatus::Continue)
    }

    /// Update the approximate solutions of all active shifts.
    ///
    /// Returns `true` once every shift has converged.
    pub fn update(&mut self, x: &mut [C64]) -> Result<bool, GsError> {
        self.ensure_initialized()?;
        let n = self.matrix_size;
        self.check_len("solution buffer", n * self.shift_size, x.len())?;

        let step = LanczosStep {
            alpha: self.alpha,
            beta_prev: self.beta_prev,
            beta_curr: self.beta_curr,
            iter: self.iter,
            r0_norm: self.r0_norm,
            conv: self.conv,
            w_curr: &self.w[CURR],
        };

        #[cfg(feature = "rayon")]
        let newly_converged: usize = {
            use rayon::prelude::*;
            self.shifts
                .par_iter_mut()
                .zip(x.par_chunks_mut(n))
                .map(|(state, xm)| usize::from(state.is_active() && state.advance(&step, xm)))
                .sum()
        };
        #[cfg(not(feature = "rayon"))]
        let newly_converged: usize = self
            .shifts
            .iter_mut()
            .zip(x.chunks_mut(n))
            .map(|(state, xm)| usize::from(state.is_active() && state.advance(&step, xm)))
            .sum();

        self.conv_num += newly_converged;
        self.beta_prev = self.beta_curr;
        // [prev, curr, next] -> [curr, next, scratch]
        self.w.rotate_left(1);
        self.u.rotate_left(1);
        if self.breakdown {
            self.exhausted = true;
        }
        self.iter += 1;
        Ok(self.conv_num == self.shift_size)
    }

    /// Convergence iteration (0 = not converged) and residual estimate of every shift.
    pub fn finalize(&self) -> ConvergenceReport {
        ConvergenceReport {
            conv_itr: self.shifts.iter().map(|s| s.conv_itr).collect(),
            conv_res: self.shifts.iter().map(|s| s.h).collect(),
        }
    }

    /// Copy the current residual estimates into `res` (length M).
    pub fn get_residual(&self, res: &mut [f64]) -> Result<(), GsError> {
        self.check_len("residual buffer", self.shift_size, res.len())?;
        for (r, state) in res.iter_mut().zip(&self.shifts) {
            *r = state.h;
        }
        Ok(())
    }

    pub fn matrix_size(&self) -> usize {
        self.matrix_size
    }

    pub fn shift_size(&self) -> usize {
        self.shift_size
    }

    /// Index of the next iteration (1 right after `initialize`).
    pub fn iteration(&self) -> usize {
        self.iter
    }

    pub fn converged_count(&self) -> usize {
        self.conv_num
    }

    pub fn r0_norm(&self) -> f64 {
        self.r0_norm
    }

    pub fn threshold(&self) -> f64 {
        self.conv.threshold
    }

    /// Whether shift `m` has converged.
    ///
    /// # Panics
    /// Panics if `m >= shift_size()`.
    pub fn is_converged(&self, m: usize) -> bool {
        !self.shifts[m].is_active()
    }

    fn ensure_initialized(&self) -> Result<(), GsError> {
        if self.initialized {
            Ok(())
        } else {
            Err(GsError::NotInitialized)
        }
    }

    fn check_len(&self, what: &'static str, expected: usize, found: usize) -> Result<(), GsError> {
        if expected == found {
            Ok(())
        } else {
            Err(GsError::mismatch(what, expected, found))
        }
    }
}
