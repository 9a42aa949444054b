//! Driver context for shifted solves.
//!
//! [`ShiftedSolveContext`] owns the A operator, the B-solve strategy and the options,
//! and runs the complete solver protocol for callers that do not need to interleave
//! their own work between Lanczos steps.
//!
//! # Example
//! ```rust
//! use gsminres::{IdentityB, HermitianPacked, ShiftedSolveContext, SolverOptions};
//! use num_complex::Complex64;
//!
//! let a = HermitianPacked::from_fn(3, |i, j| {
//!     if i == j { Complex64::new((i + 1) as f64, 0.0) } else { Complex64::new(0.0, 0.0) }
//! });
//! let b = vec![Complex64::new(1.0, 0.0); 3];
//! let sigma = [Complex64::new(0.0, 0.5)];
//! let mut x = vec![Complex64::new(0.0, 0.0); 3];
//! let mut ctx = ShiftedSolveContext::new(a, IdentityB, SolverOptions::default().with_threshold(1e-10));
//! let stats = ctx.solve(&b, &sigma, &mut x).unwrap();
//! assert!(stats.converged);
//! ```

pub mod shift_context;
pub use shift_context::{ShiftedSolveContext, shifted_residual_norms};
