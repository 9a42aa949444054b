//! gsminres: generalized shifted MINRES for families of shifted Hermitian systems
//!
//! Solves `(A + σ_m B) x_m = b` for many complex shifts σ_m at the cost of a single
//! generalized Lanczos process, with A Hermitian and B Hermitian positive definite.
//! The core solver is matrix-free and driven step by step by the caller; a driver
//! context, B-solve strategies (packed Cholesky, inner CG), operator types and a C ABI
//! are provided on top.

pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod ffi;
pub mod matrix;
pub mod solver;
pub mod utils;

// Re-exports for convenience
pub use crate::config::*;
pub use crate::context::*;
pub use crate::core::*;
pub use crate::error::*;
pub use crate::matrix::*;
pub use crate::solver::*;

pub use crate::utils::convergence::{ConvergenceReport, SolveStats};
