use thiserror::Error;

// Unified error type for gsminres

#[derive(Error, Debug)]
pub enum GsError {
    #[error("matrix size and shift count must both be non-zero (got n = {n}, m = {m})")]
    EmptyProblem { n: usize, m: usize },
    #[error("dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("convergence threshold must be positive and finite (got {0})")]
    InvalidThreshold(f64),
    #[error("right-hand side has zero B-norm")]
    ZeroRightHandSide,
    #[error("solver used before initialize")]
    NotInitialized,
    #[error("B is not positive definite: Re<v, B^-1 v> = {value:e} at iteration {iteration}")]
    IndefiniteB { iteration: usize, value: f64 },
    #[error("Lanczos breakdown: Krylov subspace exhausted at iteration {iteration}")]
    Breakdown { iteration: usize },
    #[error("matrix not positive definite (non-positive pivot at row {pivot})")]
    NotPositiveDefinite { pivot: usize },
    #[error("inner B-solve did not converge in {iterations} iterations (relative residual {residual:e})")]
    InnerSolveFailed { iterations: usize, residual: f64 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error at line {line}: {msg}")]
    Parse { line: usize, msg: String },
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl GsError {
    pub(crate) fn mismatch(what: &'static str, expected: usize, found: usize) -> Self {
        GsError::DimensionMismatch {
            what,
            expected,
            found,
        }
    }
}
