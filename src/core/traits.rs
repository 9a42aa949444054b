//! Core linear-algebra traits for gsminres.

use crate::error::GsError;
use num_complex::Complex64 as C64;

/// Matrix–vector product: y ← A x.
pub trait MatVec<V: ?Sized> {
    /// Compute y = A · x.
    fn matvec(&self, x: &V, y: &mut V);
}

/// Inner products & norms.
pub trait InnerProduct<V: ?Sized> {
    /// Associated scalar type.
    type Scalar: Copy;
    /// Associated real type (norms).
    type Real: Copy + PartialOrd;
    /// Compute the conjugate dot product Σ conj(x_i)·y_i.
    fn dot(&self, x: &V, y: &V) -> Self::Scalar;
    /// Compute ‖x‖₂.
    fn norm(&self, x: &V) -> Self::Real;
}

/// Application of B⁻¹ for the Hermitian positive-definite matrix B.
///
/// Implementors write the solution of `B·x = rhs` into `x`. Any failure must be
/// reported here; the shifted solver cannot detect a corrupted `B⁻¹` vector.
pub trait BSolve {
    fn solve_b(&mut self, rhs: &[C64], x: &mut [C64]) -> Result<(), GsError>;
}

/// `B = I`: the solve is a copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityB;

impl BSolve for IdentityB {
    fn solve_b(&mut self, rhs: &[C64], x: &mut [C64]) -> Result<(), GsError> {
        if rhs.len() != x.len() {
            return Err(GsError::mismatch("B-solve output", rhs.len(), x.len()));
        }
        x.copy_from_slice(rhs);
        Ok(())
    }
}

/// Uniform indexing into vectors and operators.
pub trait Indexing {
    /// Number of rows (or length for a vector).
    fn nrows(&self) -> usize;
}
