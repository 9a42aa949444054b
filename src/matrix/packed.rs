//! Hermitian matrices in packed upper storage and their Cholesky factorisation (faer).
//!
//! Entry `A[i][j]` with `i <= j` lives at `ap[i + j(j+1)/2]` (column-major upper
//! triangle, LAPACK `UPLO = 'U'`). The lower triangle is implied by conjugation.

use crate::core::blas;
use crate::core::traits::{BSolve, Indexing, MatVec};
use crate::error::GsError;
use faer::linalg::solvers::{Llt, LltError, SolveCore};
use faer::{Conj, Mat, MatMut, Side};
use num_complex::Complex64 as C64;
use num_traits::{One, Zero};

#[inline]
fn packed_index(i: usize, j: usize) -> usize {
    debug_assert!(i <= j);
    i + j * (j + 1) / 2
}

#[derive(Clone, Debug, PartialEq)]
pub struct HermitianPacked {
    n: usize,
    ap: Vec<C64>,
}

impl HermitianPacked {
    /// Wrap packed upper storage of length `n(n+1)/2`.
    pub fn from_packed(n: usize, ap: Vec<C64>) -> Result<Self, GsError> {
        let expected = n * (n + 1) / 2;
        if ap.len() != expected {
            return Err(GsError::mismatch("packed storage", expected, ap.len()));
        }
        Ok(Self { n, ap })
    }

    /// Build from a function of `(i, j)` evaluated on the upper triangle only.
    pub fn from_fn(n: usize, mut f: impl FnMut(usize, usize) -> C64) -> Self {
        let mut ap = Vec::with_capacity(n * (n + 1) / 2);
        for j in 0..n {
            for i in 0..=j {
                ap.push(f(i, j));
            }
        }
        Self { n, ap }
    }

    pub fn identity(n: usize) -> Self {
        Self::from_fn(n, |i, j| if i == j { C64::one() } else { C64::zero() })
    }

    pub fn size(&self) -> usize {
        self.n
    }

    pub fn as_packed(&self) -> &[C64] {
        &self.ap
    }

    /// `A[i][j]` for any `i, j`.
    pub fn get(&self, i: usize, j: usize) -> C64 {
        if i <= j {
            self.ap[packed_index(i, j)]
        } else {
            self.ap[packed_index(j, i)].conj()
        }
    }

    /// Set `A[i][j]` (and implicitly `A[j][i] = conj`).
    pub fn set(&mut self, i: usize, j: usize, value: C64) {
        if i <= j {
            self.ap[packed_index(i, j)] = value;
        } else {
            self.ap[packed_index(j, i)] = value.conj();
        }
    }

    /// y ← alpha·A·x + beta·y.
    pub fn hpmv(&self, alpha: C64, x: &[C64], beta: C64, y: &mut [C64]) {
        blas::zhpmv(alpha, &self.ap, x, beta, y);
    }
}

impl MatVec<[C64]> for HermitianPacked {
    fn matvec(&self, x: &[C64], y: &mut [C64]) {
        self.hpmv(C64::one(), x, C64::zero(), y);
    }
}

impl Indexing for HermitianPacked {
    fn nrows(&self) -> usize {
        self.n
    }
}

/// Cholesky factorisation `A = L Lᴴ` of a Hermitian positive-definite packed matrix.
///
/// The packed matrix is expanded once into a dense `faer::Mat` and factored with faer's
/// LLᴴ; solves reuse the factor.
#[derive(Clone, Debug)]
pub struct PackedCholesky {
    n: usize,
    factor: Llt<C64>,
}

impl PackedCholesky {
    /// Factorise `a`. Fails on the first non-positive pivot.
    pub fn new(a: &HermitianPacked) -> Result<Self, GsError> {
        let n = a.n;
        let dense = Mat::from_fn(n, n, |i, j| a.get(i, j));
        let factor = dense.as_ref().llt(Side::Lower).map_err(|err| match err {
            LltError::NonPositivePivot { index } => GsError::NotPositiveDefinite { pivot: index },
        })?;
        Ok(Self { n, factor })
    }

    pub fn size(&self) -> usize {
        self.n
    }

    /// Solve `A·x = b` with the stored factor.
    pub fn solve(&self, b: &[C64], x: &mut [C64]) -> Result<(), GsError> {
        let n = self.n;
        if b.len() != n {
            return Err(GsError::mismatch("Cholesky right-hand side", n, b.len()));
        }
        if x.len() != n {
            return Err(GsError::mismatch("Cholesky solution", n, x.len()));
        }
        blas::zcopy(b, x);
        let x_mat = MatMut::from_column_major_slice_mut(x, n, 1);
        self.factor.solve_in_place_with_conj(Conj::No, x_mat);
        Ok(())
    }
}

impl BSolve for PackedCholesky {
    fn solve_b(&mut self, rhs: &[C64], x: &mut [C64]) -> Result<(), GsError> {
        self.solve(rhs, x)
    }
}
