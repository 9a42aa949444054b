//! Wrappers for faer dense matrix types and complex vector operations.
//!
//! This module implements the core traits for `faer::Mat<Complex64>`, `faer::MatRef`,
//! complex slices and `Vec<Complex64>`, so that dense matrices can be handed to the
//! shifted solver driver as the A operator (or as B inside an inner CG solve).
//!
//! # References
//! - [faer crate documentation](https://docs.rs/faer)
//! - [num-complex crate documentation](https://docs.rs/num-complex)

use crate::core::blas;
use crate::core::traits::{Indexing, InnerProduct, MatVec};
use faer::{Mat, MatRef};
use num_complex::Complex64 as C64;
use num_traits::Zero;

/// Computes `y = A * x` for a dense complex `faer::Mat`.
impl MatVec<[C64]> for Mat<C64> {
    fn matvec(&self, x: &[C64], y: &mut [C64]) {
        self.as_ref().matvec(x, y);
    }
}

/// Computes `y = A * x` for a dense complex matrix view.
impl<'a> MatVec<[C64]> for MatRef<'a, C64> {
    fn matvec(&self, x: &[C64], y: &mut [C64]) {
        assert_eq!(self.nrows(), y.len(), "Output vector y has incorrect length");
        assert_eq!(self.ncols(), x.len(), "Input vector x has incorrect length");
        for i in 0..self.nrows() {
            let mut acc = C64::zero();
            for j in 0..self.ncols() {
                acc += self[(i, j)] * x[j];
            }
            y[i] = acc;
        }
    }
}

/// Inner product over complex slices (conjugate-linear in the first argument).
impl InnerProduct<[C64]> for () {
    type Scalar = C64;
    type Real = f64;
    fn dot(&self, x: &[C64], y: &[C64]) -> C64 {
        blas::zdotc(x, y)
    }
    fn norm(&self, x: &[C64]) -> f64 {
        blas::dznrm2(x)
    }
}

impl InnerProduct<Vec<C64>> for () {
    type Scalar = C64;
    type Real = f64;
    fn dot(&self, x: &Vec<C64>, y: &Vec<C64>) -> C64 {
        blas::zdotc(x, y)
    }
    fn norm(&self, x: &Vec<C64>) -> f64 {
        blas::dznrm2(x)
    }
}

impl<T> Indexing for Mat<T> {
    fn nrows(&self) -> usize {
        self.nrows()
    }
}
