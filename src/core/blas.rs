//! BLAS Level-1/2 kernels on complex double-precision slices.
//!
//! These follow reference BLAS numerics (`zdscal`, `zscal`, `zcopy`, `zaxpy`, `zdotc`,
//! `dznrm2`, `zhpmv`, `zrotg`, `zrot`) with unit strides. Offsets into larger buffers
//! are expressed by slicing at the call site.
//!
//! With the `rayon` feature enabled, the reductions (`zdotc`, `dznrm2`) run as parallel
//! iterators, like the inner products in [`crate::core::wrappers`].

use num_complex::Complex64 as C64;
use num_traits::Zero;

/// x ← a·x for real `a`.
pub fn zdscal(a: f64, x: &mut [C64]) {
    for xi in x.iter_mut() {
        *xi *= a;
    }
}

/// x ← a·x for complex `a`.
pub fn zscal(a: C64, x: &mut [C64]) {
    for xi in x.iter_mut() {
        *xi *= a;
    }
}

/// y ← x.
pub fn zcopy(x: &[C64], y: &mut [C64]) {
    assert_eq!(x.len(), y.len(), "zcopy: length mismatch");
    y.copy_from_slice(x);
}

/// y ← a·x + y.
pub fn zaxpy(a: C64, x: &[C64], y: &mut [C64]) {
    assert_eq!(x.len(), y.len(), "zaxpy: length mismatch");
    if a.is_zero() {
        return;
    }
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += a * *xi;
    }
}

/// Conjugate dot product Σ conj(x_i)·y_i.
pub fn zdotc(x: &[C64], y: &[C64]) -> C64 {
    assert_eq!(x.len(), y.len(), "zdotc: length mismatch");
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        x.par_iter()
            .zip(y.par_iter())
            .map(|(xi, yi)| xi.conj() * *yi)
            .reduce(C64::zero, |acc, v| acc + v)
    }
    #[cfg(not(feature = "rayon"))]
    {
        x.iter()
            .zip(y)
            .map(|(xi, yi)| xi.conj() * *yi)
            .fold(C64::zero(), |acc, v| acc + v)
    }
}

/// Euclidean norm ‖x‖₂.
pub fn dznrm2(x: &[C64]) -> f64 {
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        x.par_iter().map(|xi| xi.norm_sqr()).sum::<f64>().sqrt()
    }
    #[cfg(not(feature = "rayon"))]
    {
        x.iter().map(|xi| xi.norm_sqr()).sum::<f64>().sqrt()
    }
}

/// y ← alpha·A·x + beta·y, with A Hermitian in packed upper storage
/// (`ap[i + j(j+1)/2]` holds `A[i][j]` for `i <= j`).
pub fn zhpmv(alpha: C64, ap: &[C64], x: &[C64], beta: C64, y: &mut [C64]) {
    let n = x.len();
    assert_eq!(y.len(), n, "zhpmv: output length mismatch");
    assert_eq!(ap.len(), n * (n + 1) / 2, "zhpmv: packed storage length mismatch");

    if beta.is_zero() {
        y.fill(C64::zero());
    } else if beta != C64::new(1.0, 0.0) {
        zscal(beta, y);
    }
    if alpha.is_zero() {
        return;
    }

    let mut kk = 0;
    for j in 0..n {
        let temp1 = alpha * x[j];
        let mut temp2 = C64::zero();
        for i in 0..j {
            let aij = ap[kk + i];
            y[i] += temp1 * aij;
            temp2 += aij.conj() * x[i];
        }
        // Diagonal of a Hermitian matrix is real; the imaginary part is ignored.
        y[j] += temp1 * ap[kk + j].re + alpha * temp2;
        kk += j + 1;
    }
}

/// Construct a plane rotation that zeroes `b` against `a`.
///
/// On return `a` holds the rotated value `r`, and `(c, s)` satisfy
/// `c·a + s·b = r`, `−conj(s)·a + c·b = 0`.
pub fn zrotg(a: &mut C64, b: C64) -> (f64, C64) {
    let abs_a = a.norm();
    if abs_a == 0.0 {
        *a = b;
        return (0.0, C64::new(1.0, 0.0));
    }
    let scale = abs_a + b.norm();
    let norm = scale * ((*a / scale).norm_sqr() + (b / scale).norm_sqr()).sqrt();
    let phase = *a / abs_a;
    let c = abs_a / norm;
    let s = phase * b.conj() / norm;
    *a = phase * norm;
    (c, s)
}

/// Apply a plane rotation to one pair of entries.
#[inline]
pub fn rot_pair(x: &mut C64, y: &mut C64, c: f64, s: C64) {
    let xv = *x;
    let yv = *y;
    *x = xv * c + s * yv;
    *y = yv * c - s.conj() * xv;
}

/// Apply a plane rotation to a pair of vectors:
/// `x' = c·x + s·y`, `y' = −conj(s)·x + c·y`.
pub fn zrot(x: &mut [C64], y: &mut [C64], c: f64, s: C64) {
    assert_eq!(x.len(), y.len(), "zrot: length mismatch");
    for (xi, yi) in x.iter_mut().zip(y.iter_mut()) {
        rot_pair(xi, yi, c, s);
    }
}
