//! C ABI for embedding the solver in other languages.
//!
//! The solver is exposed through an opaque handle created by [`gsminres_create`] and
//! released by [`gsminres_destroy`]. Complex arrays are `double _Complex` (or any
//! `{double re; double im;}` layout); every array is passed with its length. Functions
//! return [`GSMINRES_OK`] or a negative status code; [`gsminres_update`] returns
//! [`GSMINRES_CONVERGED`] once all shifts have converged, and [`gsminres_glanczos_pst`]
//! returns [`GSMINRES_BREAKDOWN`] when the Krylov subspace became invariant.

use crate::error::GsError;
use crate::solver::{GsMinresSolver, LanczosStatus};
use num_complex::Complex64 as C64;
use std::os::raw::c_int;
use std::ptr;

pub const GSMINRES_OK: c_int = 0;
pub const GSMINRES_CONVERGED: c_int = 1;
pub const GSMINRES_BREAKDOWN: c_int = 2;
pub const GSMINRES_ERR_NULL: c_int = -1;
pub const GSMINRES_ERR_DIMENSION: c_int = -2;
pub const GSMINRES_ERR_INVALID: c_int = -3;
pub const GSMINRES_ERR_NUMERICAL: c_int = -4;
pub const GSMINRES_ERR_OTHER: c_int = -5;

/// Opaque solver handle.
pub type GsMinresHandle = *mut GsMinresSolver;

fn status_of(err: &GsError) -> c_int {
    log::error!("gsminres: {err}");
    match err {
        GsError::DimensionMismatch { .. } => GSMINRES_ERR_DIMENSION,
        GsError::EmptyProblem { .. }
        | GsError::InvalidThreshold(_)
        | GsError::ZeroRightHandSide
        | GsError::NotInitialized => GSMINRES_ERR_INVALID,
        GsError::IndefiniteB { .. }
        | GsError::Breakdown { .. }
        | GsError::NotPositiveDefinite { .. } => GSMINRES_ERR_NUMERICAL,
        _ => GSMINRES_ERR_OTHER,
    }
}

/// # Safety
/// `ptr` must be null or valid for `len` reads.
unsafe fn as_slice<'a, T>(ptr: *const T, len: usize) -> Option<&'a [T]> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { std::slice::from_raw_parts(ptr, len) })
    }
}

/// # Safety
/// `ptr` must be null or valid for `len` reads and writes, with no other live reference.
unsafe fn as_slice_mut<'a, T>(ptr: *mut T, len: usize) -> Option<&'a mut [T]> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { std::slice::from_raw_parts_mut(ptr, len) })
    }
}

/// Length of the shift-major solution buffer, `None` on overflow.
fn solution_len(n: usize, m: usize) -> Option<usize> {
    n.checked_mul(m)
}

/// # Safety
/// `handle` must be null or a live handle from [`gsminres_create`].
unsafe fn solver_mut<'a>(handle: GsMinresHandle) -> Option<&'a mut GsMinresSolver> {
    unsafe { handle.as_mut() }
}

/// Create a solver for matrices of size `n` and `m` shifts. Returns null if either is 0.
#[unsafe(no_mangle)]
pub extern "C" fn gsminres_create(n: usize, m: usize) -> GsMinresHandle {
    match GsMinresSolver::new(n, m) {
        Ok(solver) => Box::into_raw(Box::new(solver)),
        Err(err) => {
            status_of(&err);
            ptr::null_mut()
        }
    }
}

/// Destroy a solver. Null is ignored.
///
/// # Safety
/// `handle` must be null or a handle from [`gsminres_create`] not yet destroyed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn gsminres_destroy(handle: GsMinresHandle) {
    if !handle.is_null() {
        drop(unsafe { Box::from_raw(handle) });
    }
}

/// Initialise the solver.
///
/// `x` (length `n·m`, shift-major) is zeroed, `w` holds `B⁻¹b` on entry and the
/// normalised first basis vector on return.
///
/// # Safety
/// Pointers must be valid for the stated lengths: `x` for `n·m`, `b` and `w` for `n`,
/// `sigma` for `m`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn gsminres_initialize(
    handle: GsMinresHandle,
    x: *mut C64,
    b: *const C64,
    w: *mut C64,
    sigma: *const C64,
    threshold: f64,
    n: usize,
    m: usize,
) -> c_int {
    let Some(len) = solution_len(n, m) else {
        return GSMINRES_ERR_DIMENSION;
    };
    let (Some(solver), Some(x), Some(b), Some(w), Some(sigma)) = (unsafe {
        (
            solver_mut(handle),
            as_slice_mut(x, len),
            as_slice(b, n),
            as_slice_mut(w, n),
            as_slice(sigma, m),
        )
    }) else {
        return GSMINRES_ERR_NULL;
    };
    match solver.initialize(x, b, w, sigma, threshold) {
        Ok(()) => GSMINRES_OK,
        Err(err) => status_of(&err),
    }
}

/// Pre-processing half of a Lanczos step; `u` holds `A·w` on entry.
///
/// # Safety
/// `u` must be valid for `n` reads and writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn gsminres_glanczos_pre(handle: GsMinresHandle, u: *mut C64, n: usize) -> c_int {
    let (Some(solver), Some(u)) = (unsafe { (solver_mut(handle), as_slice_mut(u, n)) }) else {
        return GSMINRES_ERR_NULL;
    };
    match solver.glanczos_pre(u) {
        Ok(()) => GSMINRES_OK,
        Err(err) => status_of(&err),
    }
}

/// Post-processing half of a Lanczos step; `w` holds `B⁻¹u` on entry.
///
/// # Safety
/// `w` and `u` must be distinct buffers valid for `n` reads and writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn gsminres_glanczos_pst(
    handle: GsMinresHandle,
    w: *mut C64,
    u: *mut C64,
    n: usize,
) -> c_int {
    let (Some(solver), Some(w), Some(u)) =
        (unsafe { (solver_mut(handle), as_slice_mut(w, n), as_slice_mut(u, n)) })
    else {
        return GSMINRES_ERR_NULL;
    };
    match solver.glanczos_pst(w, u) {
        Ok(LanczosStatus::Continue) => GSMINRES_OK,
        Ok(LanczosStatus::Breakdown) => GSMINRES_BREAKDOWN,
        Err(err) => status_of(&err),
    }
}

/// Update the solutions. Returns [`GSMINRES_CONVERGED`] when all shifts converged.
///
/// # Safety
/// `x` must be valid for `n·m` reads and writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn gsminres_update(handle: GsMinresHandle, x: *mut C64, n: usize, m: usize) -> c_int {
    let Some(len) = solution_len(n, m) else {
        return GSMINRES_ERR_DIMENSION;
    };
    let (Some(solver), Some(x)) = (unsafe { (solver_mut(handle), as_slice_mut(x, len)) }) else {
        return GSMINRES_ERR_NULL;
    };
    match solver.update(x) {
        Ok(true) => GSMINRES_CONVERGED,
        Ok(false) => GSMINRES_OK,
        Err(err) => status_of(&err),
    }
}

/// Write the convergence iteration (0 = not converged) and residual estimate per shift.
///
/// # Safety
/// `conv_itr` and `conv_res` must be valid for `m` writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn gsminres_finalize(
    handle: GsMinresHandle,
    conv_itr: *mut c_int,
    conv_res: *mut f64,
    m: usize,
) -> c_int {
    let (Some(solver), Some(conv_itr), Some(conv_res)) =
        (unsafe { (solver_mut(handle), as_slice_mut(conv_itr, m), as_slice_mut(conv_res, m)) })
    else {
        return GSMINRES_ERR_NULL;
    };
    if m != solver.shift_size() {
        return status_of(&GsError::DimensionMismatch {
            what: "finalize buffers",
            expected: solver.shift_size(),
            found: m,
        });
    }
    let report = solver.finalize();
    for (dst, &it) in conv_itr.iter_mut().zip(&report.conv_itr) {
        *dst = c_int::try_from(it).unwrap_or(c_int::MAX);
    }
    conv_res.copy_from_slice(&report.conv_res);
    GSMINRES_OK
}

/// Write the current residual estimates.
///
/// # Safety
/// `res` must be valid for `m` writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn gsminres_get_residual(handle: GsMinresHandle, res: *mut f64, m: usize) -> c_int {
    let (Some(solver), Some(res)) = (unsafe { (solver_mut(handle), as_slice_mut(res, m)) }) else {
        return GSMINRES_ERR_NULL;
    };
    match solver.get_residual(res) {
        Ok(()) => GSMINRES_OK,
        Err(err) => status_of(&err),
    }
}
