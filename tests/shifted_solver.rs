//! End-to-end tests for the generalized shifted MINRES solver.
//!
//! The first group drives the five-call protocol by hand on diagonal problems with
//! B = I, where the exact solution `b_i / (A_ii + σ)` is known. The second group runs
//! generalized problems (B ≠ I) through `ShiftedSolveContext` with a packed Cholesky
//! and an inner CG B-solve, and checks true residuals.

use approx::assert_abs_diff_eq;
use faer::Mat;
use gsminres::context::shifted_residual_norms;
use gsminres::{
    CgBSolve, GsMinresSolver, HermitianPacked, IdentityB, MatVec, PackedCholesky,
    ShiftedSolveContext, SolverOptions,
};
use num_complex::Complex64 as C64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn c(re: f64, im: f64) -> C64 {
    C64::new(re, im)
}

/// Protocol driver over a diagonal A with B = I, calling `observe` after every update.
fn drive_diagonal<F>(
    diag: &[f64],
    b: &[C64],
    sigma: &[C64],
    threshold: f64,
    max_iters: usize,
    mut observe: F,
) -> (GsMinresSolver, Vec<C64>)
where
    F: FnMut(&GsMinresSolver, &[C64]),
{
    let n = diag.len();
    let mut solver = GsMinresSolver::new(n, sigma.len()).unwrap();
    let mut x = vec![c(0.0, 0.0); n * sigma.len()];
    let mut w = b.to_vec();
    let mut u = vec![c(0.0, 0.0); n];
    solver.initialize(&mut x, b, &mut w, sigma, threshold).unwrap();
    for _ in 0..max_iters {
        for i in 0..n {
            u[i] = w[i] * diag[i];
        }
        solver.glanczos_pre(&mut u).unwrap();
        w.copy_from_slice(&u);
        solver.glanczos_pst(&mut w, &mut u).unwrap();
        let done = solver.update(&mut x).unwrap();
        observe(&solver, &x);
        if done {
            break;
        }
    }
    (solver, x)
}

fn assert_diagonal_solution(diag: &[f64], b: &[C64], sigma: &[C64], x: &[C64], tol: f64) {
    let n = diag.len();
    for (m, s) in sigma.iter().enumerate() {
        for i in 0..n {
            let expected = b[i] / (s + diag[i]);
            let got = x[m * n + i];
            assert!(
                (got - expected).norm() <= tol * expected.norm().max(1.0),
                "shift {m}, x[{i}] = {got}, expected {expected}"
            );
        }
    }
}

#[test]
fn single_shift_terminates_within_matrix_dimension() {
    let diag = [1.0, 2.0, 3.0, 4.0];
    let b = vec![c(1.0, 0.0); 4];
    let sigma = [c(0.0, 0.0)];
    let (solver, x) = drive_diagonal(&diag, &b, &sigma, 1e-10, 4, |_, _| {});
    let report = solver.finalize();
    assert!(report.all_converged(), "not converged in 4 iterations: {report:?}");
    assert!(report.conv_itr[0] <= 4);
    let expected = [1.0, 0.5, 1.0 / 3.0, 0.25];
    for i in 0..4 {
        assert_abs_diff_eq!(x[i].re, expected[i], epsilon = 1e-10);
        assert_abs_diff_eq!(x[i].im, 0.0, epsilon = 1e-10);
    }
}

#[test]
fn multiple_shifts_match_direct_solution() {
    let diag = [1.0, 2.0, 3.0, 4.0];
    let b = vec![c(1.0, 0.0); 4];
    let sigma = [c(0.0, 0.0), c(1.0, 0.0), c(-0.5, 0.0)];
    let (solver, x) = drive_diagonal(&diag, &b, &sigma, 1e-10, 10, |_, _| {});
    assert!(solver.finalize().all_converged());
    assert_diagonal_solution(&diag, &b, &sigma, &x, 1e-9);
}

#[test]
fn complex_shifts_on_complex_right_hand_side() {
    let diag: Vec<f64> = (0..12).map(|i| -3.0 + 0.5 * i as f64).collect();
    let b: Vec<C64> = (0..12).map(|i| c(1.0 + i as f64, 0.5 - 0.1 * i as f64)).collect();
    let sigma = [c(0.0, 1.0), c(0.25, -0.5), c(4.0, 0.1)];
    let (solver, x) = drive_diagonal(&diag, &b, &sigma, 1e-11, 100, |_, _| {});
    assert!(solver.finalize().all_converged());
    assert_diagonal_solution(&diag, &b, &sigma, &x, 1e-8);
}

#[test]
fn shifts_deflate_independently() {
    let n = 40;
    let diag: Vec<f64> = (1..=n).map(|i| i as f64).collect();
    let b = vec![c(1.0, 0.0); n];
    let sigma = [c(0.0, 0.0), c(10.0, 0.0), c(100.0, 0.0)];
    let threshold = 1e-8;

    let mut frozen: Vec<Option<(Vec<C64>, f64)>> = vec![None; sigma.len()];
    let mut last_iter = 1;
    let (solver, x) = drive_diagonal(&diag, &b, &sigma, threshold, 400, |s, x| {
        // `iteration()` advances by exactly one per update.
        assert_eq!(s.iteration(), last_iter + 1);
        last_iter = s.iteration();
        let done = last_iter - 1;

        let report = s.finalize();
        assert_eq!(s.converged_count(), report.converged_count());
        let r0 = s.r0_norm();
        for m in 0..sigma.len() {
            let rel = report.conv_res[m] / r0;
            let xm = x[m * n..(m + 1) * n].to_vec();
            match report.conv_itr[m] {
                0 => assert!(rel >= threshold, "shift {m} active with rel {rel:e}"),
                it if it == done => {
                    assert!(rel < threshold);
                    frozen[m] = Some((xm, report.conv_res[m]));
                }
                _ => {
                    // Converged earlier: solution and estimate are bit-identical.
                    let (x_then, h_then) = frozen[m].as_ref().unwrap();
                    assert_eq!(&xm, x_then, "shift {m} solution moved after convergence");
                    assert_eq!(report.conv_res[m].to_bits(), h_then.to_bits());
                }
            }
        }
    });

    let itr = solver.finalize().conv_itr;
    assert!(itr.iter().all(|&it| it > 0), "{itr:?}");
    assert!(itr[2] < itr[1] && itr[1] < itr[0], "expected distinct deflation order, got {itr:?}");
    assert_diagonal_solution(&diag, &b, &sigma, &x, 1e-6);
}

/// Random Hermitian A and HPD B (as dense faer / packed storage), seeded.
fn generalized_problem(n: usize, seed: u64) -> (Mat<C64>, HermitianPacked, Vec<C64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let rand_c = |rng: &mut StdRng| c(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));

    let mut a_data = vec![vec![c(0.0, 0.0); n]; n];
    for j in 0..n {
        for i in 0..=j {
            let v = if i == j { c(rng.gen_range(-2.0..2.0), 0.0) } else { rand_c(&mut rng) };
            a_data[i][j] = v;
            a_data[j][i] = v.conj();
        }
    }
    let a = Mat::from_fn(n, n, |i, j| a_data[i][j]);

    let m: Vec<Vec<C64>> = (0..n).map(|_| (0..n).map(|_| rand_c(&mut rng)).collect()).collect();
    // B = Mᴴ M + n I
    let b_mat = HermitianPacked::from_fn(n, |i, j| {
        let mut v: C64 = (0..n).map(|k| m[k][i].conj() * m[k][j]).sum();
        if i == j {
            v += n as f64;
        }
        v
    });
    let rhs: Vec<C64> = (0..n).map(|_| rand_c(&mut rng)).collect();
    (a, b_mat, rhs)
}

fn vec_norm(v: &[C64]) -> f64 {
    v.iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt()
}

#[test]
fn generalized_problem_with_packed_cholesky() {
    let n = 24;
    let (a, b_mat, rhs) = generalized_problem(n, 7);
    let sigma = [c(0.0, 0.5), c(1.0, 1.0), c(-2.0, 0.25)];
    let chol = PackedCholesky::new(&b_mat).unwrap();
    let options = SolverOptions::default().with_threshold(1e-10).with_max_iters(500);
    let mut ctx = ShiftedSolveContext::new(a, chol, options);
    let mut x = vec![c(0.0, 0.0); n * sigma.len()];
    let stats = ctx.solve(&rhs, &sigma, &mut x).unwrap();
    assert!(stats.converged, "{stats:?}");
    assert!(!stats.breakdown);
    assert_eq!(stats.report.converged_count(), sigma.len());

    let res = shifted_residual_norms(&ctx.a, &b_mat, &rhs, &sigma, &x);
    let b_norm = vec_norm(&rhs);
    for (m, r) in res.iter().enumerate() {
        assert!(r / b_norm < 1e-7, "shift {m}: true relative residual {:e}", r / b_norm);
    }
}

#[test]
fn generalized_problem_with_inner_cg() {
    let n = 16;
    let (a, b_mat, rhs) = generalized_problem(n, 11);
    let sigma = [c(0.5, 0.5), c(-1.0, 2.0)];
    let mut options = SolverOptions::default().with_threshold(1e-9).with_max_iters(500);
    options.cg_tol = 1e-13;
    options.cg_max_iters = 1000;
    let b_solver = CgBSolve::with_options(b_mat.clone(), &options);
    let mut ctx = ShiftedSolveContext::new(a, b_solver, options);
    let mut x = vec![c(0.0, 0.0); n * sigma.len()];
    let stats = ctx.solve(&rhs, &sigma, &mut x).unwrap();
    assert!(stats.converged, "{stats:?}");

    let res = shifted_residual_norms(&ctx.a, &b_mat, &rhs, &sigma, &x);
    let b_norm = vec_norm(&rhs);
    for r in res {
        assert!(r / b_norm < 1e-6, "true relative residual {:e}", r / b_norm);
    }
}

#[test]
fn iteration_budget_is_not_an_error() {
    let diag: Vec<f64> = (1..=30).map(|i| i as f64).collect();
    let a = HermitianPacked::from_fn(30, |i, j| if i == j { c(diag[i], 0.0) } else { c(0.0, 0.0) });
    let rhs = vec![c(1.0, 0.0); 30];
    let sigma = [c(0.0, 0.0), c(1000.0, 0.0)];
    let options = SolverOptions::default().with_threshold(1e-12).with_max_iters(5);
    let mut ctx = ShiftedSolveContext::new(a, IdentityB, options);
    let mut x = vec![c(0.0, 0.0); 60];
    let stats = ctx.solve(&rhs, &sigma, &mut x).unwrap();
    assert_eq!(stats.iterations, 5);
    assert!(!stats.converged);
    // The badly conditioned shift cannot converge in 5 steps.
    assert_eq!(stats.report.conv_itr[0], 0);
    assert!(stats.report.conv_res[0] > 0.0);
}

#[test]
fn dense_faer_operator_matches_packed_operator() {
    let n = 6;
    let (a, _, rhs) = generalized_problem(n, 3);
    let packed = HermitianPacked::from_fn(n, |i, j| a[(i, j)]);
    let mut y_dense = vec![c(0.0, 0.0); n];
    let mut y_packed = vec![c(0.0, 0.0); n];
    a.matvec(&rhs, &mut y_dense);
    packed.matvec(&rhs, &mut y_packed);
    for (d, p) in y_dense.iter().zip(&y_packed) {
        assert!((d - p).norm() < 1e-12);
    }
}

#[test]
fn driver_rejects_operator_of_wrong_size() {
    let a = HermitianPacked::identity(3);
    let rhs = vec![c(1.0, 0.0); 4];
    let mut x = vec![c(0.0, 0.0); 4];
    let options = SolverOptions::default().with_report_interval(1);
    let mut ctx = ShiftedSolveContext::new(a, IdentityB, options);
    assert!(matches!(
        ctx.solve(&rhs, &[c(0.0, 1.0)], &mut x),
        Err(gsminres::GsError::DimensionMismatch { expected: 4, found: 3, .. })
    ));
}

#[test]
fn driver_stops_on_breakdown_before_convergence() {
    // A = B = I: one Lanczos step spans the Krylov space. σ = -1 makes A + σB singular,
    // so that shift can never converge.
    let a = HermitianPacked::identity(2);
    let rhs = vec![c(1.0, 0.0), c(0.0, 1.0)];
    let sigma = [c(-1.0, 0.0), c(1.0, 0.0)];
    let mut x = vec![c(0.0, 0.0); 4];
    let options = SolverOptions::default().with_threshold(1e-10).with_max_iters(50);
    let mut ctx = ShiftedSolveContext::new(a, IdentityB, options);
    let stats = ctx.solve(&rhs, &sigma, &mut x).unwrap();
    assert_eq!(stats.iterations, 1);
    assert!(stats.breakdown);
    assert!(!stats.converged);
    assert_eq!(stats.report.conv_itr, vec![0, 1]);
    for i in 0..2 {
        assert!((x[2 + i] - rhs[i] / 2.0).norm() < 1e-14);
    }
}

#[test]
fn breakdown_tolerance_comes_from_options() {
    // Two nearly equal eigenvalues: beta after the first step is about 5e-7.
    let a = HermitianPacked::from_fn(2, |i, j| match (i, j) {
        (0, 0) => c(1.0, 0.0),
        (1, 1) => c(1.0 + 1e-6, 0.0),
        _ => c(0.0, 0.0),
    });
    let rhs = vec![c(1.0, 0.0); 2];
    let sigma = [c(0.0, 0.0)];

    let options = SolverOptions::default().with_threshold(1e-10).with_max_iters(10);
    let mut ctx = ShiftedSolveContext::new(a.clone(), IdentityB, options);
    let mut x = vec![c(0.0, 0.0); 2];
    let stats = ctx.solve(&rhs, &sigma, &mut x).unwrap();
    assert!(stats.converged, "{stats:?}");
    assert_eq!(stats.iterations, 2);

    // A coarse tolerance declares the subspace invariant after one step.
    let coarse = options.with_breakdown_tol(1e-3);
    let mut ctx = ShiftedSolveContext::new(a, IdentityB, coarse);
    let stats = ctx.solve(&rhs, &sigma, &mut x).unwrap();
    assert_eq!(stats.iterations, 1);
    assert!(stats.breakdown);
    assert!(!stats.converged);
    assert_eq!(stats.report.conv_itr, vec![0]);
}
