pub mod coefficients;
pub mod controller;
pub mod interpolant;
pub mod step;

use nalgebra::Complex;
use tracing::{debug, error, warn};

use crate::{
    error::ErrorCode,
    linalg::{ComplexFactorization, ComplexMatrix, RealFactorization, RealMatrix},
    rhs::Jacobian,
    stats::Counters,
    step_control,
    workspace::RadauWorkspace,
    SolverOptions,
};
use coefficients::{ALPHA, BETA, GAMMA};
use step::NewtonOutcome;

#[derive(Debug, Clone, Copy)]
pub struct SolveOutcome {
    pub code: ErrorCode,
    pub counters: Counters,
}

fn build_e1(a: &RealMatrix, gamma_over_h: f64) -> RealMatrix {
    let n = a.nrows();
    RealMatrix::identity(n, n) * gamma_over_h - a
}

fn build_e2(a: &RealMatrix, re: f64, im: f64) -> ComplexMatrix {
    let n = a.nrows();
    let diag = ComplexMatrix::identity(n, n) * Complex::new(re, im);
    let ac = a.map(|v| Complex::new(v, 0.0));
    diag - ac
}

// sys must supply an analytical Jacobian, unlike crate::rkf45::solve.
pub fn solve(
    sys: &dyn Jacobian,
    p: &[f64],
    t0: f64,
    t_end: f64,
    y: &mut [f64],
    opts: &SolverOptions,
    mut on_accept: impl FnMut(f64, &[f64]),
) -> SolveOutcome {
    let mut counters = Counters::default();
    let n = sys.n();
    let mut ws = RadauWorkspace::new(n);

    let roundoff = step_control::roundoff(t0, t_end);
    if (t_end - t0).abs() < 2.0 * roundoff {
        return SolveOutcome {
            code: ErrorCode::TdistTooSmall,
            counters,
        };
    }
    if t0 == t_end {
        return SolveOutcome {
            code: ErrorCode::Success,
            counters,
        };
    }

    let hmin = step_control::h_min(t0, t_end);
    let mut hmax = step_control::h_max(t0, t_end, opts.min_iters);
    if hmin >= hmax {
        return SolveOutcome {
            code: ErrorCode::TdistTooSmall,
            counters,
        };
    }

    let dir = step_control::direction(t0, t_end);
    let mut h = if opts.h_init.abs() > hmin {
        dir * opts.h_init.abs()
    } else {
        match step_control::initial_step(sys, p, t0, y, t0, t_end, opts.atol, opts.rtol, opts.min_iters) {
            Ok(h) => h,
            Err(code) => return SolveOutcome { code, counters },
        }
    };

    let mut t = t0;
    let mut h_old = h;
    let mut first_step = true;
    let mut rejected_last = false;
    let mut rate_prev = 1.0_f64;
    let mut theta_last = 0.0_f64;

    let mut jac_stale = true;
    let mut lu_stale = true;
    let mut e1: Option<RealFactorization> = None;
    let mut e2: Option<ComplexFactorization> = None;
    let mut consecutive_lu_failures = 0u32;
    let mut gustafsson = controller::Gustafsson::new();

    loop {
        if opts.max_iters != 0 && counters.niters >= opts.max_iters {
            error!(niters = counters.niters, max_iters = opts.max_iters, "Radau: step budget exhausted");
            return SolveOutcome {
                code: ErrorCode::TooMuchWork,
                counters,
            };
        }
        counters.record_attempt();

        if jac_stale {
            sys.eval_jacobian(t, p, y, ws.a.as_mut_slice());
            counters.record_jac_eval();
            jac_stale = false;
            lu_stale = true;
        }

        if lu_stale {
            let e1_mat = build_e1(&ws.a, GAMMA / h);
            let e2_mat = build_e2(&ws.a, ALPHA / h, BETA / h);
            match (RealFactorization::factor(&e1_mat), ComplexFactorization::factor(&e2_mat)) {
                (Ok(f1), Ok(f2)) => {
                    e1 = Some(f1);
                    e2 = Some(f2);
                    lu_stale = false;
                    consecutive_lu_failures = 0;
                    counters.record_lu_decomp();
                }
                _ => {
                    consecutive_lu_failures += 1;
                    warn!(consecutive_lu_failures, h, "Radau LU decomposition failed, halving H");
                    if consecutive_lu_failures >= controller::MAX_CONSECUTIVE_LU_FAILURES {
                        error!(t, "Radau: 5 consecutive LU failures, marking IVP FAILED");
                        y[0] = f64::NAN;
                        return SolveOutcome {
                            code: ErrorCode::MaxConsecutiveErrorsExceeded,
                            counters,
                        };
                    }
                    h /= 2.0;
                    jac_stale = false;
                    continue;
                }
            }
        }

        if first_step {
            ws.clear_z();
        } else {
            interpolant::warm_start(&ws.cont, h, h_old, &mut ws.z);
        }
        sys.eval(t, p, y, &mut ws.f0);
        counters.record_rhs_eval();

        let e1_ref = e1.as_ref().expect("E1 factored above");
        let e2_ref = e2.as_ref().expect("E2 factored above");

        match step::newton_iterate(sys, p, t, y, h, &mut ws, e1_ref, e2_ref, opts.atol, opts.rtol, rate_prev, &mut counters) {
            NewtonOutcome::Converged { iters, theta_last: th, rate } => {
                let err = step::estimate_error(
                    sys, p, t, y, h, &ws, e1_ref, opts.atol, opts.rtol, first_step || rejected_last, &mut counters,
                );
                theta_last = th;
                rate_prev = rate;

                if err < 1.0 {
                    for k in 0..n {
                        y[k] += ws.z[2][k];
                    }
                    t += h;
                    counters.record_accepted();
                    interpolant::build_cont(&mut ws.cont, &ws.z);

                    let fac = gustafsson.correct(controller::base_fac(err, iters), h, err);
                    let h_new = h * fac;
                    jac_stale = !controller::skip_jacobian(iters, rate);
                    lu_stale = !controller::skip_lu(theta_last, h_new, h);
                    debug!(jac_stale, lu_stale, iters, rate, theta_last, "Radau reuse decision after accepted step");

                    h_old = h;
                    first_step = false;
                    rejected_last = false;

                    if opts.logging {
                        on_accept(t, y);
                    }
                    if (t_end - t).abs() <= roundoff {
                        return SolveOutcome {
                            code: ErrorCode::Success,
                            counters,
                        };
                    }
                    hmax = step_control::h_max(t, t_end, opts.min_iters);
                    if hmin >= hmax {
                        return SolveOutcome {
                            code: ErrorCode::TdistTooSmall,
                            counters,
                        };
                    }
                    h = step_control::terminal_nudge(t, h_new, t_end, hmin, hmax);
                } else {
                    rejected_last = true;
                    let fac = controller::base_fac(err, iters).min(1.0);
                    warn!(err, h, fac, "Radau step rejected: error estimate >= 1");
                    h *= fac;
                    if h.abs() < hmin {
                        h = hmin * dir;
                    }
                    lu_stale = true;
                }
            }
            NewtonOutcome::Diverged { fac } => {
                rejected_last = true;
                warn!(h, fac, "Radau Newton iteration diverged, shrinking H");
                h *= fac;
                if h.abs() < hmin {
                    h = hmin * dir;
                }
                jac_stale = false;
                lu_stale = true;
            }
            NewtonOutcome::MaxIterExceeded => {
                if h.abs() <= hmin {
                    error!(t, h, "Radau Newton failed to converge at h_min");
                    return SolveOutcome {
                        code: ErrorCode::MaxNewtonIterExceeded,
                        counters,
                    };
                }
                rejected_last = true;
                warn!(h, "Radau Newton hit MAX_NEWTON_ITERS without converging, shrinking H");
                h *= controller::FAC_MIN;
                if h.abs() < hmin {
                    h = hmin * dir;
                }
                jac_stale = false;
                lu_stale = true;
            }
        }

        if t + h == t {
            error!(t, h, "Radau: stepsize underflowed relative to t");
            return SolveOutcome {
                code: ErrorCode::HPlusTEqualsH,
                counters,
            };
        }
    }
}
