pub mod coefficients;
pub mod controller;
pub mod step;

use tracing::{error, warn};

use crate::{
    error::ErrorCode, rhs::Rhs, stats::Counters, step_control, workspace::RkfWorkspace,
    SolverOptions,
};

#[derive(Debug, Clone, Copy)]
pub struct SolveOutcome {
    pub code: ErrorCode,
    pub counters: Counters,
}

// y is left untouched if a fatal condition is hit before any step is
// attempted. on_accept runs after every accepted step when opts.logging
// is set; pass a no-op closure otherwise.
pub fn solve(
    sys: &dyn Rhs,
    p: &[f64],
    t0: f64,
    t_end: f64,
    y: &mut [f64],
    opts: &SolverOptions,
    mut on_accept: impl FnMut(f64, &[f64]),
) -> SolveOutcome {
    let mut counters = Counters::default();
    let mut ws = RkfWorkspace::new(sys.n());

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
    loop {
        if opts.max_iters != 0 && counters.niters >= opts.max_iters {
            error!(niters = counters.niters, max_iters = opts.max_iters, "RKF45: step budget exhausted");
            return SolveOutcome {
                code: ErrorCode::TooMuchWork,
                counters,
            };
        }
        counters.record_attempt();
        step::rkf45_trial_step(sys, p, t, y, h, &mut ws, &mut counters);
        let outcome = controller::accept(&ws.err, y, h, opts.atol, opts.rtol, hmin, opts.adaption_limit);
        if !outcome.accept {
            warn!(herr = outcome.herr, h, next_h = outcome.next_h, "RKF45 step rejected");
        }

        if outcome.accept {
            t += h;
            y.copy_from_slice(&ws.y_tmp);
            counters.record_accepted();
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
            h = step_control::terminal_nudge(t, outcome.next_h, t_end, hmin, hmax);
        } else {
            h = outcome.next_h;
            if h.abs() < hmin {
                h = hmin * dir;
            }
        }

        if t + h == t {
            error!(t, h, "RKF45: stepsize underflowed relative to t");
            return SolveOutcome {
                code: ErrorCode::HPlusTEqualsH,
                counters,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Decay;
    impl Rhs for Decay {
        fn n(&self) -> usize {
            1
        }
        fn eval(&self, _t: f64, _p: &[f64], y: &[f64], dy: &mut [f64]) {
            dy[0] = -y[0];
        }
    }

    struct VanDerPol {
        mu: f64,
    }
    impl Rhs for VanDerPol {
        fn n(&self) -> usize {
            2
        }
        fn eval(&self, _t: f64, _p: &[f64], y: &[f64], dy: &mut [f64]) {
            dy[0] = y[1];
            dy[1] = self.mu * (1.0 - y[0] * y[0]) * y[1] - y[0];
        }
    }

    #[test]
    fn exponential_decay_matches_reference_within_tolerance() {
        let opts = SolverOptions::default();
        let mut y = [1.0];
        let outcome = solve(&Decay, &[], 0.0, 1.0, &mut y, &opts, |_, _| {});
        assert_eq!(outcome.code, ErrorCode::Success);
        assert!((y[0] - 0.3678794412_f64).abs() < 1e-6);
        assert!(outcome.counters.nsteps <= 20);
    }

    #[test]
    fn van_der_pol_matches_reference_to_five_times_rtol() {
        let opts = SolverOptions::new(1e-10, 1e-6).unwrap();
        let mut y = [2.0, 0.0];
        let outcome = solve(&VanDerPol { mu: 1.0 }, &[], 0.0, 20.0, &mut y, &opts, |_, _| {});
        assert_eq!(outcome.code, ErrorCode::Success);
        assert!((y[0] - 2.00861986087015_f64).abs() < 5e-6);
        assert!((y[1] - (-0.0659524608556108_f64)).abs() < 5e-6);
    }

    #[test]
    fn zero_length_interval_is_a_no_op() {
        let opts = SolverOptions::default();
        let mut y = [1.0, 2.0];
        let outcome = solve(&VanDerPol { mu: 1.0 }, &[], 1.0, 1.0, &mut y, &opts, |_, _| {});
        assert_eq!(outcome.code, ErrorCode::Success);
        assert_eq!(y, [1.0, 2.0]);
        assert_eq!(outcome.counters.nsteps, 0);
        assert_eq!(outcome.counters.niters, 0);
    }

    #[test]
    fn tiny_interval_reports_tdist_too_small_without_mutating_y() {
        let opts = SolverOptions::default();
        let mut y = [1.0];
        let t_end = 1.0 + f64::EPSILON;
        let before = y;
        let outcome = solve(&Decay, &[], 1.0, t_end, &mut y, &opts, |_, _| {});
        assert_eq!(outcome.code, ErrorCode::TdistTooSmall);
        assert_eq!(y, before);
    }

    #[test]
    fn niters_is_never_less_than_nsteps() {
        let opts = SolverOptions::default();
        let mut y = [2.0, 0.0];
        let outcome = solve(&VanDerPol { mu: 1.0 }, &[], 0.0, 20.0, &mut y, &opts, |_, _| {});
        assert!(outcome.counters.niters >= outcome.counters.nsteps);
    }

    #[test]
    fn splitting_the_interval_matches_one_shot_solve() {
        let opts = SolverOptions::new(1e-10, 1e-6).unwrap();
        let mut y_direct = [2.0, 0.0];
        solve(&VanDerPol { mu: 1.0 }, &[], 0.0, 20.0, &mut y_direct, &opts, |_, _| {});

        let mut y_split = [2.0, 0.0];
        solve(&VanDerPol { mu: 1.0 }, &[], 0.0, 10.0, &mut y_split, &opts, |_, _| {});
        solve(&VanDerPol { mu: 1.0 }, &[], 10.0, 20.0, &mut y_split, &opts, |_, _| {});

        assert!((y_direct[0] - y_split[0]).abs() < 1e-5);
        assert!((y_direct[1] - y_split[1]).abs() < 1e-5);
    }
}
