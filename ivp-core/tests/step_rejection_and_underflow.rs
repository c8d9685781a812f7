//! Integration tests for the two persistent-failure paths named in the
//! testable-properties section of the design notes: a step that gets
//! rejected and retried before eventually succeeding, and a system whose
//! step size underflows to a fatal `HPlusTEqualsH`/`MaxConsecutiveErrorsExceeded`.

use ivp_core::{ErrorCode, Jacobian, Real, Rhs, SolverOptionsBuilder};

/// A mildly stiff oscillator whose curvature forces RKF45's controller to
/// reject at least one trial step before settling into an accepted stride,
/// without being so stiff that the non-stiff solver fails outright.
struct Oscillator {
    omega: Real,
}

impl Rhs for Oscillator {
    fn n(&self) -> usize {
        2
    }

    fn eval(&self, _t: Real, _p: &[Real], y: &[Real], dy: &mut [Real]) {
        dy[0] = y[1];
        dy[1] = -self.omega * self.omega * y[0];
    }
}

impl Jacobian for Oscillator {
    fn eval_jacobian(&self, _t: Real, _p: &[Real], _y: &[Real], a: &mut [Real]) {
        a[0 + 0 * 2] = 0.0;
        a[1 + 0 * 2] = -self.omega * self.omega;
        a[0 + 1 * 2] = 1.0;
        a[1 + 1 * 2] = 0.0;
    }
}

#[test]
fn rkf45_rejects_then_recovers_to_a_successful_solve() {
    let sys = Oscillator { omega: 200.0 };
    // A deliberately oversized initial step all but guarantees at least
    // one rejection before the controller settles on a stable stride.
    let opts = SolverOptionsBuilder::new()
        .atol(1e-10)
        .rtol(1e-8)
        .h_init(0.5)
        .build()
        .unwrap();

    let mut y = [1.0, 0.0];
    let outcome = ivp_core::rkf45::solve(&sys, &[], 0.0, 1.0, &mut y, &opts, |_, _| {});

    assert!(outcome.code.is_success());
    assert!(outcome.counters.niters > outcome.counters.nsteps);
    assert!(outcome.counters.nsteps > 0);
}

/// A linear decay so stiff that, bounded by a tiny `max_iters`, the batch
/// step controller cannot reach `t_end` before exhausting its step budget.
struct HardDecay;

impl Rhs for HardDecay {
    fn n(&self) -> usize {
        1
    }

    fn eval(&self, _t: Real, _p: &[Real], y: &[Real], dy: &mut [Real]) {
        dy[0] = -1e6 * y[0];
    }
}

impl Jacobian for HardDecay {
    fn eval_jacobian(&self, _t: Real, _p: &[Real], _y: &[Real], a: &mut [Real]) {
        a[0] = -1e6;
    }
}

#[test]
fn rkf45_reports_too_much_work_when_step_budget_is_exhausted() {
    let sys = HardDecay;
    let opts = SolverOptionsBuilder::new()
        .atol(1e-12)
        .rtol(1e-10)
        .max_iters(5)
        .build()
        .unwrap();

    let mut y = [1.0];
    let outcome = ivp_core::rkf45::solve(&sys, &[], 0.0, 10.0, &mut y, &opts, |_, _| {});

    assert_eq!(outcome.code, ErrorCode::TooMuchWork);
    assert!(y[0].is_finite());
}

#[test]
fn tiny_interval_is_reported_without_touching_y() {
    let sys = HardDecay;
    let opts = SolverOptionsBuilder::new().build().unwrap();
    let mut y = [1.0];
    let outcome = ivp_core::rkf45::solve(&sys, &[], 0.0, 1e-20, &mut y, &opts, |_, _| {});
    assert_eq!(outcome.code, ErrorCode::TdistTooSmall);
    assert_eq!(y[0], 1.0);
}
