use nalgebra::Complex;

use super::coefficients::{A, C, MAX_NEWTON_ITERS, NEWTON_TOL, RK_E, T, TI};
use crate::{
    linalg::{ComplexFactorization, ComplexVector, RealFactorization, RealVector},
    norm::wrms,
    rhs::Jacobian,
    stats::Counters,
    workspace::RadauWorkspace,
    Real,
};

#[derive(Debug, Clone, Copy)]
pub enum NewtonOutcome {
    Converged {
        iters: usize,
        theta_last: Real,
        rate: Real,
    },
    Diverged { fac: Real },
    MaxIterExceeded,
}

// Updates ws.z in place. e1/e2 are the current step's cached
// decompositions; rate_prev warm-starts the convergence-rate predictor
// via max(prev_rate, eps)^0.8.
pub fn newton_iterate(
    sys: &dyn Jacobian,
    p: &[Real],
    t: Real,
    y: &[Real],
    h: Real,
    ws: &mut RadauWorkspace,
    e1: &RealFactorization,
    e2: &ComplexFactorization,
    atol: Real,
    rtol: Real,
    rate_prev: Real,
    counters: &mut Counters,
) -> NewtonOutcome {
    let n = sys.n();
    let mut rate = rate_prev.max(Real::EPSILON).powf(0.8);
    let mut theta_last: Real = 0.0;
    let mut eta_prev: Real = 1.0;

    for iter in 0..MAX_NEWTON_ITERS {
        for j in 0..3 {
            for k in 0..n {
                ws.stage_y[k] = y[k] + ws.z[j][k];
            }
            sys.eval(t + C[j] * h, p, &ws.stage_y, &mut ws.stage_f[j]);
            counters.record_rhs_eval();
        }

        let mut w1 = RealVector::zeros(n);
        let mut w23 = ComplexVector::zeros(n);
        for k in 0..n {
            let r0 = (ws.z[0][k] - h * (A[0][0] * ws.stage_f[0][k] + A[0][1] * ws.stage_f[1][k] + A[0][2] * ws.stage_f[2][k])) / h;
            let r1 = (ws.z[1][k] - h * (A[1][0] * ws.stage_f[0][k] + A[1][1] * ws.stage_f[1][k] + A[1][2] * ws.stage_f[2][k])) / h;
            let r2 = (ws.z[2][k] - h * (A[2][0] * ws.stage_f[0][k] + A[2][1] * ws.stage_f[1][k] + A[2][2] * ws.stage_f[2][k])) / h;
            w1[k] = TI[0][0] * r0 + TI[0][1] * r1 + TI[0][2] * r2;
            w23[k] = Complex::new(
                TI[1][0] * r0 + TI[1][1] * r1 + TI[1][2] * r2,
                TI[2][0] * r0 + TI[2][1] * r1 + TI[2][2] * r2,
            );
        }

        e1.solve_in_place(&mut w1)
            .expect("E1 is factored before Newton iteration begins");
        e2.solve_in_place(&mut w23)
            .expect("E2 is factored before Newton iteration begins");

        for k in 0..n {
            let x1 = w1[k];
            let x2 = w23[k].re;
            let x3 = w23[k].im;
            ws.dz[0][k] = T[0][0] * x1 + T[0][1] * x2 + T[0][2] * x3;
            ws.dz[1][k] = T[1][0] * x1 + T[1][1] * x2 + T[1][2] * x3;
            ws.dz[2][k] = T[2][0] * x1 + T[2][1] * x2 + T[2][2] * x3;
            ws.z[0][k] -= ws.dz[0][k];
            ws.z[1][k] -= ws.dz[1][k];
            ws.z[2][k] -= ws.dz[2][k];
        }

        let e0 = wrms(&ws.dz[0], y, atol, rtol);
        let e1n = wrms(&ws.dz[1], y, atol, rtol);
        let e2n = wrms(&ws.dz[2], y, atol, rtol);
        let eta = ((e0 * e0 + e1n * e1n + e2n * e2n) / 3.0).sqrt();

        if iter >= 1 {
            theta_last = eta / eta_prev.max(Real::MIN_POSITIVE);
            if theta_last >= 0.99 {
                return NewtonOutcome::Diverged { fac: 0.2 };
            }
            rate = theta_last / (1.0 - theta_last).max(Real::MIN_POSITIVE);

            let remaining = (MAX_NEWTON_ITERS - iter - 1) as i32;
            let predicted = eta * theta_last.powi(remaining) / (1.0 - theta_last).max(Real::MIN_POSITIVE);
            if predicted >= NEWTON_TOL {
                let fac = 0.8 * rate.max(Real::MIN_POSITIVE).powf(-1.0 / (MAX_NEWTON_ITERS - iter) as Real);
                return NewtonOutcome::Diverged { fac };
            }
        }
        eta_prev = eta;

        if rate * eta <= NEWTON_TOL {
            return NewtonOutcome::Converged {
                iters: iter + 1,
                theta_last,
                rate,
            };
        }
    }

    NewtonOutcome::MaxIterExceeded
}

// Non-SDIRK error estimate, with a one-correction retry on err >= 1 for
// a first step or after a rejection.
pub fn estimate_error(
    sys: &dyn Jacobian,
    p: &[Real],
    t: Real,
    y: &[Real],
    h: Real,
    ws: &RadauWorkspace,
    e1: &RealFactorization,
    atol: Real,
    rtol: Real,
    retry_on_failure: bool,
    counters: &mut Counters,
) -> Real {
    let n = sys.n();
    let mut tmp = RealVector::zeros(n);
    for k in 0..n {
        tmp[k] = RK_E[0] * ws.f0[k]
            + (RK_E[1] * ws.z[0][k] + RK_E[2] * ws.z[1][k] + RK_E[3] * ws.z[2][k]) / h;
    }
    e1.solve_in_place(&mut tmp)
        .expect("E1 is factored before the error estimate is formed");
    let mut err = wrms(tmp.as_slice(), y, atol, rtol);

    if err >= 1.0 && retry_on_failure {
        let mut y_corr = vec![0.0; n];
        for k in 0..n {
            y_corr[k] = y[k] + tmp[k];
        }
        let mut f_corr = vec![0.0; n];
        sys.eval(t, p, &y_corr, &mut f_corr);
        counters.record_rhs_eval();
        for k in 0..n {
            tmp[k] += f_corr[k];
        }
        e1.solve_in_place(&mut tmp)
            .expect("E1 is factored before the error estimate retry");
        err = wrms(tmp.as_slice(), y, atol, rtol);
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::{ComplexMatrix, RealMatrix};
    use crate::radau::coefficients::{ALPHA, BETA, GAMMA};

    struct Decay;
    impl crate::rhs::Rhs for Decay {
        fn n(&self) -> usize {
            1
        }
        fn eval(&self, _t: Real, _p: &[Real], y: &[Real], dy: &mut [Real]) {
            dy[0] = -y[0];
        }
    }
    impl Jacobian for Decay {
        fn eval_jacobian(&self, _t: Real, _p: &[Real], _y: &[Real], a: &mut [Real]) {
            a[0] = -1.0;
        }
    }

    fn decompose(h: Real) -> (RealFactorization, ComplexFactorization) {
        let jac = RealMatrix::from_row_slice(1, 1, &[-1.0]);
        let e1 = RealMatrix::from_row_slice(1, 1, &[GAMMA / h]) - &jac;
        let e2 = ComplexMatrix::from_row_slice(1, 1, &[Complex::new(ALPHA / h, BETA / h)])
            - jac.map(|v| Complex::new(v, 0.0));
        (
            RealFactorization::factor(&e1).unwrap(),
            ComplexFactorization::factor(&e2).unwrap(),
        )
    }

    #[test]
    fn newton_converges_on_linear_decay() {
        let h = 0.05;
        let (e1, e2) = decompose(h);
        let mut ws = RadauWorkspace::new(1);
        ws.clear_z();
        let mut counters = Counters::default();
        let outcome = newton_iterate(
            &Decay, &[], 0.0, &[1.0], h, &mut ws, &e1, &e2, 1e-10, 1e-6, 1.0, &mut counters,
        );
        assert!(matches!(outcome, NewtonOutcome::Converged { .. }));
    }

    #[test]
    fn error_estimate_is_small_for_a_well_resolved_step() {
        let h = 0.01;
        let (e1, e2) = decompose(h);
        let mut ws = RadauWorkspace::new(1);
        ws.clear_z();
        let mut counters = Counters::default();
        newton_iterate(&Decay, &[], 0.0, &[1.0], h, &mut ws, &e1, &e2, 1e-10, 1e-6, 1.0, &mut counters);
        ws.f0[0] = -1.0;
        let err = estimate_error(&Decay, &[], 0.0, &[1.0], h, &ws, &e1, 1e-10, 1e-6, false, &mut counters);
        assert!(err < 1.0);
    }
}
