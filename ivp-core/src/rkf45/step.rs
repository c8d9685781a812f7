use super::coefficients::{a_row, B5, C, E};
use crate::{rhs::Rhs, stats::Counters, workspace::RkfWorkspace, Real};

// Writes the 5th-order (locally extrapolated) solution into ws.y_tmp and
// the per-component error estimate into ws.err. Acceptance is the step
// controller's job, not this function's.
pub fn rkf45_trial_step(
    sys: &dyn Rhs,
    p: &[Real],
    t: Real,
    y: &[Real],
    h: Real,
    ws: &mut RkfWorkspace,
    counters: &mut Counters,
) {
    let n = sys.n();
    debug_assert_eq!(n, ws.n());
    debug_assert_eq!(n, y.len());

    sys.eval(t, p, y, &mut ws.stage[0]);
    counters.record_rhs_eval();

    for i in 1..6 {
        let arow = a_row(i);
        for k in 0..n {
            let mut acc = y[k];
            for (j, &aij) in arow.iter().enumerate() {
                acc += h * aij * ws.stage[j][k];
            }
            ws.y_tmp[k] = acc;
        }
        sys.eval(t + C[i] * h, p, &ws.y_tmp, &mut ws.stage[i]);
        counters.record_rhs_eval();
    }

    for k in 0..n {
        let mut y5 = y[k];
        let mut e = 0.0;
        for i in 0..6 {
            y5 += h * B5[i] * ws.stage[i][k];
            e += E[i] * ws.stage[i][k];
        }
        ws.y_tmp[k] = y5;
        ws.err[k] = (h * e).abs();
    }
}
