use crate::{error::ErrorCode, norm::wrms, rhs::Rhs, Real};

#[inline]
pub fn roundoff(t_start: Real, t_end: Real) -> Real {
    Real::EPSILON * (t_end - t_start).abs()
}

#[inline]
pub fn h_min(t_start: Real, t_end: Real) -> Real {
    100.0 * roundoff(t_start, t_end)
}

// Recomputed at the current t, not frozen at t_start, so it shrinks as
// the integration approaches t_end.
#[inline]
pub fn h_max(t: Real, t_end: Real, min_iters: u64) -> Real {
    (t_end - t).abs() / min_iters as Real
}

#[inline]
pub fn direction(t_start: Real, t_end: Real) -> Real {
    if t_end >= t_start {
        1.0
    } else {
        -1.0
    }
}

#[inline]
fn clamp_magnitude(h: Real, cap: Real) -> Real {
    if h.abs() > cap {
        h.signum() * cap
    } else {
        h
    }
}

// Single finite-difference iteration despite min_iters implying a cap;
// preserved as-is rather than turned into a loop, see DESIGN.md.
pub fn initial_step(
    sys: &dyn Rhs,
    p: &[Real],
    t: Real,
    y: &[Real],
    t_start: Real,
    t_end: Real,
    atol: Real,
    rtol: Real,
    min_iters: u64,
) -> Result<Real, ErrorCode> {
    let n = sys.n();
    if (t_end - t).abs() < 2.0 * roundoff(t_start, t_end) {
        return Err(ErrorCode::TdistTooSmall);
    }
    let dir = direction(t_start, t_end);
    let h_lb = 100.0 * roundoff(t_start, t_end);
    let h_ub = h_max(t, t_end, min_iters);
    let hg = (h_lb * h_ub).sqrt();

    let mut ydot = vec![0.0; n];
    sys.eval(t, p, y, &mut ydot);

    let mut y1 = vec![0.0; n];
    for k in 0..n {
        y1[k] = y[k] + hg * ydot[k];
    }
    let mut f1 = vec![0.0; n];
    sys.eval(t + hg, p, &y1, &mut f1);

    let mut yddot_est = vec![0.0; n];
    for k in 0..n {
        yddot_est[k] = (f1[k] - ydot[k]) / hg;
    }
    let yddnrm = wrms(&yddot_est, y, atol, rtol);

    let hnew = if yddnrm * h_ub * h_ub > 2.0 {
        (2.0 / yddnrm).sqrt()
    } else {
        (hg * h_ub).sqrt()
    };

    let h0 = (0.5 * hnew).clamp(h_lb, h_ub);
    Ok(dir * h0)
}

pub fn terminal_nudge(t: Real, h_next: Real, t_end: Real, hmin: Real, hmax: Real) -> Real {
    let dir = direction(t, t_end);
    let remaining = (t_end - t) * dir;
    let proposed = h_next.abs();
    if proposed >= remaining || (remaining - proposed) < hmin {
        clamp_magnitude(t_end - t, hmax)
    } else {
        h_next
    }
}
