// Lock-step vector lane: V IVPs share one lane and step together, modeled
// as a masked loop over V scalar slots rather than actual SIMD/SIMT.
// RKF45 only; Radau's per-lane Jacobian/LU state doesn't fit this shape.

use super::queue::WorkQueue;
use super::scalar::{extract_lane, insert_lane, param_slice};
use crate::{
    config::Order, error::ErrorCode, rhs::Rhs, rkf45::controller, rkf45::step, stats::Counters,
    step_control, workspace::RkfWorkspace, Real, SolverOptions,
};

#[derive(Debug, Clone)]
pub struct LaneOutcome<const V: usize> {
    pub codes: [ErrorCode; V],
    pub counters: [Counters; V],
}

struct LaneState {
    t: Real,
    h: Real,
    hmin: Real,
    hmax: Real,
    roundoff: Real,
    dir: Real,
    done: bool,
    code: ErrorCode,
    ws: RkfWorkspace,
    counters: Counters,
}

fn init_lane<S: Rhs>(sys: &S, p_i: &[Real], t0_i: Real, t_end_i: Real, y_i: &[Real], opts: &SolverOptions) -> LaneState {
    let roundoff = step_control::roundoff(t0_i, t_end_i);
    let (done, code) = if (t_end_i - t0_i).abs() < 2.0 * roundoff {
        (true, ErrorCode::TdistTooSmall)
    } else if t0_i == t_end_i {
        (true, ErrorCode::Success)
    } else {
        (false, ErrorCode::Success)
    };
    let hmin = step_control::h_min(t0_i, t_end_i);
    let hmax = step_control::h_max(t0_i, t_end_i, opts.min_iters);
    let dir = step_control::direction(t0_i, t_end_i);
    let (done, code) = if !done && hmin >= hmax {
        (true, ErrorCode::TdistTooSmall)
    } else {
        (done, code)
    };
    let h = if done {
        0.0
    } else if opts.h_init.abs() > hmin {
        dir * opts.h_init.abs()
    } else {
        match step_control::initial_step(sys, p_i, t0_i, y_i, t0_i, t_end_i, opts.atol, opts.rtol, opts.min_iters) {
            Ok(h) => h,
            Err(_) => 0.0,
        }
    };
    LaneState {
        t: t0_i,
        h,
        hmin,
        hmax,
        roundoff,
        dir,
        done,
        code,
        ws: RkfWorkspace::new(sys.n()),
        counters: Counters::default(),
    }
}

/// Runs one masked step attempt for a lane already known to be active
/// (`!lane.done`). Shared by the fixed-width [`solve`] and the
/// queue-refilled [`solve_queued`].
fn step_lane<S: Rhs>(sys: &S, p_i: &[Real], t_end_i: Real, lane: &mut LaneState, y_i: &mut [Real], opts: &SolverOptions) {
    if opts.max_iters != 0 && lane.counters.niters >= opts.max_iters {
        lane.done = true;
        lane.code = ErrorCode::TooMuchWork;
        return;
    }
    lane.counters.record_attempt();
    step::rkf45_trial_step(sys, p_i, lane.t, y_i, lane.h, &mut lane.ws, &mut lane.counters);
    let outcome = controller::accept(&lane.ws.err, y_i, lane.h, opts.atol, opts.rtol, lane.hmin, opts.adaption_limit);

    if outcome.accept {
        lane.t += lane.h;
        y_i.copy_from_slice(&lane.ws.y_tmp);
        lane.counters.record_accepted();
        if (t_end_i - lane.t).abs() <= lane.roundoff {
            lane.done = true;
            lane.code = ErrorCode::Success;
            return;
        }
        lane.hmax = step_control::h_max(lane.t, t_end_i, opts.min_iters);
        if lane.hmin >= lane.hmax {
            lane.done = true;
            lane.code = ErrorCode::TdistTooSmall;
            return;
        }
        lane.h = step_control::terminal_nudge(lane.t, outcome.next_h, t_end_i, lane.hmin, lane.hmax);
    } else {
        lane.h = outcome.next_h;
        if lane.h.abs() < lane.hmin {
            lane.h = lane.hmin * lane.dir;
        }
    }

    if lane.t + lane.h == lane.t {
        lane.done = true;
        lane.code = ErrorCode::HPlusTEqualsH;
    }
}

pub fn solve<S: Rhs, const V: usize>(
    sys: &S,
    p: &[&[Real]; V],
    t0: [Real; V],
    t_end: [Real; V],
    y: &mut [Vec<Real>; V],
    opts: &SolverOptions,
) -> LaneOutcome<V> {
    let mut lanes: Vec<LaneState> = (0..V).map(|i| init_lane(sys, p[i], t0[i], t_end[i], &y[i], opts)).collect();

    while lanes.iter().any(|l| !l.done) {
        for (i, lane) in lanes.iter_mut().enumerate() {
            if lane.done {
                continue;
            }
            step_lane(sys, p[i], t_end[i], lane, &mut y[i], opts);
        }
    }

    let mut codes = [ErrorCode::Success; V];
    let counters: [Counters; V] = std::array::from_fn(|i| lanes[i].counters);
    for i in 0..V {
        codes[i] = lanes[i].code;
    }
    LaneOutcome { codes, counters }
}

// Like solve, but over num IVPs on a lane of width V: a slot going done
// is refilled from the shared WorkQueue instead of idling until the
// whole V-wide group drains. t0/t_end/p are per-IVP (lengths num, num,
// num * n_params); y is the packed num * n state buffer per opts.order.
pub fn solve_queued<S: Rhs, const V: usize>(
    sys: &S,
    t0: &[Real],
    t_end: &[Real],
    p: &[Real],
    y: &mut [Real],
    n: usize,
    num: usize,
    opts: &SolverOptions,
) -> (Vec<ErrorCode>, Vec<Counters>) {
    let n_params = sys.n_params();
    let order: Order = opts.order;
    let mut codes = vec![ErrorCode::Success; num];
    let mut counters = vec![Counters::default(); num];

    let queue = WorkQueue::new(num);
    let width = V.min(num.max(1));

    let mut slot_ivp: Vec<Option<usize>> = vec![None; width];
    let mut slot_y: Vec<Vec<Real>> = vec![Vec::new(); width];
    let mut slot_lane: Vec<Option<LaneState>> = (0..width).map(|_| None).collect();

    for slot in slot_ivp.iter_mut().take(width) {
        *slot = queue.next();
    }
    for i in 0..width {
        if let Some(idx) = slot_ivp[i] {
            let y_i = extract_lane(y, order, n, num, idx);
            let p_i = param_slice(p, n_params, idx);
            slot_lane[i] = Some(init_lane(sys, p_i, t0[idx], t_end[idx], &y_i, opts));
            slot_y[i] = y_i;
        }
    }

    while slot_ivp.iter().any(|s| s.is_some()) {
        for i in 0..width {
            let Some(idx) = slot_ivp[i] else { continue };
            let lane = slot_lane[i].as_mut().expect("slot with an assigned IVP has a lane state");
            if !lane.done {
                let p_i = param_slice(p, n_params, idx);
                step_lane(sys, p_i, t_end[idx], lane, &mut slot_y[i], opts);
            }
            if lane.done {
                codes[idx] = lane.code;
                counters[idx] = lane.counters;
                insert_lane(y, order, n, num, idx, &slot_y[i]);

                match queue.next() {
                    Some(next_idx) => {
                        let y_next = extract_lane(y, order, n, num, next_idx);
                        let p_next = param_slice(p, n_params, next_idx);
                        slot_lane[i] = Some(init_lane(sys, p_next, t0[next_idx], t_end[next_idx], &y_next, opts));
                        slot_y[i] = y_next;
                        slot_ivp[i] = Some(next_idx);
                    }
                    None => {
                        slot_ivp[i] = None;
                        slot_lane[i] = None;
                        slot_y[i] = Vec::new();
                    }
                }
            }
        }
    }

    (codes, counters)
}
