// Scalar-per-lane execution: each worker integrates one IVP to completion
// independently of every other.

use super::log::Log;
use super::SolverKind;
use crate::{
    config::Order,
    error::{ErrorCode, IvpError},
    radau,
    rhs::Jacobian,
    rkf45,
    stats::Counters,
    Real, SolverOptions,
};

pub(crate) fn validate_batch_lengths(t0: &[Real], t_end: &[Real], p: &[Real], y: &[Real], n: usize, n_params: usize, num: usize) -> Result<(), IvpError> {
    if t0.len() != num {
        return Err(IvpError::DimensionMismatch {
            expected: num,
            actual: t0.len(),
        });
    }
    if t_end.len() != num {
        return Err(IvpError::DimensionMismatch {
            expected: num,
            actual: t_end.len(),
        });
    }
    let expected_p = num * n_params;
    if p.len() != expected_p {
        return Err(IvpError::DimensionMismatch {
            expected: expected_p,
            actual: p.len(),
        });
    }
    let expected_y = num * n;
    if y.len() != expected_y {
        return Err(IvpError::DimensionMismatch {
            expected: expected_y,
            actual: y.len(),
        });
    }
    Ok(())
}

pub(crate) fn extract_lane(y: &[Real], order: Order, n: usize, num: usize, i: usize) -> Vec<Real> {
    let mut out = vec![0.0; n];
    match order {
        Order::RowMajor => out.copy_from_slice(&y[i * n..(i + 1) * n]),
        Order::ColumnMajor => {
            for k in 0..n {
                out[k] = y[k * num + i];
            }
        }
    }
    out
}

pub(crate) fn insert_lane(y: &mut [Real], order: Order, n: usize, num: usize, i: usize, lane: &[Real]) {
    match order {
        Order::RowMajor => y[i * n..(i + 1) * n].copy_from_slice(lane),
        Order::ColumnMajor => {
            for k in 0..n {
                y[k * num + i] = lane[k];
            }
        }
    }
}

pub(crate) fn param_slice(p: &[Real], n_params: usize, i: usize) -> &[Real] {
    if n_params == 0 {
        &[]
    } else {
        &p[i * n_params..(i + 1) * n_params]
    }
}

// logs, if provided, must have length num; each entry receives that
// IVP's own accepted-step trajectory.
pub fn integrate<S: Jacobian>(
    sys: &S,
    kind: SolverKind,
    t0: &[Real],
    t_end: &[Real],
    p: &[Real],
    y: &mut [Real],
    n: usize,
    num: usize,
    opts: &SolverOptions,
    mut logs: Option<&mut [Log]>,
) -> Result<(Vec<ErrorCode>, Vec<Counters>), IvpError> {
    let n_params = sys.n_params();
    validate_batch_lengths(t0, t_end, p, y, n, n_params, num)?;
    let mut codes = vec![ErrorCode::Success; num];
    let mut counters = vec![Counters::default(); num];

    for i in 0..num {
        let mut y_i = extract_lane(y, opts.order, n, num, i);
        let p_i = param_slice(p, n_params, i);
        let mut steps: Vec<(Real, Vec<Real>)> = Vec::new();

        let (code, c) = match kind {
            SolverKind::Rkf45 => {
                let outcome = rkf45::solve(sys, p_i, t0[i], t_end[i], &mut y_i, opts, |t, yy| {
                    steps.push((t, yy.to_vec()));
                });
                (outcome.code, outcome.counters)
            }
            SolverKind::Radau => {
                let outcome = radau::solve(sys, p_i, t0[i], t_end[i], &mut y_i, opts, |t, yy| {
                    steps.push((t, yy.to_vec()));
                });
                (outcome.code, outcome.counters)
            }
        };

        if let Some(l) = logs.as_deref_mut() {
            for (t, phi) in &steps {
                l[i].record_step(*t, phi);
            }
        }

        codes[i] = code;
        counters[i] = c;
        insert_lane(y, opts.order, n, num, i, &y_i);
    }

    Ok((codes, counters))
}

#[cfg(feature = "rayon")]
// Logging isn't supported on this path; use integrate when a trajectory
// log is required.
pub fn integrate_parallel<S: Jacobian + Sync>(
    sys: &S,
    kind: SolverKind,
    t0: &[Real],
    t_end: &[Real],
    p: &[Real],
    y: &mut [Real],
    n: usize,
    num: usize,
    opts: &SolverOptions,
) -> Result<(Vec<ErrorCode>, Vec<Counters>), IvpError> {
    use rayon::prelude::*;

    let n_params = sys.n_params();
    validate_batch_lengths(t0, t_end, p, y, n, n_params, num)?;
    let order = opts.order;

    let lanes: Vec<Vec<Real>> = (0..num).map(|i| extract_lane(y, order, n, num, i)).collect();

    let results: Vec<(Vec<Real>, ErrorCode, Counters)> = (0..num)
        .into_par_iter()
        .map(|i| {
            let mut y_i = lanes[i].clone();
            let p_i = param_slice(p, n_params, i);
            let outcome = match kind {
                SolverKind::Rkf45 => rkf45::solve(sys, p_i, t0[i], t_end[i], &mut y_i, opts, |_, _| {}),
                SolverKind::Radau => {
                    let o = radau::solve(sys, p_i, t0[i], t_end[i], &mut y_i, opts, |_, _| {});
                    rkf45::SolveOutcome {
                        code: o.code,
                        counters: o.counters,
                    }
                }
            };
            (y_i, outcome.code, outcome.counters)
        })
        .collect();

    let mut codes = Vec::with_capacity(num);
    let mut counters = Vec::with_capacity(num);
    for (i, (y_i, code, c)) in results.into_iter().enumerate() {
        insert_lane(y, order, n, num, i, &y_i);
        codes.push(code);
        counters.push(c);
    }
    Ok((codes, counters))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverOptionsBuilder;

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

    #[test]
    fn row_major_round_trip_matches_single_ivp_solve() {
        let opts = SolverOptionsBuilder::new().order(Order::RowMajor).build().unwrap();
        let mut y = [1.0, 1.0];
        let (codes, _) = integrate(&Decay, SolverKind::Rkf45, &[0.0, 0.0], &[1.0, 1.0], &[0.0, 0.0], &mut y, 1, 2, &opts, None).unwrap();
        assert!(codes.iter().all(|c| c.is_success()));
        assert!((y[0] - 0.3678794412).abs() < 1e-6);
        assert!((y[1] - 0.3678794412).abs() < 1e-6);
    }

    #[test]
    fn column_major_layout_is_respected() {
        let opts = SolverOptionsBuilder::new().order(Order::ColumnMajor).build().unwrap();
        let mut y = [1.0, 2.0]; // component 0 across both IVPs
        let (codes, _) = integrate(&Decay, SolverKind::Rkf45, &[0.0, 0.0], &[1.0, 1.0], &[0.0, 0.0], &mut y, 1, 2, &opts, None).unwrap();
        assert!(codes.iter().all(|c| c.is_success()));
        assert!((y[0] - 0.3678794412).abs() < 1e-6);
        assert!((y[1] - 2.0 * 0.3678794412).abs() < 1e-6);
    }

    #[test]
    fn zero_param_system_does_not_index_past_an_empty_p() {
        let opts = SolverOptionsBuilder::new().build().unwrap();
        let mut y = [1.0, 2.0];
        let (codes, _) = integrate(&Decay, SolverKind::Rkf45, &[0.0, 0.0], &[1.0, 1.0], &[], &mut y, 1, 2, &opts, None).unwrap();
        assert!(codes.iter().all(|c| c.is_success()));
    }

    #[test]
    fn mismatched_t0_length_is_a_dimension_mismatch_not_a_panic() {
        let opts = SolverOptionsBuilder::new().build().unwrap();
        let mut y = [1.0, 2.0];
        let res = integrate(&Decay, SolverKind::Rkf45, &[0.0], &[1.0, 1.0], &[], &mut y, 1, 2, &opts, None);
        assert!(matches!(res, Err(IvpError::DimensionMismatch { expected: 2, actual: 1 })));
    }

    #[test]
    fn mismatched_y_length_is_a_dimension_mismatch_not_a_panic() {
        let opts = SolverOptionsBuilder::new().build().unwrap();
        let mut y = [1.0];
        let res = integrate(&Decay, SolverKind::Rkf45, &[0.0, 0.0], &[1.0, 1.0], &[], &mut y, 1, 2, &opts, None);
        assert!(matches!(res, Err(IvpError::DimensionMismatch { expected: 2, actual: 1 })));
    }
}
