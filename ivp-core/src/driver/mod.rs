pub mod lane;
pub mod log;
pub mod queue;
pub mod scalar;

use crate::{config::SolverOptions, error::IvpError, rhs::Jacobian, rhs::Rhs, stats::Counters, ErrorCode};

// Radau requires S: Jacobian; RKF45 only needs the Rhs half, which every
// Jacobian implementor already satisfies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverKind {
    Rkf45,
    Radau,
}

#[inline]
fn is_power_of_two(x: usize) -> bool {
    x != 0 && (x & (x - 1)) == 0
}

pub fn validate_vector_block_sizes(vector_size: usize, block_size: usize) -> Result<(), IvpError> {
    if !is_power_of_two(vector_size) {
        return Err(IvpError::VectorSizeNotPowerOfTwo { vector_size });
    }
    if !is_power_of_two(block_size) || block_size < vector_size {
        return Err(IvpError::InvalidBlockSize {
            block_size,
            vector_size,
        });
    }
    Ok(())
}

pub struct BatchDriver<'a, S> {
    sys: &'a S,
    n: usize,
    opts: SolverOptions,
}

impl<'a, S: Jacobian> BatchDriver<'a, S> {
    pub fn new(sys: &'a S, num_workers: usize, opts: SolverOptions) -> Result<Self, IvpError> {
        if num_workers == 0 {
            return Err(IvpError::NoWorkers { num_workers });
        }
        Ok(Self {
            sys,
            n: sys.n(),
            opts,
        })
    }

    pub fn integrate(
        &self,
        kind: SolverKind,
        t0: &[f64],
        t_end: &[f64],
        p: &[f64],
        y: &mut [f64],
        num: usize,
        logs: Option<&mut [log::Log]>,
    ) -> Result<(Vec<ErrorCode>, Vec<Counters>), IvpError> {
        scalar::integrate(self.sys, kind, t0, t_end, p, y, self.n, num, &self.opts, logs)
    }

    #[cfg(feature = "rayon")]
    pub fn integrate_parallel(
        &self,
        kind: SolverKind,
        t0: &[f64],
        t_end: &[f64],
        p: &[f64],
        y: &mut [f64],
        num: usize,
    ) -> Result<(Vec<ErrorCode>, Vec<Counters>), IvpError>
    where
        S: Sync,
    {
        scalar::integrate_parallel(self.sys, kind, t0, t_end, p, y, self.n, num, &self.opts)
    }

    // Lock-step vector lane, width V, RKF45 only. Finished slots refill
    // from the atomic work queue; see lane::solve_queued.
    pub fn integrate_vector_lane<const V: usize>(
        &self,
        t0: &[f64],
        t_end: &[f64],
        p: &[f64],
        y: &mut [f64],
        num: usize,
    ) -> Result<(Vec<ErrorCode>, Vec<Counters>), IvpError> {
        scalar::validate_batch_lengths(t0, t_end, p, y, self.n, self.sys.n_params(), num)?;
        Ok(lane::solve_queued::<S, V>(self.sys, t0, t_end, p, y, self.n, num, &self.opts))
    }

    pub fn options(&self) -> &SolverOptions {
        &self.opts
    }

    pub fn n(&self) -> usize {
        self.n
    }
}
