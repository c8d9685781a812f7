use serde::{Deserialize, Serialize};

// niters and nsteps are monotone non-decreasing and always satisfy
// niters >= nsteps; the rest are diagnostic extras with no invariant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub niters: u64,
    pub nsteps: u64,
    pub n_rhs_evals: u64,
    pub n_jac_evals: u64,
    pub n_lu_decomps: u64,
}

impl Counters {
    pub fn n_rejected(&self) -> u64 {
        self.niters - self.nsteps
    }

    pub(crate) fn record_attempt(&mut self) {
        self.niters += 1;
    }

    pub(crate) fn record_accepted(&mut self) {
        self.nsteps += 1;
    }

    pub(crate) fn record_rhs_eval(&mut self) {
        self.n_rhs_evals += 1;
    }

    pub(crate) fn record_jac_eval(&mut self) {
        self.n_jac_evals += 1;
    }

    pub(crate) fn record_lu_decomp(&mut self) {
        self.n_lu_decomps += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_is_difference_of_attempts_and_accepted() {
        let mut c = Counters::default();
        c.record_attempt();
        c.record_attempt();
        c.record_accepted();
        assert_eq!(c.niters, 2);
        assert_eq!(c.nsteps, 1);
        assert_eq!(c.n_rejected(), 1);
    }
}
