use super::coefficients::{ELO, MAX_NEWTON_ITERS};
use crate::Real;

pub const FAC_MIN: Real = 0.2;
pub const FAC_MAX: Real = 8.0;
// Conventional Gustafsson safety factor, not fixed by the acceptance formula.
pub const FAC_SAFE: Real = 0.9;
pub const THETA_MIN: Real = 0.001;
pub const Q_MIN: Real = 1.0;
pub const Q_MAX: Real = 1.2;
pub const MAX_CONSECUTIVE_LU_FAILURES: u32 = 5;

// Fac = Err^(-1/ELO) * (1+2*maxit)/(iter+1+2*maxit), clamped to [FAC_MIN, FAC_MAX].
pub fn base_fac(err: Real, iters: usize) -> Real {
    let maxit = MAX_NEWTON_ITERS as Real;
    let fac = err.max(Real::MIN_POSITIVE).powf(-1.0 / ELO) * (1.0 + 2.0 * maxit)
        / (iters as Real + 1.0 + 2.0 * maxit);
    fac.clamp(FAC_MIN, FAC_MAX)
}

#[derive(Debug, Clone, Copy)]
pub struct Gustafsson {
    h_acc: Real,
    err_old: Real,
    primed: bool,
}

impl Gustafsson {
    pub fn new() -> Self {
        Self {
            h_acc: 0.0,
            err_old: 1.0,
            primed: false,
        }
    }

    pub fn correct(&mut self, fac: Real, h: Real, err: Real) -> Real {
        let fac = if self.primed {
            let fac_gus = (FAC_SAFE * (h / self.h_acc) * (err * err / self.err_old).powf(-0.25))
                .clamp(FAC_MIN, FAC_MAX);
            fac.min(fac_gus)
        } else {
            fac
        };
        self.h_acc = h;
        self.err_old = err.max(1e-2);
        self.primed = true;
        fac
    }
}

impl Default for Gustafsson {
    fn default() -> Self {
        Self::new()
    }
}

pub fn skip_lu(theta_last: Real, h_new: Real, h: Real) -> bool {
    theta_last <= THETA_MIN && (Q_MIN..=Q_MAX).contains(&(h_new / h))
}

pub fn skip_jacobian(newton_iters: usize, rate: Real) -> bool {
    newton_iters == 1 || rate <= THETA_MIN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_fac_shrinks_for_large_error() {
        assert!(base_fac(100.0, 3) < 1.0);
    }

    #[test]
    fn base_fac_is_clamped() {
        assert!(base_fac(1e-12, 1) <= FAC_MAX);
        assert!(base_fac(1e12, 1) >= FAC_MIN);
    }

    #[test]
    fn gustafsson_is_unprimed_on_first_call() {
        let mut g = Gustafsson::new();
        let fac = g.correct(2.0, 0.1, 0.5);
        assert_eq!(fac, 2.0);
    }

    #[test]
    fn skip_lu_requires_small_theta_and_bounded_ratio() {
        assert!(skip_lu(0.0001, 1.05, 1.0));
        assert!(!skip_lu(0.5, 1.05, 1.0));
        assert!(!skip_lu(0.0001, 2.0, 1.0));
    }

    #[test]
    fn skip_jacobian_on_single_iteration_or_small_rate() {
        assert!(skip_jacobian(1, 0.5));
        assert!(skip_jacobian(5, 0.0001));
        assert!(!skip_jacobian(5, 0.5));
    }
}
