use crate::{IndexType, Real};

// p is an opaque parameter bundle passed through unchanged; this crate
// never inspects its contents. eval must be pure: no reads/writes beyond
// y, p, t, and no panics on repeated calls with identical arguments.
pub trait Rhs {
    fn n(&self) -> IndexType;

    fn n_params(&self) -> IndexType {
        0
    }

    fn eval(&self, t: Real, p: &[Real], y: &[Real], dy: &mut [Real]);
}

pub trait Jacobian: Rhs {
    /// `a` is column-major: `a[i + j * n()] == dF_i/dy_j`.
    fn eval_jacobian(&self, t: Real, p: &[Real], y: &[Real], a: &mut [Real]);
}
