use crate::norm::wrms;
use crate::Real;

#[derive(Debug, Clone, Copy)]
pub struct RkfAcceptance {
    pub herr: Real,
    pub accept: bool,
    pub next_h: Real,
}

// fact = 0.840896 * herr^(-1/4), clamped to [1/adaption_limit, adaption_limit].
pub fn accept(
    err: &[Real],
    y: &[Real],
    h: Real,
    atol: Real,
    rtol: Real,
    h_min: Real,
    adaption_limit: Real,
) -> RkfAcceptance {
    let herr = wrms(err, y, atol, rtol);
    let accepted = herr <= 1.0 || h.abs() <= h_min;
    // Guard against herr == 0 (exact solve), which would otherwise send
    // fact to infinity before the clamp.
    let safe_herr = herr.max(Real::MIN_POSITIVE);
    let fact = (0.840896 * safe_herr.powf(-0.25)).clamp(1.0 / adaption_limit, adaption_limit);
    RkfAcceptance {
        herr,
        accept: accepted,
        next_h: h * fact,
    }
}
