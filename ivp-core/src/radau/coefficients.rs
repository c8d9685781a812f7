// Standard Radau IIA / RADAU5 constants; see DESIGN.md for provenance.

use crate::Real;

const S6: Real = 2.449489742783178; // sqrt(6)

/// Stage nodes `c = ((4-sqrt6)/10, (4+sqrt6)/10, 1)`.
pub const C: [Real; 3] = [(4.0 - S6) / 10.0, (4.0 + S6) / 10.0, 1.0];

/// Stiffly accurate: row 3 equals `b`.
pub const A: [[Real; 3]; 3] = [
    [
        (88.0 - 7.0 * S6) / 360.0,
        (296.0 - 169.0 * S6) / 1800.0,
        (-2.0 + 3.0 * S6) / 225.0,
    ],
    [
        (296.0 + 169.0 * S6) / 1800.0,
        (88.0 + 7.0 * S6) / 360.0,
        (-2.0 - 3.0 * S6) / 225.0,
    ],
    [(16.0 - S6) / 36.0, (16.0 + S6) / 36.0, 1.0 / 9.0],
];

// Eigenvalues of A^-1: one real (GAMMA), one complex-conjugate pair
// (ALPHA +/- i*BETA), used to split the 3N Newton system into a real N
// solve and a complex N solve.
pub const GAMMA: Real = 3.637834252744496;
pub const ALPHA: Real = 2.681082873627752;
pub const BETA: Real = 3.050430199247410;

// Real eigenbasis of A^-1; TI is its inverse.
pub const T: [[Real; 3]; 3] = [
    [9.1232394870892942792e-2, -0.14125529502095420843, -3.0029194105147424492e-2],
    [0.24171793270710701896, 0.20412935229379993199, 0.38294211275726193779],
    [0.96604818261509293619, 1.0, 0.0],
];

pub const TI: [[Real; 3]; 3] = [
    [4.3255798900631553510, 0.33919925181580871831, 0.54177053993587487119],
    [-4.1787185915519047273, -0.32768282076106238708, 0.47662355450055045196],
    [-0.50287263494578687595, 2.5719269498556054292, -0.59603920482822492497],
];

/// `TMP = RK_E[0]*F0 + (RK_E[1]*Z1 + RK_E[2]*Z2 + RK_E[3]*Z3)/H`.
pub const RK_E: [Real; 4] = [0.05, -0.50244, 0.0691071, -1.0 / 60.0];

pub const NEWTON_TOL: Real = 0.03;
pub const MAX_NEWTON_ITERS: usize = 8;
pub const ELO: Real = 4.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tableau_row_three_is_stiffly_accurate() {
        // b = row 3 of A, which is how "y <- y + Z3" is justified.
        assert_eq!(A[2], [(16.0 - S6) / 36.0, (16.0 + S6) / 36.0, 1.0 / 9.0]);
    }

    #[test]
    fn nodes_match_known_approximations() {
        assert!((C[0] - 0.1550).abs() < 1e-3);
        assert!((C[1] - 0.6449).abs() < 1e-3);
        assert_eq!(C[2], 1.0);
    }

    #[test]
    fn eigenvalues_match_known_approximations() {
        assert!((GAMMA - 3.63783).abs() < 1e-3);
        assert!((ALPHA - 2.68108).abs() < 1e-3);
        assert!((BETA - 3.05043).abs() < 1e-3);
    }
}
