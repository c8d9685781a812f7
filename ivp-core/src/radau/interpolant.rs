// Quadratic CONT interpolant built from an accepted step's {Z1, Z2, Z3};
// used only to warm-start the next step's Newton iteration, not as a
// general-purpose dense output.

use super::coefficients::C;
use crate::Real;

// Newton divided-difference form of the quadratic through
// (C[0], Z1), (C[1], Z2), (C[2], Z3).
pub fn build_cont(cont: &mut [Vec<Real>; 3], z: &[Vec<Real>; 3]) {
    let n = cont[0].len();
    for k in 0..n {
        let d01 = (z[1][k] - z[0][k]) / (C[1] - C[0]);
        let d12 = (z[2][k] - z[1][k]) / (C[2] - C[1]);
        cont[0][k] = z[0][k];
        cont[1][k] = d01;
        cont[2][k] = (d12 - d01) / (C[2] - C[0]);
    }
}

#[inline]
fn horner(cont: &[Vec<Real>; 3], x: Real, k: usize) -> Real {
    cont[0][k] + (x - C[0]) * (cont[1][k] + (x - C[1]) * cont[2][k])
}

// Evaluates all three stages consistently at their own node x_i = 1 +
// c_i * (h / h_old); see DESIGN.md for a transcription ambiguity this
// deliberately does not reproduce.
pub fn warm_start(cont: &[Vec<Real>; 3], h: Real, h_old: Real, z: &mut [Vec<Real>; 3]) {
    let n = cont[0].len();
    let ratio = h / h_old;
    for i in 0..3 {
        let x = 1.0 + C[i] * ratio;
        for k in 0..n {
            z[i][k] = horner(cont, x, k);
        }
    }
}
