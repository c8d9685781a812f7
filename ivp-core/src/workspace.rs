use crate::linalg::RealMatrix;
use crate::Real;

pub struct RkfWorkspace {
    n: usize,
    pub stage: [Vec<Real>; 6],
    pub y_tmp: Vec<Real>,
    pub err: Vec<Real>,
    pub rhs_scratch: Vec<Real>,
}

impl RkfWorkspace {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            stage: std::array::from_fn(|_| vec![0.0; n]),
            y_tmp: vec![0.0; n],
            err: vec![0.0; n],
            rhs_scratch: vec![0.0; n],
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }
}

// Pivoting lives inside nalgebra::linalg::LU (via RealFactorization /
// ComplexFactorization), not in this workspace.
pub struct RadauWorkspace {
    n: usize,
    pub z: [Vec<Real>; 3],
    pub dz: [Vec<Real>; 3],
    pub cont: [Vec<Real>; 3],
    pub a: RealMatrix,
    pub stage_y: Vec<Real>,
    pub stage_f: [Vec<Real>; 3],
    pub f0: Vec<Real>,
}

impl RadauWorkspace {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            z: std::array::from_fn(|_| vec![0.0; n]),
            dz: std::array::from_fn(|_| vec![0.0; n]),
            cont: std::array::from_fn(|_| vec![0.0; n]),
            a: RealMatrix::zeros(n, n),
            stage_y: vec![0.0; n],
            stage_f: std::array::from_fn(|_| vec![0.0; n]),
            f0: vec![0.0; n],
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn clear_z(&mut self) {
        for z in &mut self.z {
            z.iter_mut().for_each(|v| *v = 0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rkf_workspace_buffers_are_zeroed_and_sized() {
        let ws = RkfWorkspace::new(3);
        assert_eq!(ws.n(), 3);
        assert!(ws.stage.iter().all(|s| s.len() == 3 && s.iter().all(|&v| v == 0.0)));
        assert_eq!(ws.y_tmp.len(), 3);
        assert_eq!(ws.err.len(), 3);
    }

    #[test]
    fn radau_workspace_clear_z_zeroes_all_three() {
        let mut ws = RadauWorkspace::new(2);
        for z in &mut ws.z {
            z[0] = 1.0;
            z[1] = 2.0;
        }
        ws.clear_z();
        assert!(ws.z.iter().all(|z| z.iter().all(|&v| v == 0.0)));
    }
}
