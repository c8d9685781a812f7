use nalgebra::{Complex, DMatrix, DVector};
use thiserror::Error;

use crate::Real;

/// Column-major, matching the Jacobian convention in [`crate::rhs`].
pub type RealMatrix = DMatrix<Real>;
pub type RealVector = DVector<Real>;
pub type ComplexMatrix = DMatrix<Complex<Real>>;
pub type ComplexVector = DVector<Complex<Real>>;

/// The factor is singular or too ill-conditioned to trust.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("matrix is singular or numerically rank-deficient")]
pub struct SingularMatrix;

/// Reused across Newton iterations within one accepted step.
pub struct RealFactorization {
    lu: nalgebra::linalg::LU<Real, nalgebra::Dyn, nalgebra::Dyn>,
}

impl RealFactorization {
    pub fn factor(a: &RealMatrix) -> Result<Self, SingularMatrix> {
        let lu = nalgebra::linalg::LU::new(a.clone());
        if !lu.is_invertible() {
            return Err(SingularMatrix);
        }
        Ok(Self { lu })
    }

    pub fn solve_in_place(&self, b: &mut RealVector) -> Result<(), SingularMatrix> {
        let x = self.lu.solve(b).ok_or(SingularMatrix)?;
        b.copy_from(&x);
        Ok(())
    }
}

pub struct ComplexFactorization {
    lu: nalgebra::linalg::LU<Complex<Real>, nalgebra::Dyn, nalgebra::Dyn>,
}

impl ComplexFactorization {
    pub fn factor(a: &ComplexMatrix) -> Result<Self, SingularMatrix> {
        let lu = nalgebra::linalg::LU::new(a.clone());
        if !lu.is_invertible() {
            return Err(SingularMatrix);
        }
        Ok(Self { lu })
    }

    pub fn solve_in_place(&self, b: &mut ComplexVector) -> Result<(), SingularMatrix> {
        let x = self.lu.solve(b).ok_or(SingularMatrix)?;
        b.copy_from(&x);
        Ok(())
    }
}
