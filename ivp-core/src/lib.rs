//! Adaptive batch ODE integration engine: RKF45 for non-stiff and Radau
//! IIA for stiff systems, driven across many IVPs at once by [`driver`].

pub mod config;
pub mod driver;
pub mod error;
pub mod linalg;
pub mod norm;
pub mod radau;
pub mod rkf45;
pub mod rhs;
pub mod stats;
pub mod step_control;
pub mod workspace;

pub use config::{Order, SolverOptions, SolverOptionsBuilder};
pub use error::{ErrorCode, IvpError};
pub use rhs::{Jacobian, Rhs};
pub use stats::Counters;

// Fixed to f64: the Radau IIA constants in radau::coefficients are only
// meaningful to double precision.
pub type Real = f64;
pub type IndexType = usize;
