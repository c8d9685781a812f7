use serde::{Deserialize, Serialize};

use crate::{error::IvpError, Real};

// y[i * n + k]: IVP i's state is contiguous.
// y[k * num + i]: component k across all IVPs is contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    RowMajor,
    ColumnMajor,
}

impl TryFrom<u8> for Order {
    type Error = IvpError;

    fn try_from(flag: u8) -> Result<Self, IvpError> {
        match flag {
            0 => Ok(Order::RowMajor),
            1 => Ok(Order::ColumnMajor),
            _ => Err(IvpError::UnknownOrdering),
        }
    }
}

/// Construct through [`SolverOptionsBuilder`] rather than the struct
/// literal, so `atol > 0`/`rtol > 0`/... are checked once instead of on
/// every step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    pub atol: Real,
    pub rtol: Real,
    pub h_init: Real,
    pub max_iters: u64,
    pub min_iters: u64,
    pub adaption_limit: Real,
    pub logging: bool,
    pub order: Order,
}

impl SolverOptions {
    pub fn new(atol: Real, rtol: Real) -> Result<Self, IvpError> {
        SolverOptionsBuilder::new().atol(atol).rtol(rtol).build()
    }
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptionsBuilder::new()
            .build()
            .expect("default solver options are always valid")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SolverOptionsBuilder {
    atol: Real,
    rtol: Real,
    h_init: Real,
    max_iters: u64,
    min_iters: u64,
    adaption_limit: Real,
    logging: bool,
    order: Order,
}

impl SolverOptionsBuilder {
    pub fn new() -> Self {
        Self {
            atol: 1e-10,
            rtol: 1e-6,
            h_init: 0.0,
            max_iters: 0,
            min_iters: 1,
            adaption_limit: 10.0,
            logging: false,
            order: Order::RowMajor,
        }
    }

    pub fn atol(mut self, atol: Real) -> Self {
        self.atol = atol;
        self
    }

    pub fn rtol(mut self, rtol: Real) -> Self {
        self.rtol = rtol;
        self
    }

    pub fn h_init(mut self, h_init: Real) -> Self {
        self.h_init = h_init;
        self
    }

    // 0 disables the cap.
    pub fn max_iters(mut self, max_iters: u64) -> Self {
        self.max_iters = max_iters;
        self
    }

    pub fn min_iters(mut self, min_iters: u64) -> Self {
        self.min_iters = min_iters;
        self
    }

    pub fn adaption_limit(mut self, adaption_limit: Real) -> Self {
        self.adaption_limit = adaption_limit;
        self
    }

    pub fn logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn build(self) -> Result<SolverOptions, IvpError> {
        if !(self.atol > 0.0) {
            return Err(IvpError::NonPositiveAtol { atol: self.atol });
        }
        if !(self.rtol > 0.0) {
            return Err(IvpError::NonPositiveRtol { rtol: self.rtol });
        }
        if self.min_iters == 0 {
            return Err(IvpError::NonPositiveMinIters {
                min_iters: self.min_iters,
            });
        }
        if !(self.adaption_limit > 1.0) {
            return Err(IvpError::InvalidAdaptionLimit {
                adaption_limit: self.adaption_limit,
            });
        }
        Ok(SolverOptions {
            atol: self.atol,
            rtol: self.rtol,
            h_init: self.h_init,
            max_iters: self.max_iters,
            min_iters: self.min_iters,
            adaption_limit: self.adaption_limit,
            logging: self.logging,
            order: self.order,
        })
    }
}

impl Default for SolverOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
