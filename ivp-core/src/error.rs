use thiserror::Error;

// Per-IVP outcomes that can legitimately occur during a solve (step
// exhaustion, LU failure, Newton non-convergence) are reported through
// ErrorCode instead, one per lane; they never become an IvpError.
#[derive(Error, Debug)]
pub enum IvpError {
    #[error("absolute tolerance must be > 0, got {atol}")]
    NonPositiveAtol { atol: f64 },

    #[error("relative tolerance must be > 0, got {rtol}")]
    NonPositiveRtol { rtol: f64 },

    #[error("min_iters must be > 0, got {min_iters}")]
    NonPositiveMinIters { min_iters: u64 },

    #[error("adaption_limit must be > 1, got {adaption_limit}")]
    InvalidAdaptionLimit { adaption_limit: f64 },

    #[error("batch buffer length mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("vector_size must be a power of two, got {vector_size}")]
    VectorSizeNotPowerOfTwo { vector_size: usize },

    #[error("block_size must be a power of two and >= vector_size (block_size={block_size}, vector_size={vector_size})")]
    InvalidBlockSize {
        block_size: usize,
        vector_size: usize,
    },

    #[error("unknown memory ordering flag")]
    UnknownOrdering,

    #[error("num_workers must be >= 1, got {num_workers}")]
    NoWorkers { num_workers: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Success,
    MaxConsecutiveErrorsExceeded,
    TooMuchWork,
    HPlusTEqualsH,
    MaxNewtonIterExceeded,
    TdistTooSmall,
}

impl ErrorCode {
    pub fn is_success(self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    pub fn as_i32(self) -> i32 {
        match self {
            ErrorCode::Success => 0,
            ErrorCode::MaxConsecutiveErrorsExceeded => 1,
            ErrorCode::TooMuchWork => 2,
            ErrorCode::HPlusTEqualsH => 3,
            ErrorCode::MaxNewtonIterExceeded => 4,
            ErrorCode::TdistTooSmall => 5,
        }
    }
}

impl Default for ErrorCode {
    fn default() -> Self {
        ErrorCode::Success
    }
}
