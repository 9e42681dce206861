//! Error taxonomy for the scoring engine
//!
//! Degenerate numeric input (zero-variance samples, zero reversion speed,
//! statistics over fewer than two points) is handled inside the components
//! with neutral fallbacks and never surfaces here.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// A history or sample is shorter than the operation requires.
    /// Recoverable: the caller can present an unscored result or fetch more
    /// data.
    #[error("insufficient data for {context}: need at least {required} points, got {actual}")]
    InsufficientData {
        context: &'static str,
        required: usize,
        actual: usize,
    },

    /// The candidate set to rank was empty.
    #[error("no offers to rank")]
    EmptyInput,

    /// A parameter was rejected before any computation ran.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
