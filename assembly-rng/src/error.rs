//! Error type for the RNG kernel.

use thiserror::Error;

/// Result type for RNG kernel operations.
pub type Result<T> = std::result::Result<T, RngError>;

/// Errors raised by [`crate::generate`] and friends.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RngError {
    /// `p` was outside `[0, 1]`.
    #[error("invalid probability {p}: must lie in [0, 1]")]
    InvalidProbability { p: f64 },

    /// A requested matrix dimension was negative (callers pass `usize`, but
    /// a zero-sized matrix is still rejected since no caller in this crate
    /// ever needs one).
    #[error("invalid matrix dimensions {height}x{width}: both must be positive")]
    InvalidDimensions { height: usize, width: usize },
}
