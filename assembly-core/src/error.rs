//! Error taxonomy for the connectome engine.

use thiserror::Error;

/// Result type for `assembly-core` operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors surfaced by brain parts, the connection store, the projection
/// engine, and the brain's scoped binding context.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Negative `n`/`k`/`beta`, `p` outside `[0, 1]`, or an otherwise
    /// malformed constructor argument.
    #[error("invalid parameter {parameter}: {reason}")]
    InvalidParameter { parameter: String, reason: String },

    /// An edge referenced a part the brain does not know about.
    #[error("unknown brain part referenced in {context}")]
    UnknownPart { context: String },

    /// Lazy initialization was disabled and the edge had no stored weights.
    #[error("no connection stored for the requested edge (lazy init disabled)")]
    MissingConnection,

    /// A winner index referenced a neuron outside `0..source.n`.
    #[error("winner index {index} out of range for source with {n} neurons")]
    DimensionMismatch { index: usize, n: usize },

    /// A binding scope was exited out of LIFO order, or an unresolvable
    /// conflict arose between nested scopes.
    #[error("scope misuse: {reason}")]
    ScopeMisuse { reason: String },

    /// Propagated from the RNG kernel.
    #[error(transparent)]
    Rng(#[from] assembly_rng::error::RngError),
}
