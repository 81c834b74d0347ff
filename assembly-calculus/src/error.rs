//! Error taxonomy for the assembly algebra and recipe/recording layer.

use thiserror::Error;

/// Result type for `assembly-calculus` operations.
pub type Result<T> = std::result::Result<T, CalculusError>;

/// Errors surfaced by `project`/`merge`/`associate`/`read` and by recipes,
/// recordings, and `bake`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalculusError {
    /// A malformed call: an empty merge/associate set, or a self-merge.
    #[error("invalid parameter {parameter}: {reason}")]
    InvalidParameter { parameter: String, reason: String },

    /// `associate(a, b)` was called with `a.area != b.area` for some pair.
    #[error("associate requires both assemblies to live in the same area")]
    AreaMismatch,

    /// `read`/`read_scored` found no candidate above the confidence
    /// threshold.
    #[error("no assembly in the area matched the current winners above the confidence threshold")]
    ReadBelowThreshold,

    /// Propagated from the connectome engine.
    #[error(transparent)]
    Core(#[from] assembly_core::CoreError),

    /// Propagated from the assembly DAG / fire protocol.
    #[error(transparent)]
    Graph(#[from] assembly_graph::GraphError),
}
