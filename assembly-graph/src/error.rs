//! Error taxonomy for the assembly DAG and fire protocol.

use thiserror::Error;

/// Result type for `assembly-graph` operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors surfaced by the assembly arena and the fire protocol.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// An `AssemblyId` was not produced by this [`crate::graph::AssemblyGraph`].
    #[error("assembly id does not belong to this graph")]
    UnknownAssembly,

    /// A merge, associate, or fire call was given zero projectables.
    #[error("invalid parameter {parameter}: {reason}")]
    InvalidParameter { parameter: String, reason: String },

    /// Propagated from the connectome engine while firing a layer.
    #[error(transparent)]
    Core(#[from] assembly_core::CoreError),
}
