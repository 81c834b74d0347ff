//! Assembly DAG and fire protocol for the assembly calculus.
//!
//! Builds on [`assembly_core`]'s connectome engine. Exposes the
//! deduplicated arena ([`graph::AssemblyGraph`]), the DAG's node types
//! ([`node`]), and the layer-by-layer fire protocol ([`fire`]) that stages
//! ancestor projections into a brain before an assembly operation runs. The
//! `project`/`reciprocal_project`/`merge`/`associate`/`read` algebra and
//! recipe/recording machinery build on top of this crate in
//! `assembly-calculus`.

pub mod error;
pub mod fire;
pub mod graph;
pub mod node;

pub use error::{GraphError, Result};
pub use fire::{fire_many, fire_preserving, identify};
pub use graph::AssemblyGraph;
pub use node::{AssemblyId, AssemblyNode, Projectable};
