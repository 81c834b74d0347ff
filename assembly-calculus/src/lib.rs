//! Assembly calculus: Hebbian neural assemblies built on a sparse
//! connectome engine.
//!
//! This crate is the umbrella over the workspace's three lower layers:
//!
//! - `assembly-rng` — the reproducible, thread-partitioned Bernoulli(p)
//!   matrix kernel connection weights are drawn from (used transitively
//!   through `assembly-core`'s connection store, not referenced directly
//!   here).
//! - [`assembly_core`] — brain parts, the sparse connection store, the
//!   projection engine (one simulation round: inputs, top-k winners,
//!   plasticity), and the [`assembly_core::Brain`] that owns them.
//! - [`assembly_graph`] — the persistent, deduplicated assembly DAG and the
//!   layer-by-layer fire protocol that stages ancestor projections before
//!   an operation runs.
//!
//! This crate adds the algebra on top: [`ops::project`],
//! [`ops::reciprocal_project`], [`ops::merge`], [`ops::associate`],
//! [`ops::read`] and their `_repeat` variants; the `+`/`>>` operator sugar
//! in [`algebra`]; and [`recipe::Recipe`] / [`recording::Recording`] /
//! [`recipe::bake`] for declaring a population once and instantiating it
//! against any number of brains.
//!
//! A typical session binds a brain, a graph, and (while declaring a
//! recipe) a recording, then writes assembly expressions that resolve all
//! three implicitly:
//!
//! ```ignore
//! use assembly_calculus::prelude::*;
//!
//! let mut recipe = Recipe::new();
//! let stim = recipe.add_stimulus(Stimulus::new(100, 0.05)?);
//! let area = recipe.add_area(Area::new(1000, 32, 0.05)?);
//! let graph = AssemblyGraph::new();
//!
//! {
//!     let _graph_scope = enter_graph(&graph);
//!     let _recording_scope = recipe.enter();
//!     let seed: Assembly = graph.get_or_insert(area, vec![stim.into()]).into();
//!     recipe.add_assembly(area, seed.id());
//! }
//!
//! let brain = bake(&recipe, &graph, 0.05, Some(1), ConnectomeKind::Lazy, 20, 1)?;
//! # Ok::<(), assembly_calculus::CalculusError>(())
//! ```

pub mod algebra;
pub mod context;
pub mod error;
pub mod ops;
pub mod recipe;
pub mod recording;

pub use algebra::{Assembly, AssemblyTuple};
pub use context::{enter_graph, enter_recording, with_current_graph, with_current_recording, GraphScope, RecordingScope};
pub use error::{CalculusError, Result};
pub use ops::{
    associate, associate_repeat, merge, merge_repeat, project, project_repeat, read, read_scored,
    reciprocal_project, reciprocal_project_repeat, DEFAULT_READ_THRESHOLD,
};
pub use recipe::{bake, ConnectomeKind, Recipe};
pub use recording::{RecordedCall, Recording};

/// Re-exports enough of the workspace to write a recipe and bake it
/// without naming every crate by hand.
pub mod prelude {
    pub use crate::{
        associate, bake, enter_graph, enter_recording, merge, project, read, read_scored,
        reciprocal_project, Assembly, AssemblyTuple, CalculusError, ConnectomeKind, Recipe,
        Recording, Result,
    };
    pub use assembly_core::{Area, Brain, PartId, Stimulus};
    pub use assembly_graph::{AssemblyGraph, AssemblyId, Projectable};
}
