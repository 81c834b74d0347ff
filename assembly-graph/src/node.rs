//! DAG node types: [`Projectable`] (a stimulus or an assembly) and the
//! [`AssemblyNode`] payload stored at each arena entry.

use assembly_core::PartId;
use petgraph::graph::NodeIndex;

/// Stable handle to an assembly stored in an [`crate::graph::AssemblyGraph`].
/// An arena index, not an owning reference: cheap to copy, carries no
/// lifetime, and stays valid for the graph's lifetime (assemblies are never
/// removed once created).
pub type AssemblyId = NodeIndex<u32>;

/// Something that can be fired into an area: either a stimulus (identified
/// by its brain-part id) or another assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Projectable {
    Stimulus(PartId),
    Assembly(AssemblyId),
}

impl Projectable {
    pub fn is_assembly(&self) -> bool {
        matches!(self, Projectable::Assembly(_))
    }

    pub fn as_assembly(&self) -> Option<AssemblyId> {
        match self {
            Projectable::Assembly(id) => Some(*id),
            Projectable::Stimulus(_) => None,
        }
    }
}

impl From<PartId> for Projectable {
    fn from(stimulus: PartId) -> Self {
        Projectable::Stimulus(stimulus)
    }
}

impl From<AssemblyId> for Projectable {
    fn from(assembly: AssemblyId) -> Self {
        Projectable::Assembly(assembly)
    }
}

/// A node in the persistent assembly DAG: an ordered tuple of parents and
/// the destination area they were (or would be) fired into.
///
/// Identity is a hash of `(area, sorted parent ids)`, computed by
/// [`crate::graph::AssemblyGraph::get_or_insert`]; `parents` here keeps the
/// caller's original order since the assembly algebra's tuple builder
/// (`a + b`) distinguishes construction order from identity.
#[derive(Debug, Clone)]
pub struct AssemblyNode {
    pub area: PartId,
    pub parents: Vec<Projectable>,
}
