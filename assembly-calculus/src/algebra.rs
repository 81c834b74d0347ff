//! Syntactic sugar (`+` and `>>`) over assemblies.
//!
//! `a + b` builds an ordered tuple of assemblies, never projecting; `tuple
//! >> area` merges the tuple's members into `area`; `a >> area` projects a
//! single assembly into `area`. Both `>>` forms resolve the ambient graph
//! via [`crate::context::with_current_graph`] (and the ambient brain/
//! recording, transitively, through [`crate::ops`]).
//!
//! Operator traits return their own type, not a `Result`, so a missing
//! graph scope or an underlying operation failure panics with a message
//! naming the call that failed — the convenience these operators exist for
//! (writing `a >> b >> c` inline) is traded for losing `?`-propagation at
//! the call site. Callers who need fallible composition should use
//! [`crate::ops`] directly with an explicit [`AssemblyGraph`].

use crate::context::with_current_graph;
use crate::ops;
use assembly_core::PartId;
use assembly_graph::AssemblyId;
use std::ops::{Add, Shr};

fn current_graph_or_panic<F, R>(f: F) -> R
where
    F: FnOnce(&assembly_graph::AssemblyGraph) -> R,
{
    with_current_graph(|graph| match graph {
        Some(graph) => f(graph),
        None => panic!("assembly algebra used with no graph scope active (enter_graph was never called)"),
    })
}

/// A single assembly, wrapped for operator overloading. Transparent newtype
/// around the arena's [`AssemblyId`]; `Copy` since an `AssemblyId` is just
/// an arena index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Assembly(pub AssemblyId);

impl From<AssemblyId> for Assembly {
    fn from(id: AssemblyId) -> Self {
        Assembly(id)
    }
}

impl Assembly {
    pub fn id(self) -> AssemblyId {
        self.0
    }
}

/// An ordered, non-projecting tuple of assemblies, built by `+`. `tuple >>
/// area` merges its members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyTuple(pub Vec<AssemblyId>);

impl Add for Assembly {
    type Output = AssemblyTuple;
    fn add(self, rhs: Assembly) -> AssemblyTuple {
        AssemblyTuple(vec![self.0, rhs.0])
    }
}

impl Add<Assembly> for AssemblyTuple {
    type Output = AssemblyTuple;
    fn add(mut self, rhs: Assembly) -> AssemblyTuple {
        self.0.push(rhs.0);
        self
    }
}

/// `a >> area`: project.
impl Shr<PartId> for Assembly {
    type Output = Assembly;
    fn shr(self, dest: PartId) -> Assembly {
        current_graph_or_panic(|graph| {
            ops::project(graph, self.0, dest)
                .map(Assembly)
                .unwrap_or_else(|e| panic!("project failed: {e}"))
        })
    }
}

/// `tuple >> area`: merge.
impl Shr<PartId> for AssemblyTuple {
    type Output = Assembly;
    fn shr(self, dest: PartId) -> Assembly {
        current_graph_or_panic(|graph| {
            ops::merge(graph, &self.0, dest)
                .map(Assembly)
                .unwrap_or_else(|e| panic!("merge failed: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::enter_graph;
    use assembly_core::{Area, Brain, Stimulus};
    use assembly_graph::AssemblyGraph;

    #[test]
    fn plus_builds_a_tuple_without_projecting() {
        let graph = AssemblyGraph::new();
        let _scope = enter_graph(&graph);
        let area: PartId = uuid::Uuid::new_v4();
        let a: Assembly = graph.get_or_insert(area, vec![]).into();
        let b: Assembly = graph.get_or_insert(area, vec![assembly_graph::Projectable::Stimulus(uuid::Uuid::new_v4())]).into();
        let tuple = a + b;
        assert_eq!(tuple.0, vec![a.0, b.0]);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn shr_projects_and_merges_through_the_ambient_graph() {
        let brain = Brain::new(0.1, Some(3)).unwrap();
        let stim = Stimulus::new(50, 0.1).unwrap();
        let area_a = Area::new(200, 20, 0.1).unwrap();
        let area_b = Area::new(200, 20, 0.1).unwrap();
        let stim_id = brain.add_stimulus(stim);
        let area_a_id = brain.add_area(area_a);
        let area_b_id = brain.add_area(area_b);

        let graph = AssemblyGraph::new();
        let _graph_scope = enter_graph(&graph);
        let _brain_scope = brain.enter();

        let base: Assembly = graph.get_or_insert(area_a_id, vec![assembly_graph::Projectable::Stimulus(stim_id)]).into();
        let projected = base >> area_b_id;
        assert_eq!(graph.area_of(projected.0).unwrap(), area_b_id);
    }
}
