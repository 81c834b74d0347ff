//! Recording (part of C9): an ordered sequence of deferred assembly-algebra
//! calls, captured while a [`crate::recipe::Recipe`] scope is active, and
//! replayable against any freshly baked brain.
//!
//! Each recordable call is a concrete enum variant rather than a
//! `(function, args, kwargs)` tuple, so replay is a plain match over typed
//! data instead of dynamic dispatch.

use crate::error::Result;
use crate::ops;
use assembly_core::{Brain, PartId};
use assembly_graph::{AssemblyGraph, AssemblyId};
use std::cell::RefCell;

/// One deferred `project`/`reciprocal_project`/`merge`/`associate` call,
/// captured with its arguments by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Project { assembly: AssemblyId, dest: PartId },
    ReciprocalProject { assembly: AssemblyId, dest: PartId },
    Merge { parents: Vec<AssemblyId>, dest: PartId },
    Associate { a: Vec<AssemblyId>, b: Vec<AssemblyId> },
}

/// Ordered, append-only list of recorded calls. Interior mutability so it
/// can be entered as `&Recording` via [`crate::context::enter_recording`],
/// mirroring `assembly_core::Brain`'s `RefCell`-backed scoped-resource
/// pattern.
#[derive(Debug, Default)]
pub struct Recording {
    actions: RefCell<Vec<RecordedCall>>,
}

impl Recording {
    pub fn new() -> Self {
        Recording { actions: RefCell::new(Vec::new()) }
    }

    pub fn append(&self, call: RecordedCall) {
        self.actions.borrow_mut().push(call);
    }

    pub fn len(&self) -> usize {
        self.actions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn actions(&self) -> Vec<RecordedCall> {
        self.actions.borrow().clone()
    }

    /// Replay every recorded call against `brain`, in order, each run with
    /// `repeat` rounds (overriding whatever repeat was ambient when the
    /// call was first recorded — this is how `bake` trains at
    /// `train_repeat` regardless of how the recipe was originally built).
    ///
    /// Calls are replayed through the same `assembly-calculus` entry points
    /// used for live execution (`ops::project_repeat` and friends), with
    /// `brain`'s scope entered for the duration, so replay reproduces
    /// exactly the in-brain effects a live call under that scope would
    /// have had.
    pub fn play(&self, graph: &AssemblyGraph, brain: &Brain, repeat: usize) -> Result<()> {
        let scope = brain.enter();
        let outcome = (|| -> Result<()> {
            for call in self.actions() {
                match call {
                    RecordedCall::Project { assembly, dest } => {
                        ops::project_repeat(graph, assembly, dest, repeat)?;
                    }
                    RecordedCall::ReciprocalProject { assembly, dest } => {
                        ops::reciprocal_project_repeat(graph, assembly, dest, repeat)?;
                    }
                    RecordedCall::Merge { parents, dest } => {
                        ops::merge_repeat(graph, &parents, dest, repeat)?;
                    }
                    RecordedCall::Associate { a, b } => {
                        ops::associate_repeat(graph, &a, &b, repeat)?;
                    }
                }
            }
            Ok(())
        })();
        scope.exit()?;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_recording_plays_as_a_noop() {
        let brain = Brain::new(0.1, Some(1)).unwrap();
        let graph = AssemblyGraph::new();
        let recording = Recording::new();
        recording.play(&graph, &brain, 1).unwrap();
        assert_eq!(recording.len(), 0);
    }

    #[test]
    fn append_and_len() {
        let recording = Recording::new();
        assert!(recording.is_empty());
        let dummy_dest: PartId = uuid::Uuid::new_v4();
        let dummy_assembly: AssemblyId = AssemblyGraph::new().get_or_insert(uuid::Uuid::new_v4(), vec![]);
        recording.append(RecordedCall::Project { assembly: dummy_assembly, dest: dummy_dest });
        assert_eq!(recording.len(), 1);
    }
}
