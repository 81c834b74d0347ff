//! Recipe & bake (C9): a declarative population + assembly container,
//! decoupled from any concrete brain, and the function that instantiates
//! one.
//!
//! A recipe holds sets of areas, stimuli, assemblies, plus a recording;
//! `bake` installs the parts into a fresh brain, replays the recording at a
//! training repeat count, then switches the brain's default repeat to an
//! effective one for subsequent live use.

use crate::context::enter_recording;
use crate::error::{CalculusError, Result};
use crate::recording::Recording;
use assembly_core::{Area, Brain, PartId, Stimulus};
use assembly_graph::{AssemblyGraph, AssemblyId};
use std::collections::{HashMap, HashSet};

/// Which connectome a baked brain should use: a lazily-initialized one
/// (edges materialize Bernoulli(p) weights on first access) or one with
/// lazy init disabled (every edge must be pre-populated, `MissingConnection`
/// otherwise).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectomeKind {
    Lazy,
    NonLazy,
}

impl Default for ConnectomeKind {
    fn default() -> Self {
        ConnectomeKind::Lazy
    }
}

/// Declarative population + assembly container. Built before any brain
/// exists; `bake` consumes it (by reference; a recipe is reusable across
/// many bakes) to produce a brain.
#[derive(Debug, Default)]
pub struct Recipe {
    areas: Vec<Area>,
    stimuli: Vec<Stimulus>,
    /// `area -> {assemblies}`, populated as assemblies are declared against
    /// it. Adding an assembly implicitly adds its area's id here even if
    /// the area was never separately registered with [`Recipe::add_area`].
    by_area: HashMap<PartId, HashSet<AssemblyId>>,
    recording: Recording,
}

impl Recipe {
    pub fn new() -> Self {
        Recipe::default()
    }

    /// Register an area with this recipe and return its id.
    pub fn add_area(&mut self, area: Area) -> PartId {
        let id = area.id();
        self.by_area.entry(id).or_default();
        self.areas.push(area);
        id
    }

    pub fn add_stimulus(&mut self, stimulus: Stimulus) -> PartId {
        let id = stimulus.id();
        self.stimuli.push(stimulus);
        id
    }

    /// Declare that `assembly` (already built in `graph`, in `area`) belongs
    /// to this recipe. Implicitly registers `area` if it wasn't already
    /// known.
    pub fn add_assembly(&mut self, area: PartId, assembly: AssemblyId) {
        self.by_area.entry(area).or_default().insert(assembly);
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn stimuli(&self) -> &[Stimulus] {
        &self.stimuli
    }

    /// Every assembly this recipe says lives in `area`, as a `Vec` suitable
    /// for [`crate::ops::read`]'s candidate list.
    pub fn assemblies_in(&self, area: PartId) -> Vec<AssemblyId> {
        self.by_area.get(&area).map(|set| set.iter().copied().collect()).unwrap_or_default()
    }

    /// This recipe's recording. Recordable operations append to it while
    /// the recipe's scope ([`Recipe::enter`]) is active.
    pub fn recording(&self) -> &Recording {
        &self.recording
    }

    /// Enter this recipe's recording scope: while the returned guard is
    /// alive, recordable assembly operations append to this recipe's
    /// recording instead of (or in addition to, if a brain is also bound)
    /// acting on a brain.
    pub fn enter(&self) -> crate::context::RecordingScope<'_> {
        enter_recording(&self.recording)
    }
}

/// Instantiate a brain from `recipe`: create it, install every declared
/// area and stimulus, replay the recipe's recording at `train_repeat`
/// rounds per recordable call, then leave `effective_repeat` as the brain's
/// default for subsequent live use. Lets a graph be trained up at a high
/// repeat count and used at a low one.
pub fn bake(
    recipe: &Recipe,
    graph: &AssemblyGraph,
    p: f64,
    seed: Option<u64>,
    connectome_kind: ConnectomeKind,
    train_repeat: usize,
    effective_repeat: usize,
) -> Result<Brain> {
    if train_repeat == 0 || effective_repeat == 0 {
        return Err(CalculusError::InvalidParameter {
            parameter: "repeat".into(),
            reason: "train_repeat and effective_repeat must both be >= 1".into(),
        });
    }

    let brain = Brain::new(p, seed)?;
    match connectome_kind {
        ConnectomeKind::Lazy => brain.enable_lazy_init(),
        ConnectomeKind::NonLazy => brain.disable_lazy_init(),
    }

    for area in recipe.areas() {
        brain.add_area(area.clone());
    }
    for stimulus in recipe.stimuli() {
        brain.add_stimulus(stimulus.clone());
    }

    recipe.recording().play(graph, &brain, train_repeat)?;
    brain.set_default_repeat(effective_repeat);
    Ok(brain)
}
