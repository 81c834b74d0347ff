//! Fire protocol (C7): a topological, layer-by-layer walk over the assembly
//! DAG that stages ancestor projections into the brain before an operation
//! reads or builds on top of their result.
//!
//! Implemented as an explicit layer stack (an iterative
//! build-top-down-then-fire-bottom-up walk) rather than recursion, so stack
//! depth is bounded by DAG depth rather than call depth.

use crate::error::Result;
use crate::graph::AssemblyGraph;
use crate::node::{AssemblyId, Projectable};
use assembly_core::{Brain, PartId};
use std::collections::{HashMap, HashSet};

/// One level of the walk: each projectable maps to the areas it must be
/// fired into during this layer.
type Layer = HashMap<Projectable, Vec<PartId>>;

/// Build the layer stack, bottom layer first (the caller's `projectables`,
/// targeting `target_area`), then each successive layer mapping the
/// previous layer's assemblies' parents to the area the assembly itself
/// lives in. Stops once a layer contains only stimuli.
fn build_layers(graph: &AssemblyGraph, projectables: &[Projectable], target_area: PartId) -> Result<Vec<Layer>> {
    let mut layers: Vec<Layer> = Vec::new();
    let mut bottom: Layer = HashMap::new();
    for &p in projectables {
        bottom.entry(p).or_default().push(target_area);
    }
    layers.push(bottom);

    loop {
        let current = layers.last().expect("just pushed");
        if !current.keys().any(Projectable::is_assembly) {
            break;
        }

        let mut next: Layer = HashMap::new();
        for proj in current.keys() {
            if let Projectable::Assembly(id) = proj {
                let node = graph.node(*id)?;
                for &parent in &node.parents {
                    next.entry(parent).or_default().push(node.area);
                }
            }
        }
        layers.push(next);
    }

    layers.reverse();
    Ok(layers)
}

/// Enable every edge in `layer`, run one round (`repeat` times), disable
/// the edges again. Distinct areas targeted by the same source are
/// deduplicated before enabling (the brain's active edge set is a set, but
/// this avoids redundant `enable` calls when several assemblies in the same
/// layer share a parent fired into the same area).
fn fire_layer(brain: &Brain, graph: &AssemblyGraph, layer: &Layer, repeat: usize) -> Result<()> {
    let mut enabled: Vec<(PartId, PartId)> = Vec::new();
    for (proj, areas) in layer {
        let source = match proj {
            Projectable::Stimulus(id) => *id,
            Projectable::Assembly(id) => graph.area_of(*id)?,
        };
        let mut seen = HashSet::new();
        for &area in areas {
            if seen.insert(area) {
                brain.enable(source, Some(area))?;
                enabled.push((source, area));
            }
        }
    }

    log::debug!("fire layer: {} edge(s), {} round(s)", enabled.len(), repeat);
    brain.next_round(None, false, repeat)?;

    for (source, area) in enabled {
        brain.disable(source, Some(area))?;
    }
    Ok(())
}

/// Fire `projectables` into `target_area`, replaying every ancestor
/// projection layer-by-layer first. Mutates the brain permanently (winners
/// and plasticity updates persist after the call returns).
pub fn fire_many(brain: &Brain, graph: &AssemblyGraph, projectables: &[Projectable], target_area: PartId, repeat: usize) -> Result<()> {
    let layers = build_layers(graph, projectables, target_area)?;
    log::debug!("fire_many: {} layer(s) into target area", layers.len());
    for layer in &layers {
        fire_layer(brain, graph, layer, repeat)?;
    }
    Ok(())
}

/// Like [`fire_many`], but non-destructive: snapshots every area the walk
/// would write to, disables plasticity for the walk's duration, fires, then
/// restores both. Returns the winners `target_area` would have produced.
///
/// Snapshots are taken once (before the walk starts) over every area
/// touched across all layers; since areas are independent keys in the
/// snapshot map, restoring them in any order is equivalent to restoring
/// "in reverse layer order" as long as each area's *pre-walk* value (not an
/// intermediate one) is what gets reinstated, which is what capturing the
/// snapshot up front already guarantees.
pub fn fire_preserving(brain: &Brain, graph: &AssemblyGraph, projectables: &[Projectable], target_area: PartId, repeat: usize) -> Result<Vec<usize>> {
    let layers = build_layers(graph, projectables, target_area)?;

    let touched: Vec<PartId> = layers
        .iter()
        .flat_map(|layer| layer.values().flatten().copied())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let snapshot = brain.snapshot_winners(&touched);
    let was_plastic = brain.plasticity_status();
    brain.disable_plasticity();

    let outcome = (|| -> Result<Vec<usize>> {
        for layer in &layers {
            fire_layer(brain, graph, layer, repeat)?;
        }
        Ok(brain.winners(target_area))
    })();

    brain.restore_winners(&snapshot);
    if was_plastic {
        brain.enable_plasticity();
    } else {
        brain.disable_plasticity();
    }

    outcome
}

/// Convenience: fire a single assembly's own ancestry (its identification)
/// without the caller needing to build a `Projectable` slice by hand.
pub fn identify(brain: &Brain, graph: &AssemblyGraph, assembly: AssemblyId, repeat: usize) -> Result<Vec<usize>> {
    let node = graph.node(assembly)?;
    fire_preserving(brain, graph, &node.parents, node.area, repeat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assembly_core::{Area, Stimulus};

    #[test]
    fn depth_zero_fire_is_a_single_layer() {
        let brain = Brain::new(0.2, Some(1)).unwrap();
        let graph = AssemblyGraph::new();
        let stim = brain.add_stimulus(Stimulus::new(50, 0.1).unwrap());
        let area = brain.add_area(Area::new(200, 16, 0.1).unwrap());

        fire_many(&brain, &graph, &[Projectable::Stimulus(stim)], area, 1).unwrap();
        assert_eq!(brain.winners(area).len(), 16);
    }

    #[test]
    fn fire_preserving_restores_original_winners() {
        let brain = Brain::new(0.2, Some(1)).unwrap();
        let graph = AssemblyGraph::new();
        let stim_a = brain.add_stimulus(Stimulus::new(50, 0.1).unwrap());
        let stim_b = brain.add_stimulus(Stimulus::new(50, 0.1).unwrap());
        let area = brain.add_area(Area::new(200, 16, 0.1).unwrap());

        fire_many(&brain, &graph, &[Projectable::Stimulus(stim_a)], area, 1).unwrap();
        let before = brain.winners(area);
        let was_plastic = brain.plasticity_status();

        let identified = fire_preserving(&brain, &graph, &[Projectable::Stimulus(stim_b)], area, 1).unwrap();
        assert_eq!(identified.len(), 16);
        assert_eq!(brain.winners(area), before, "preserving fire must not leak into committed winners");
        assert_eq!(brain.plasticity_status(), was_plastic, "plasticity flag must be restored");
    }

    #[test]
    fn fire_preserving_clears_an_area_that_had_no_winners_before_the_walk() {
        let brain = Brain::new(0.2, Some(1)).unwrap();
        let graph = AssemblyGraph::new();
        let stim = brain.add_stimulus(Stimulus::new(50, 0.1).unwrap());
        let a1 = brain.add_area(Area::new(200, 16, 0.1).unwrap());
        let a2 = brain.add_area(Area::new(200, 16, 0.1).unwrap());

        // a1 never fired before this preserving walk: it has no winners
        // entry at all, not just an empty one.
        assert!(brain.winners(a1).is_empty());

        let assembly = graph.get_or_insert(a1, vec![Projectable::Stimulus(stim)]);
        fire_preserving(&brain, &graph, &[Projectable::Assembly(assembly)], a2, 1).unwrap();

        assert!(
            brain.winners(a1).is_empty(),
            "a1 had no winners before the walk; preserving fire must leave it untouched afterward"
        );
    }

    #[test]
    fn two_layer_fire_projects_through_an_intermediate_assembly() {
        let brain = Brain::new(0.2, Some(1)).unwrap();
        let graph = AssemblyGraph::new();
        let stim = brain.add_stimulus(Stimulus::new(50, 0.1).unwrap());
        let a1 = brain.add_area(Area::new(200, 16, 0.1).unwrap());
        let a2 = brain.add_area(Area::new(200, 16, 0.1).unwrap());

        let assembly = graph.get_or_insert(a1, vec![Projectable::Stimulus(stim)]);
        fire_many(&brain, &graph, &[Projectable::Assembly(assembly)], a2, 1).unwrap();

        assert_eq!(brain.winners(a1).len(), 16, "layer 0 must have populated the intermediate area");
        assert_eq!(brain.winners(a2).len(), 16);
    }
}
