//! Assembly operations (C8): `project`, `reciprocal_project`, `merge`,
//! `associate`, and `read`/`read_scored` on top of the connectome engine
//! (`assembly-core`) and the fire protocol (`assembly-graph`).
//!
//! Every operation is pure when no brain is bound (it only touches the
//! [`AssemblyGraph`] arena) and additionally performs its in-brain effect
//! when a brain is bound via [`assembly_core::with_current_brain`]
//! (entered by `Brain::enter`, or implicitly during [`crate::recording::Recording::play`]).
//! `project`/`reciprocal_project`/`merge`/`associate` also append themselves
//! to the current recording (if any) via [`crate::context::with_current_recording`],
//! so a recipe built under `recipe.enter()` can be replayed later against a
//! freshly baked brain (`bake`, in `crate::recipe`).

use crate::context::with_current_recording;
use crate::error::{CalculusError, Result};
use crate::recording::RecordedCall;
use assembly_core::{with_current_brain, Brain, PartId};
use assembly_graph::{identify, AssemblyGraph, AssemblyId, Projectable};

/// Default confidence threshold for [`read`]: the minimum
/// `|current ∩ identified| / area.k` overlap a candidate must clear. Loose
/// enough to admit a single well-stabilized candidate while still rejecting
/// candidates that share only incidental overlap with the current winners.
pub const DEFAULT_READ_THRESHOLD: f64 = 0.1;

fn record_if_active(call: RecordedCall) {
    with_current_recording(|recording| {
        if let Some(recording) = recording {
            recording.append(call);
        }
    });
}

fn ambient_repeat() -> usize {
    with_current_brain(|brain| brain.map(|b| b.default_repeat()).unwrap_or(1))
}

/// In-brain effect of `project(a, d)`: identify `a` (a preserving fire of
/// its own ancestry), commit that as `a.area`'s winners, then fire the
/// single edge `a.area -> dest` for `repeat` rounds.
fn project_apply(brain: &Brain, graph: &AssemblyGraph, assembly: AssemblyId, dest: PartId, repeat: usize) -> Result<()> {
    let identified = identify(brain, graph, assembly, repeat)?;
    let area = graph.area_of(assembly)?;
    brain.set_winners(area, identified)?;
    brain.enable(area, Some(dest))?;
    brain.next_round(None, false, repeat)?;
    brain.disable(area, Some(dest))?;
    Ok(())
}

/// `project(a, d)` with an explicit repeat count. Always builds (or
/// dedup-resolves) the resulting node; performs the in-brain effect only if
/// a brain is currently bound.
pub fn project_repeat(graph: &AssemblyGraph, assembly: AssemblyId, dest: PartId, repeat: usize) -> Result<AssemblyId> {
    record_if_active(RecordedCall::Project { assembly, dest });
    with_current_brain(|brain| -> Result<()> {
        if let Some(brain) = brain {
            project_apply(brain, graph, assembly, dest, repeat)?;
        }
        Ok(())
    })?;
    Ok(graph.get_or_insert(dest, vec![Projectable::Assembly(assembly)]))
}

/// `project(a, d)` using the bound brain's default repeat count (1 if no
/// brain is bound).
pub fn project(graph: &AssemblyGraph, assembly: AssemblyId, dest: PartId) -> Result<AssemblyId> {
    project_repeat(graph, assembly, dest, ambient_repeat())
}

/// `reciprocal_project(a, d)`: `project(a, d)`, then back-project the
/// result into `a`'s own area to strengthen `d -> a.area` edges. Returns the
/// forward assembly (the same node `project(a, d)` would have returned).
pub fn reciprocal_project_repeat(graph: &AssemblyGraph, assembly: AssemblyId, dest: PartId, repeat: usize) -> Result<AssemblyId> {
    record_if_active(RecordedCall::ReciprocalProject { assembly, dest });
    let source_area = graph.area_of(assembly)?;
    let forward = graph.get_or_insert(dest, vec![Projectable::Assembly(assembly)]);

    with_current_brain(|brain| -> Result<()> {
        if let Some(brain) = brain {
            project_apply(brain, graph, assembly, dest, repeat)?;
            project_apply(brain, graph, forward, source_area, repeat)?;
        }
        Ok(())
    })?;
    Ok(forward)
}

pub fn reciprocal_project(graph: &AssemblyGraph, assembly: AssemblyId, dest: PartId) -> Result<AssemblyId> {
    reciprocal_project_repeat(graph, assembly, dest, ambient_repeat())
}

/// In-brain effect of `merge`: identify every parent, commit each as its
/// area's winners, then fire all parent areas into `dest` in one round so
/// they land simultaneously.
fn merge_apply(brain: &Brain, graph: &AssemblyGraph, parents: &[AssemblyId], dest: PartId, repeat: usize) -> Result<()> {
    for &parent in parents {
        let identified = identify(brain, graph, parent, repeat)?;
        let area = graph.area_of(parent)?;
        brain.set_winners(area, identified)?;
    }

    let mut enabled = Vec::with_capacity(parents.len());
    for &parent in parents {
        let area = graph.area_of(parent)?;
        brain.enable(area, Some(dest))?;
        enabled.push(area);
    }
    brain.next_round(None, false, repeat)?;
    for area in enabled {
        brain.disable(area, Some(dest))?;
    }
    Ok(())
}

/// `merge(assemblies, d)` with an explicit repeat count. Fails with
/// `InvalidParameter` on an empty parent list.
pub fn merge_repeat(graph: &AssemblyGraph, parents: &[AssemblyId], dest: PartId, repeat: usize) -> Result<AssemblyId> {
    if parents.is_empty() {
        return Err(CalculusError::InvalidParameter {
            parameter: "parents".into(),
            reason: "merge requires at least one parent assembly".into(),
        });
    }
    record_if_active(RecordedCall::Merge { parents: parents.to_vec(), dest });
    with_current_brain(|brain| -> Result<()> {
        if let Some(brain) = brain {
            merge_apply(brain, graph, parents, dest, repeat)?;
        }
        Ok(())
    })?;
    let parent_projs = parents.iter().map(|&p| Projectable::Assembly(p)).collect();
    Ok(graph.get_or_insert(dest, parent_projs))
}

pub fn merge(graph: &AssemblyGraph, parents: &[AssemblyId], dest: PartId) -> Result<AssemblyId> {
    merge_repeat(graph, parents, dest, ambient_repeat())
}

/// `associate(A, B)`: for every `(x, y) ∈ A x B`, merge `(x, y)` into `x`'s
/// area. No return value; the effect is strengthened co-activation between
/// every pair. Fails with `AreaMismatch` if some pair's assemblies don't
/// share an area.
pub fn associate_repeat(graph: &AssemblyGraph, a: &[AssemblyId], b: &[AssemblyId], repeat: usize) -> Result<()> {
    record_if_active(RecordedCall::Associate { a: a.to_vec(), b: b.to_vec() });

    for &x in a {
        for &y in b {
            let area_x = graph.area_of(x)?;
            let area_y = graph.area_of(y)?;
            if area_x != area_y {
                return Err(CalculusError::AreaMismatch);
            }
            with_current_brain(|brain| -> Result<()> {
                if let Some(brain) = brain {
                    merge_apply(brain, graph, &[x, y], area_x, repeat)?;
                }
                Ok(())
            })?;
            // merge's pure effect: materialize the (x, y) -> area_x node
            // even with no brain bound, mirroring `merge`'s own contract.
            graph.get_or_insert(area_x, vec![Projectable::Assembly(x), Projectable::Assembly(y)]);
        }
    }
    Ok(())
}

pub fn associate(graph: &AssemblyGraph, a: &[AssemblyId], b: &[AssemblyId]) -> Result<()> {
    associate_repeat(graph, a, b, ambient_repeat())
}

/// Every candidate's overlap score against `area`'s current winners:
/// `|current ∩ identified| / area.k`, where `identified` is a preserving
/// fire of the candidate's own ancestry into `area`. Ranked descending.
pub fn read_scored(brain: &Brain, graph: &AssemblyGraph, candidates: &[AssemblyId], area: PartId, repeat: usize) -> Result<Vec<(AssemblyId, f64)>> {
    let current: std::collections::HashSet<usize> = brain.winners(area).into_iter().collect();
    let k = brain.part_k(area).map(|k| k.max(1)).unwrap_or(1);

    let mut scores = Vec::with_capacity(candidates.len());
    for &candidate in candidates {
        let identified = identify(brain, graph, candidate, repeat)?;
        let overlap = identified.iter().filter(|n| current.contains(n)).count();
        scores.push((candidate, overlap as f64 / k as f64));
    }
    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    Ok(scores)
}

/// Among `candidates` (the assemblies the recipe says live in `area`),
/// return the one whose identification has the highest overlap with
/// `area`'s current winners, provided it clears `threshold`. Otherwise
/// `ReadBelowThreshold`.
pub fn read(brain: &Brain, graph: &AssemblyGraph, candidates: &[AssemblyId], area: PartId, repeat: usize, threshold: f64) -> Result<AssemblyId> {
    let scores = read_scored(brain, graph, candidates, area, repeat)?;
    match scores.first() {
        Some(&(best, score)) if score >= threshold => Ok(best),
        _ => Err(CalculusError::ReadBelowThreshold),
    }
}
