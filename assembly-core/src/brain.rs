//! Brain (C5): owns the connection store, the active edge set, and the
//! winners/support maps; orchestrates rounds and the scoped binding
//! context.
//!
//! Mutable state lives behind a single [`RefCell`] so a brain can be
//! entered as a shared, scoped resource (`&Brain`) while its rounds still
//! mutate weights and winners. This also means a `Brain` is `!Sync`: it
//! cannot be shared across threads while a scope is open.

use crate::connection::ConnectionStore;
use crate::context::BrainScope;
use crate::engine::{run_round, RoundInputs};
use crate::error::{CoreError, Result};
use crate::parts::{Area, BrainPart, PartId, Stimulus};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

struct BrainInner {
    parts: HashMap<PartId, BrainPart>,
    store: ConnectionStore,
    winners: HashMap<PartId, Vec<usize>>,
    support: HashMap<PartId, HashSet<usize>>,
    /// `source -> destinations`, the user-facing "disinhibited" edge set.
    active_edges: HashMap<PartId, HashSet<PartId>>,
    plasticity_enabled: bool,
}

pub struct Brain {
    p: f64,
    seed: Option<u64>,
    inner: RefCell<BrainInner>,
    /// Default number of rounds ("repeat", glossary term `R`) a high-level
    /// assembly operation runs when it isn't given an explicit count.
    /// `bake` sets this to `train_repeat` while replaying a recipe's
    /// recording, then to `effective_repeat` for subsequent use.
    default_repeat: Cell<usize>,
}

impl Brain {
    pub fn new(p: f64, seed: Option<u64>) -> Result<Self> {
        if !(0.0..=1.0).contains(&p) {
            return Err(CoreError::InvalidParameter { parameter: "p".into(), reason: "must lie in [0, 1]".into() });
        }
        Ok(Brain {
            p,
            seed,
            inner: RefCell::new(BrainInner {
                parts: HashMap::new(),
                store: ConnectionStore::new(p, seed),
                winners: HashMap::new(),
                support: HashMap::new(),
                active_edges: HashMap::new(),
                plasticity_enabled: true,
            }),
            default_repeat: Cell::new(1),
        })
    }

    pub fn p(&self) -> f64 {
        self.p
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Register an already-constructed area with this brain.
    pub fn add_area(&self, area: Area) -> PartId {
        let id = area.id();
        self.inner.borrow_mut().parts.insert(id, BrainPart::Area(area));
        id
    }

    /// Register an already-constructed stimulus with this brain.
    pub fn add_stimulus(&self, stimulus: Stimulus) -> PartId {
        let id = stimulus.id();
        self.inner.borrow_mut().parts.insert(id, BrainPart::Stimulus(stimulus));
        id
    }

    pub fn has_part(&self, id: PartId) -> bool {
        self.inner.borrow().parts.contains_key(&id)
    }

    pub fn part_n(&self, id: PartId) -> Option<usize> {
        self.inner.borrow().parts.get(&id).map(|p| p.n())
    }

    /// `None` if `id` is unknown or names a stimulus (stimuli have no `k`).
    pub fn part_k(&self, id: PartId) -> Option<usize> {
        self.inner.borrow().parts.get(&id).and_then(|p| p.as_area()).map(|a| a.k)
    }

    fn area_ids(inner: &BrainInner) -> Vec<PartId> {
        inner.parts.values().filter(|p| p.is_area()).map(|p| p.id()).collect()
    }

    /// Disinhibit `source -> dest`. `dest = None` broadcasts to every area
    /// currently known to the brain.
    pub fn enable(&self, source: PartId, dest: Option<PartId>) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if !inner.parts.contains_key(&source) {
            return Err(CoreError::UnknownPart { context: "enable source".into() });
        }
        match dest {
            Some(d) => {
                if !inner.parts.get(&d).map(|p| p.is_area()).unwrap_or(false) {
                    return Err(CoreError::UnknownPart { context: "enable destination".into() });
                }
                inner.active_edges.entry(source).or_default().insert(d);
            }
            None => {
                let areas = Self::area_ids(&inner);
                inner.active_edges.entry(source).or_default().extend(areas);
            }
        }
        Ok(())
    }

    /// Inhibit `source -> dest`. `dest = None` removes every outgoing edge
    /// from `source`.
    pub fn disable(&self, source: PartId, dest: Option<PartId>) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        match dest {
            Some(d) => {
                if let Some(set) = inner.active_edges.get_mut(&source) {
                    set.remove(&d);
                }
            }
            None => {
                inner.active_edges.remove(&source);
            }
        }
        Ok(())
    }

    pub fn active_edges(&self) -> HashMap<PartId, HashSet<PartId>> {
        self.inner.borrow().active_edges.clone()
    }

    pub fn winners(&self, area: PartId) -> Vec<usize> {
        self.inner.borrow().winners.get(&area).cloned().unwrap_or_default()
    }

    pub fn support(&self, area: PartId) -> HashSet<usize> {
        self.inner.borrow().support.get(&area).cloned().unwrap_or_default()
    }

    /// Force an area's winners directly (used by `merge`'s in-brain effect,
    /// which sets each parent's area winners to its identified neuron set
    /// before firing).
    pub fn set_winners(&self, area: PartId, winners: Vec<usize>) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let n = inner
            .parts
            .get(&area)
            .and_then(|p| p.as_area())
            .map(|a| a.n)
            .ok_or_else(|| CoreError::UnknownPart { context: "set_winners".into() })?;
        for &w in &winners {
            if w >= n {
                return Err(CoreError::DimensionMismatch { index: w, n });
            }
        }
        inner.support.entry(area).or_default().extend(winners.iter().copied());
        inner.winners.insert(area, winners);
        Ok(())
    }

    pub fn enable_plasticity(&self) {
        self.inner.borrow_mut().plasticity_enabled = true;
    }

    pub fn disable_plasticity(&self) {
        self.inner.borrow_mut().plasticity_enabled = false;
    }

    pub fn plasticity_status(&self) -> bool {
        self.inner.borrow().plasticity_enabled
    }

    pub fn disable_lazy_init(&self) {
        self.inner.borrow_mut().store.disable_lazy_init();
    }

    pub fn enable_lazy_init(&self) {
        self.inner.borrow_mut().store.enable_lazy_init();
    }

    /// One or more rounds.
    ///
    /// `replace = true`, or `subconnectome.is_none()`: use
    /// `subconnectome ?? active_edges` directly. Otherwise union
    /// `active_edges` with `subconnectome` for this call only.
    pub fn next_round(
        &self,
        subconnectome: Option<&HashMap<PartId, HashSet<PartId>>>,
        replace: bool,
        iterations: usize,
    ) -> Result<()> {
        let mut inner = self.inner.borrow_mut();

        let effective: HashMap<PartId, HashSet<PartId>> = match (subconnectome, replace) {
            (Some(sub), true) => sub.clone(),
            (None, _) => inner.active_edges.clone(),
            (Some(sub), false) => {
                let mut merged = inner.active_edges.clone();
                for (src, dsts) in sub {
                    merged.entry(*src).or_default().extend(dsts.iter().copied());
                }
                merged
            }
        };

        let mut dst_to_sources: HashMap<PartId, Vec<PartId>> = HashMap::new();
        for (src, dsts) in &effective {
            for dst in dsts {
                dst_to_sources.entry(*dst).or_default().push(*src);
            }
        }

        for _ in 0..iterations {
            let BrainInner { parts, store, winners, support, plasticity_enabled, .. } = &mut *inner;
            let mut round_inputs =
                RoundInputs { parts, store, winners, support, plasticity_enabled: *plasticity_enabled };
            run_round(&mut round_inputs, &dst_to_sources)?;
        }

        Ok(())
    }

    /// Enter this brain's binding scope: while the returned guard is
    /// alive, [`crate::context::with_current_brain`] resolves to this
    /// brain.
    pub fn enter(&self) -> BrainScope<'_> {
        BrainScope::new(self)
    }

    /// Snapshot of the given areas' current winners (fire protocol's
    /// preserve-brain mode). Every requested area is recorded explicitly,
    /// `None` meaning it had no winners entry yet, so `restore_winners` can
    /// tell "was empty" apart from "was never touched".
    pub fn snapshot_winners(&self, areas: &[PartId]) -> HashMap<PartId, Option<Vec<usize>>> {
        let inner = self.inner.borrow();
        areas.iter().map(|a| (*a, inner.winners.get(a).cloned())).collect()
    }

    /// Reinstate a snapshot taken by [`Brain::snapshot_winners`]: areas
    /// recorded with winners get them back, areas recorded as empty are
    /// cleared (undoing any winners a fire committed in between).
    pub fn restore_winners(&self, snapshot: &HashMap<PartId, Option<Vec<usize>>>) {
        let mut inner = self.inner.borrow_mut();
        for (area, winners) in snapshot {
            match winners {
                Some(w) => {
                    inner.winners.insert(*area, w.clone());
                }
                None => {
                    inner.winners.remove(area);
                }
            }
        }
    }

    /// The repeat count ("R") a high-level operation uses when it isn't
    /// given an explicit one.
    pub fn default_repeat(&self) -> usize {
        self.default_repeat.get()
    }

    pub fn set_default_repeat(&self, repeat: usize) {
        self.default_repeat.set(repeat);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_p() {
        assert!(Brain::new(1.5, Some(1)).is_err());
        assert!(Brain::new(-0.1, Some(1)).is_err());
    }

    #[test]
    fn plasticity_monotonicity_two_neuron_example() {
        // n=2, k=1, beta=0.1, p=0: a single pinned stimulus->area edge, two
        // rounds, checks the winning weight grows by exactly (1+beta)^2.
        let brain = Brain::new(0.0, Some(1)).unwrap();
        let stim = Stimulus::new(2, 0.0).unwrap();
        let area = Area::new(2, 1, 0.1).unwrap();
        let stim_id = brain.add_stimulus(stim);
        let area_id = brain.add_area(area);

        brain.disable_lazy_init();
        let weights = ndarray::array![[1.0f32, 0.0], [0.0, 0.0]];
        {
            let mut inner = brain.inner.borrow_mut();
            inner.store.insert(stim_id, area_id, crate::connection::Connection::new(weights));
        }

        brain.enable(stim_id, Some(area_id)).unwrap();
        brain.next_round(None, false, 1).unwrap();
        brain.next_round(None, false, 1).unwrap();

        let conn = brain.inner.borrow();
        let w = conn.store.get(stim_id, area_id).unwrap();
        approx::assert_relative_eq!(w.weights[[0, 0]], 1.0 * 1.1f32.powi(2), epsilon = 1e-5);
        assert_eq!(w.weights[[0, 1]], 0.0);
        assert_eq!(w.weights[[1, 0]], 0.0);
        assert_eq!(w.weights[[1, 1]], 0.0);
    }

    #[test]
    fn empty_active_edges_is_a_noop() {
        let brain = Brain::new(0.1, Some(1)).unwrap();
        let area = Area::new(100, 10, 0.05).unwrap();
        let area_id = brain.add_area(area);
        brain.next_round(None, false, 3).unwrap();
        assert!(brain.winners(area_id).is_empty());
    }

    #[test]
    fn k_equals_n_every_round_wins_everyone() {
        let brain = Brain::new(0.3, Some(1)).unwrap();
        let stim = Stimulus::new(20, 0.05).unwrap();
        let area = Area::new(10, 10, 0.05).unwrap();
        let stim_id = brain.add_stimulus(stim);
        let area_id = brain.add_area(area);
        brain.enable(stim_id, Some(area_id)).unwrap();
        brain.next_round(None, false, 1).unwrap();
        let mut winners = brain.winners(area_id);
        winners.sort_unstable();
        assert_eq!(winners, (0..10).collect::<Vec<_>>());
    }
}

#[cfg(test)]
mod plasticity_properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// The weight-monotonicity invariant, generalized from the pinned
        /// two-neuron example to arbitrary `(n, k, beta)`: starting from a
        /// uniform weight matrix, one round under plasticity can only grow
        /// weights feeding a winning destination neuron, by exactly
        /// `1 + beta`, and must leave every other weight untouched.
        #[test]
        fn one_round_grows_only_winning_columns(
            stim_n in 1usize..8,
            area_n in 1usize..12,
            k in 1usize..12,
            beta in 0.0f32..1.0,
        ) {
            let k = k.min(area_n);
            let brain = Brain::new(0.0, Some(1)).unwrap();
            let stim = Stimulus::new(stim_n, 0.0).unwrap();
            let area = Area::new(area_n, k, beta).unwrap();
            let stim_id = brain.add_stimulus(stim);
            let area_id = brain.add_area(area);

            brain.disable_lazy_init();
            let weights = ndarray::Array2::<f32>::ones((stim_n, area_n));
            {
                let mut inner = brain.inner.borrow_mut();
                inner.store.insert(stim_id, area_id, crate::connection::Connection::new(weights));
            }

            brain.enable(stim_id, Some(area_id)).unwrap();
            brain.next_round(None, false, 1).unwrap();

            // Every column sums equally before the round, so ties are
            // broken by lower index: the winners are exactly columns
            // `0..k`.
            let conn = brain.inner.borrow();
            let w = &conn.store.get(stim_id, area_id).unwrap().weights;
            let factor = 1.0 + beta;
            for j in 0..area_n {
                let expected = if j < k { factor } else { 1.0 };
                for i in 0..stim_n {
                    prop_assert!(
                        (w[[i, j]] - expected).abs() < 1e-5,
                        "w[{i},{j}] = {} (expected {expected})", w[[i, j]]
                    );
                }
            }
        }
    }
}
