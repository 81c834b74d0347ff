//! Connection store (C3): sparse `(source, dest) -> weight matrix` map with
//! lazy Bernoulli(p) allocation.

use crate::error::{CoreError, Result};
use crate::parts::{BrainPart, PartId};
use assembly_rng::{generate, Layout};
use ndarray::Array2;
use std::collections::HashMap;

/// A directed edge's synaptic weight matrix, shape `source.n x dest.n`.
/// Entries are non-negative and only ever grow (plasticity is
/// multiplicative with no cap).
#[derive(Debug, Clone)]
pub struct Connection {
    pub weights: Array2<f32>,
}

impl Connection {
    pub fn new(weights: Array2<f32>) -> Self {
        Self { weights }
    }
}

/// Mixes the brain's master seed with an edge's endpoint identities so
/// that every edge gets its own reproducible-but-distinct initialization,
/// even when two edges happen to share the same `(height, width)`.
fn edge_seed(master_seed: Option<u64>, source: PartId, dest: PartId) -> Option<u64> {
    master_seed.map(|seed| {
        let mut h = seed;
        for &byte in source.as_bytes().iter().chain(dest.as_bytes().iter()) {
            h = h.wrapping_mul(0x0000_0100_0000_01B3).wrapping_add(byte as u64);
        }
        h
    })
}

/// `(source_id, dest_id) -> Connection`, append-only except for
/// plasticity multiplications. Insertion order is irrelevant.
#[derive(Debug, Clone)]
pub struct ConnectionStore {
    p: f64,
    seed: Option<u64>,
    lazy_init: bool,
    connections: HashMap<(PartId, PartId), Connection>,
}

impl ConnectionStore {
    pub fn new(p: f64, seed: Option<u64>) -> Self {
        Self { p, seed, lazy_init: true, connections: HashMap::new() }
    }

    pub fn p(&self) -> f64 {
        self.p
    }

    /// Disables lazy allocation: `get_or_init` then fails with
    /// `MissingConnection` instead of allocating.
    pub fn disable_lazy_init(&mut self) {
        self.lazy_init = false;
    }

    pub fn enable_lazy_init(&mut self) {
        self.lazy_init = true;
    }

    pub fn lazy_init_enabled(&self) -> bool {
        self.lazy_init
    }

    /// Insert or overwrite a connection directly (bypasses RNG
    /// initialization; used by tests that pin exact weights, and by
    /// `subview`).
    pub fn insert(&mut self, source: PartId, dest: PartId, connection: Connection) {
        self.connections.insert((source, dest), connection);
    }

    pub fn contains(&self, source: PartId, dest: PartId) -> bool {
        self.connections.contains_key(&(source, dest))
    }

    /// Fetch the connection for `(source, dest)`, lazily allocating an
    /// i.i.d. Bernoulli(p) matrix (column-major, so a destination neuron's
    /// incoming column is contiguous) if absent and lazy init is enabled.
    pub fn get_or_init(&mut self, source: &BrainPart, dest: &BrainPart) -> Result<&Connection> {
        let key = (source.id(), dest.id());
        if !self.connections.contains_key(&key) {
            if !self.lazy_init {
                return Err(CoreError::MissingConnection);
            }
            let seed = edge_seed(self.seed, source.id(), dest.id());
            let weights = generate(source.n(), dest.n(), self.p, seed, None, Layout::ColumnMajor)?;
            self.connections.insert(key, Connection::new(weights));
        }
        Ok(self.connections.get(&key).expect("just inserted or already present"))
    }

    pub fn get(&self, source: PartId, dest: PartId) -> Option<&Connection> {
        self.connections.get(&(source, dest))
    }

    pub fn get_mut(&mut self, source: PartId, dest: PartId) -> Option<&mut Connection> {
        self.connections.get_mut(&(source, dest))
    }

    pub fn iter_edges(&self) -> impl Iterator<Item = (PartId, PartId)> + '_ {
        self.connections.keys().copied()
    }

    /// A read-only view restricted to a subset of edges.
    pub fn subview(&self, edges: &[(PartId, PartId)]) -> ConnectionStore {
        let mut sub =
            ConnectionStore { p: self.p, seed: self.seed, lazy_init: false, connections: HashMap::new() };
        for &(s, d) in edges {
            if let Some(conn) = self.connections.get(&(s, d)) {
                sub.connections.insert((s, d), conn.clone());
            }
        }
        sub
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parts::{Area, Stimulus};

    #[test]
    fn lazy_init_allocates_on_first_access() {
        let mut store = ConnectionStore::new(0.3, Some(1));
        let s: BrainPart = Stimulus::new(50, 0.1).unwrap().into();
        let a: BrainPart = Area::new(200, 10, 0.05).unwrap().into();
        assert!(!store.contains(s.id(), a.id()));
        let conn = store.get_or_init(&s, &a).unwrap();
        assert_eq!(conn.weights.shape(), &[50, 200]);
        assert!(store.contains(s.id(), a.id()));
    }

    #[test]
    fn missing_connection_errors_when_lazy_disabled() {
        let mut store = ConnectionStore::new(0.3, Some(1));
        store.disable_lazy_init();
        let s: BrainPart = Stimulus::new(50, 0.1).unwrap().into();
        let a: BrainPart = Area::new(200, 10, 0.05).unwrap().into();
        assert!(matches!(store.get_or_init(&s, &a), Err(CoreError::MissingConnection)));
    }

    #[test]
    fn distinct_edges_get_distinct_weights_even_with_same_shape() {
        let mut store = ConnectionStore::new(0.3, Some(7));
        let s1: BrainPart = Stimulus::new(30, 0.1).unwrap().into();
        let s2: BrainPart = Stimulus::new(30, 0.1).unwrap().into();
        let a: BrainPart = Area::new(30, 5, 0.05).unwrap().into();
        let w1 = store.get_or_init(&s1, &a).unwrap().weights.clone();
        let w2 = store.get_or_init(&s2, &a).unwrap().weights.clone();
        assert_ne!(w1, w2);
    }

    #[test]
    fn same_seed_same_recipe_is_bitwise_reproducible() {
        let s = Stimulus::new(40, 0.1).unwrap();
        let a = Area::new(100, 8, 0.05).unwrap();
        let s: BrainPart = s.into();
        let a: BrainPart = a.into();

        let mut store1 = ConnectionStore::new(0.2, Some(99));
        let mut store2 = ConnectionStore::new(0.2, Some(99));
        let w1 = store1.get_or_init(&s, &a).unwrap().weights.clone();
        let w2 = store2.get_or_init(&s, &a).unwrap().weights.clone();
        assert_eq!(w1, w2);
    }
}
