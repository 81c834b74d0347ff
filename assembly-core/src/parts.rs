//! Brain parts (C2): areas, stimuli, and output areas.
//!
//! Every part carries a stable, content-independent identity assigned at
//! construction and never changed; equality and hashing use identity only.

use crate::error::{CoreError, Result};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Stable identity of a brain part.
pub type PartId = Uuid;

/// Whether an area is a regular intermediate area or a terminal output
/// area. Semantically identical; the distinction exists only so a recipe
/// can mark a destination as "the end of the line".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AreaRole {
    Regular,
    Output,
}

/// A pool of `n` neurons with a fixed per-round winner quota `k` and a
/// plasticity coefficient `beta`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Area {
    id: PartId,
    pub n: usize,
    pub k: usize,
    pub beta: f32,
    pub role: AreaRole,
}

impl Area {
    /// `k = 0` requests the default `floor(sqrt(n))`.
    pub fn new(n: usize, k: usize, beta: f32) -> Result<Self> {
        Self::with_role(n, k, beta, AreaRole::Regular)
    }

    /// An output area: identical semantics to [`Area::new`], marked as a
    /// terminal projection target.
    pub fn output(n: usize, k: usize, beta: f32) -> Result<Self> {
        Self::with_role(n, k, beta, AreaRole::Output)
    }

    fn with_role(n: usize, k: usize, beta: f32, role: AreaRole) -> Result<Self> {
        if n == 0 {
            return Err(CoreError::InvalidParameter {
                parameter: "n".into(),
                reason: "must be >= 1".into(),
            });
        }
        if k > n {
            return Err(CoreError::InvalidParameter {
                parameter: "k".into(),
                reason: format!("must be <= n ({n})"),
            });
        }
        if beta < 0.0 {
            return Err(CoreError::InvalidParameter {
                parameter: "beta".into(),
                reason: "must be non-negative".into(),
            });
        }
        let k = if k == 0 { ((n as f64).sqrt().floor() as usize).max(1) } else { k };
        Ok(Self { id: Uuid::new_v4(), n, k, beta, role })
    }

    pub fn id(&self) -> PartId {
        self.id
    }

    pub fn is_output(&self) -> bool {
        matches!(self.role, AreaRole::Output)
    }
}

impl PartialEq for Area {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Area {}
impl Hash for Area {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// `n` neurons that all fire together whenever the stimulus is active. Has
/// no winners state of its own.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stimulus {
    id: PartId,
    pub n: usize,
    pub beta: f32,
}

impl Stimulus {
    pub fn new(n: usize, beta: f32) -> Result<Self> {
        if n == 0 {
            return Err(CoreError::InvalidParameter {
                parameter: "n".into(),
                reason: "must be >= 1".into(),
            });
        }
        if beta < 0.0 {
            return Err(CoreError::InvalidParameter {
                parameter: "beta".into(),
                reason: "must be non-negative".into(),
            });
        }
        Ok(Self { id: Uuid::new_v4(), n, beta })
    }

    pub fn id(&self) -> PartId {
        self.id
    }
}

impl PartialEq for Stimulus {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Stimulus {}
impl Hash for Stimulus {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A tagged brain part: either an area (regular or output) or a stimulus.
/// Structurally distinct variants, not subtypes of each other.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BrainPart {
    Area(Area),
    Stimulus(Stimulus),
}

impl BrainPart {
    pub fn id(&self) -> PartId {
        match self {
            BrainPart::Area(a) => a.id(),
            BrainPart::Stimulus(s) => s.id(),
        }
    }

    pub fn n(&self) -> usize {
        match self {
            BrainPart::Area(a) => a.n,
            BrainPart::Stimulus(s) => s.n,
        }
    }

    pub fn is_stimulus(&self) -> bool {
        matches!(self, BrainPart::Stimulus(_))
    }

    pub fn is_area(&self) -> bool {
        matches!(self, BrainPart::Area(_))
    }

    pub fn as_area(&self) -> Option<&Area> {
        match self {
            BrainPart::Area(a) => Some(a),
            BrainPart::Stimulus(_) => None,
        }
    }

    pub fn as_stimulus(&self) -> Option<&Stimulus> {
        match self {
            BrainPart::Stimulus(s) => Some(s),
            BrainPart::Area(_) => None,
        }
    }
}

impl From<Area> for BrainPart {
    fn from(area: Area) -> Self {
        BrainPart::Area(area)
    }
}

impl From<Stimulus> for BrainPart {
    fn from(stimulus: Stimulus) -> Self {
        BrainPart::Stimulus(stimulus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_default_k_is_floor_sqrt_n() {
        let a = Area::new(1000, 0, 0.05).unwrap();
        assert_eq!(a.k, 31); // floor(sqrt(1000)) == 31
    }

    #[test]
    fn area_rejects_k_greater_than_n() {
        assert!(Area::new(10, 11, 0.05).is_err());
    }

    #[test]
    fn area_rejects_zero_n() {
        assert!(Area::new(0, 1, 0.05).is_err());
    }

    #[test]
    fn area_rejects_negative_beta() {
        assert!(Area::new(10, 2, -0.1).is_err());
    }

    #[test]
    fn identity_is_unique_per_construction() {
        let a1 = Area::new(10, 2, 0.05).unwrap();
        let a2 = Area::new(10, 2, 0.05).unwrap();
        assert_ne!(a1.id(), a2.id());
        assert_ne!(a1, a2);
    }

    #[test]
    fn output_area_has_identical_semantics() {
        let a = Area::output(500, 20, 0.1).unwrap();
        assert!(a.is_output());
        assert_eq!(a.n, 500);
        assert_eq!(a.k, 20);
    }

    #[test]
    fn stimulus_rejects_zero_n() {
        assert!(Stimulus::new(0, 0.05).is_err());
    }
}
