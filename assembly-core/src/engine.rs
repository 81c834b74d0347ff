//! Projection engine (C4): one simulation round — compute inputs, select
//! top-`k` winners, apply Hebbian plasticity.

use crate::connection::ConnectionStore;
use crate::error::{CoreError, Result};
use crate::parts::{BrainPart, PartId};
use ndarray::{Array1, Axis};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// Everything the engine needs to mutate for one round, borrowed from the
/// owning [`crate::brain::Brain`].
pub struct RoundInputs<'a> {
    pub parts: &'a HashMap<PartId, BrainPart>,
    pub store: &'a mut ConnectionStore,
    pub winners: &'a mut HashMap<PartId, Vec<usize>>,
    pub support: &'a mut HashMap<PartId, HashSet<usize>>,
    pub plasticity_enabled: bool,
}

/// Run a single round: `dst_to_sources` maps each destination area to the
/// brain parts feeding it this round (the inverse of the brain's
/// user-facing `src -> dsts` active edge set).
///
/// All destination input vectors are computed against the *pre-round*
/// winners snapshot; new winners for every destination are committed only
/// after all destinations have been processed; plasticity then fires
/// against old source winners and new destination winners.
pub fn run_round(inputs: &mut RoundInputs<'_>, dst_to_sources: &HashMap<PartId, Vec<PartId>>) -> Result<()> {
    log::debug!("round start: {} destination area(s)", dst_to_sources.len());

    // Snapshot of the winners used as *sources* this round, captured before
    // any destination's winners are overwritten.
    let old_winners = inputs.winners.clone();

    let mut new_winners: HashMap<PartId, Vec<usize>> = HashMap::with_capacity(dst_to_sources.len());

    for (dest_id, source_ids) in dst_to_sources {
        let dest_part = inputs
            .parts
            .get(dest_id)
            .ok_or_else(|| CoreError::UnknownPart { context: "projection destination".into() })?;
        let dest_area = dest_part
            .as_area()
            .ok_or_else(|| CoreError::InvalidParameter {
                parameter: "destination".into(),
                reason: "a projection target must be an area".into(),
            })?
            .clone();

        let mut input = vec![0f32; dest_area.n];

        for source_id in source_ids {
            let source_part = inputs
                .parts
                .get(source_id)
                .ok_or_else(|| CoreError::UnknownPart { context: "projection source".into() })?
                .clone();

            let conn = inputs.store.get_or_init(&source_part, dest_part)?;

            match &source_part {
                BrainPart::Stimulus(_) => {
                    let column_sums = conn.weights.sum_axis(Axis(0));
                    for (acc, v) in input.iter_mut().zip(column_sums.iter()) {
                        *acc += v;
                    }
                }
                BrainPart::Area(src_area) => {
                    let empty = Vec::new();
                    let source_winners = old_winners.get(source_id).unwrap_or(&empty);
                    for &w in source_winners {
                        if w >= src_area.n {
                            return Err(CoreError::DimensionMismatch { index: w, n: src_area.n });
                        }
                    }

                    // Row-sum reduction over winners, partitioned across the
                    // worker pool: each worker sums a slice of the winner
                    // rows into its own partial vector, then the partials
                    // are added together.
                    let partial: Array1<f32> = source_winners
                        .par_iter()
                        .fold(|| Array1::<f32>::zeros(dest_area.n), |mut acc, &w| {
                            acc += &conn.weights.row(w);
                            acc
                        })
                        .reduce(|| Array1::<f32>::zeros(dest_area.n), |a, b| a + b);

                    for (acc, v) in input.iter_mut().zip(partial.iter()) {
                        *acc += v;
                    }
                }
            }
        }

        new_winners.insert(*dest_id, top_k_indices(&input, dest_area.k));
    }

    // Plasticity: read old source winners and the just-computed (not yet
    // committed) new destination winners.
    if inputs.plasticity_enabled {
        for (dest_id, source_ids) in dst_to_sources {
            let dest_area = inputs.parts[dest_id].as_area().expect("validated above").clone();
            let dest_winners = &new_winners[dest_id];

            for source_id in source_ids {
                let source_part = inputs.parts[source_id].clone();
                let beta = match &source_part {
                    BrainPart::Stimulus(_) => dest_area.beta,
                    BrainPart::Area(a) => a.beta,
                };

                let conn = inputs
                    .store
                    .get_mut(*source_id, *dest_id)
                    .expect("connection was touched while computing inputs");

                let source_indices: Vec<usize> = match &source_part {
                    BrainPart::Stimulus(s) => (0..s.n).collect(),
                    BrainPart::Area(_) => old_winners.get(source_id).cloned().unwrap_or_default(),
                };

                let factor = 1.0 + beta;
                for &i in &source_indices {
                    for &j in dest_winners {
                        conn.weights[[i, j]] *= factor;
                    }
                }
            }
        }
    }

    for (dest_id, winners) in new_winners {
        log::trace!("committed {} winner(s) for area {dest_id}", winners.len());
        inputs.support.entry(dest_id).or_default().extend(winners.iter().copied());
        inputs.winners.insert(dest_id, winners);
    }

    Ok(())
}

/// The `k` indices with the largest values in `input`, ties broken by
/// lower index first, stable across platforms.
fn top_k_indices(input: &[f32], k: usize) -> Vec<usize> {
    let mut indexed: Vec<(usize, f32)> = input.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));
    let mut winners: Vec<usize> = indexed.into_iter().take(k).map(|(i, _)| i).collect();
    winners.sort_unstable();
    winners
}


#[cfg(test)]
mod top_k_properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// The winners-size/subset invariant, restricted to the selection
        /// step itself: for any input vector and any `k <= len`,
        /// `top_k_indices` returns exactly `k` distinct, ascending indices
        /// into the input.
        #[test]
        fn returns_k_distinct_ascending_indices(
            input in prop::collection::vec(-1000.0f32..1000.0, 1..64),
            k_fraction in 0.0f64..1.0,
        ) {
            let k = ((input.len() as f64) * k_fraction) as usize;
            let winners = top_k_indices(&input, k);
            prop_assert_eq!(winners.len(), k);
            prop_assert!(winners.iter().all(|&i| i < input.len()));
            prop_assert!(winners.windows(2).all(|w| w[0] < w[1]));
        }

        /// Every returned index's value is >= every non-returned index's
        /// value (the defining property of "top k", independent of the
        /// tie-break rule).
        #[test]
        fn winners_dominate_non_winners(
            input in prop::collection::vec(-1000.0f32..1000.0, 1..32),
            k_fraction in 0.0f64..1.0,
        ) {
            let k = ((input.len() as f64) * k_fraction) as usize;
            let winners = top_k_indices(&input, k);
            let winner_set: std::collections::HashSet<usize> = winners.iter().copied().collect();
            let min_winner_value = winners.iter().map(|&i| input[i]).fold(f32::INFINITY, f32::min);
            for (i, &v) in input.iter().enumerate() {
                if !winner_set.contains(&i) {
                    prop_assert!(v <= min_winner_value);
                }
            }
        }
    }
}
