//! RNG kernel (C1): reproducible, thread-partitioned Bernoulli(p) matrix
//! generation for connectome initialization.
//!
//! A single master seed determines `threads` independent pseudo-random
//! streams; each stream fills a contiguous row-band of the output matrix,
//! so workers never alias each other's writes and no locking is needed.
//! Given the same `(height, width, p, seed, threads)` the result is
//! bit-identical across runs and hosts.

pub mod error;

use error::{Result, RngError};
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_distr::{Bernoulli, Distribution};
use rand_pcg::Pcg64;
use rayon::prelude::*;

/// Memory layout requested for a generated matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Rows contiguous in memory.
    RowMajor,
    /// Columns contiguous in memory (connection matrices prefer this, so a
    /// destination neuron's incoming column is a contiguous slice).
    ColumnMajor,
}

/// Derive `count` statistically independent 64-bit seeds from one master
/// seed.
///
/// A from-scratch PCG64 jump-ahead primitive (advancing a generator by a
/// fixed large stride) is more machinery than this needs; `rand_pcg` does
/// not expose one either, so each worker's stream is instead seeded from a
/// SplitMix64-style mix of the master seed and the worker index. The
/// external contract is unchanged: the same `(seed, count)` always yields
/// the same `count` independent-looking streams.
fn derive_seeds(master_seed: u64, count: usize) -> Vec<u64> {
    (0..count)
        .map(|i| {
            let mut z = master_seed.wrapping_add((i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
            z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
            z ^ (z >> 31)
        })
        .collect()
}

/// Generate a `height x width` matrix of i.i.d. Bernoulli(`p`) samples.
///
/// Work is split into `threads` contiguous row-bands, one per worker, with
/// a fixed thread pool (default: host parallelism). `threads = None` uses
/// rayon's current pool size. Fails with [`RngError::InvalidProbability`]
/// if `p` is outside `[0, 1]`, or [`RngError::InvalidDimensions`] if either
/// dimension is zero.
pub fn generate(
    height: usize,
    width: usize,
    p: f64,
    seed: Option<u64>,
    threads: Option<usize>,
    layout: Layout,
) -> Result<Array2<f32>> {
    if !(0.0..=1.0).contains(&p) {
        return Err(RngError::InvalidProbability { p });
    }
    if height == 0 || width == 0 {
        return Err(RngError::InvalidDimensions { height, width });
    }

    let threads = threads.unwrap_or_else(rayon::current_num_threads).max(1).min(height);
    let master_seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
    let seeds = derive_seeds(master_seed, threads);

    log::debug!("generating {height}x{width} Bernoulli({p}) matrix, seed={master_seed}, {threads} worker(s)");

    let band = (height + threads - 1) / threads;
    let mut data = vec![0f32; height * width];

    data.par_chunks_mut(band * width).zip(seeds.into_par_iter()).for_each(|(rows, worker_seed)| {
        let mut rng = Pcg64::seed_from_u64(worker_seed);
        let dist = Bernoulli::new(p).expect("p already validated in [0, 1]");
        for cell in rows.iter_mut() {
            *cell = if dist.sample(&mut rng) { 1.0 } else { 0.0 };
        }
    });

    let row_major = Array2::from_shape_vec((height, width), data).expect("data length matches height*width");

    let matrix = match layout {
        Layout::RowMajor => row_major,
        Layout::ColumnMajor => {
            let mut col_major = Array2::<f32>::zeros((height, width).f());
            col_major.assign(&row_major);
            col_major
        }
    };

    Ok(matrix)
}
