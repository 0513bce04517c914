//! Online bagging: per-member replication counts for streaming samples.
//!
//! Classical bootstrap resampling needs a fixed pool to resample from; a
//! stream has none. Online bagging substitutes a Poisson(1) draw per member
//! per sample: the count says how many times that member trains on the
//! sample, matching the expected multiplicity under sampling-with-replacement
//! from an ever-growing set. A draw of 0 (about 37% of the time) skips the
//! member entirely.

use rand::SeedableRng;
use rand_distr::{Distribution, Poisson};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Mean of the per-member replication draw.
const POISSON_MEAN: f64 = 1.0;

/// Seedable source of per-member replication counts.
///
/// Counts for one sample are always drawn in member order before any
/// training is dispatched, so the draw sequence depends only on the seed and
/// the number of samples seen, never on scheduling. The generator state is
/// serialized with the forest so a restored ensemble continues the same
/// sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineBagger {
    rng: Xoshiro256PlusPlus,
}

impl OnlineBagger {
    /// Create a bagger seeded for reproducible draws.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// Fill `out` with one replication count per member for the next sample.
    pub fn draw_counts(&mut self, n_members: usize, out: &mut Vec<u32>) {
        let poisson = Poisson::new(POISSON_MEAN).expect("Poisson mean is positive");
        out.clear();
        out.extend((0..n_members).map(|_| poisson.sample(&mut self.rng) as u32));
    }
}
