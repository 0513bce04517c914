//! Dimension subset selection for ensemble members.
//!
//! Each member trains on a private subset of the input dimensions. Subsets
//! are chosen at construction time with usage-biased sampling: every draw
//! prefers the dimensions used by the fewest members so far, with random
//! tie-breaking inside each usage stratum. Whenever the total number of
//! subset slots reaches the dimension count, this guarantees every dimension
//! lands in at least one member's subset.

use rand::Rng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use crate::error::ForestError;

// ============================================================================
// SubsetSize
// ============================================================================

/// Policy for how many dimensions each member receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SubsetSize {
    /// `⌈√D⌉` dimensions per member (random-forest convention).
    #[default]
    Sqrt,
    /// A fixed dimension count per member, capped at `D`.
    Fixed(usize),
    /// Every member sees all `D` dimensions.
    All,
}

impl SubsetSize {
    /// Resolve the policy to a concrete subset size for `n_dims` dimensions.
    pub fn resolve(&self, n_dims: usize) -> usize {
        match self {
            SubsetSize::Sqrt => (n_dims as f64).sqrt().ceil() as usize,
            SubsetSize::Fixed(k) => (*k).min(n_dims),
            SubsetSize::All => n_dims,
        }
    }
}

// ============================================================================
// DimensionSelector
// ============================================================================

/// Draws one dimension subset per member, balancing usage across the
/// ensemble.
///
/// Only used during forest construction; the final usage counts are handed
/// to the forest and never mutated again.
#[derive(Debug, Clone)]
pub(crate) struct DimensionSelector {
    usage: Vec<u32>,
    subset_size: usize,
}

impl DimensionSelector {
    /// Create a selector over `n_dims` dimensions drawing subsets of
    /// `subset_size`.
    pub fn new(n_dims: usize, subset_size: usize) -> Result<Self, ForestError> {
        if n_dims == 0 {
            return Err(ForestError::Configuration {
                reason: "schema has no dimensions".to_string(),
            });
        }
        if subset_size == 0 {
            return Err(ForestError::Configuration {
                reason: "dimension subset size must be at least 1".to_string(),
            });
        }
        Ok(Self {
            usage: vec![0; n_dims],
            subset_size,
        })
    }

    /// Draw the next member's subset and update the usage counts.
    ///
    /// Returns a sorted list of dimension indices. When the subset size
    /// covers all dimensions no randomness is consumed.
    pub fn select(&mut self, rng: &mut Xoshiro256PlusPlus) -> Vec<u32> {
        let n_dims = self.usage.len();
        let k = self.subset_size.min(n_dims);

        let mut subset: Vec<u32> = if k == n_dims {
            (0..n_dims as u32).collect()
        } else {
            // Least-used dimensions first, random order inside each stratum.
            let mut order: Vec<(u32, u64, u32)> = self
                .usage
                .iter()
                .enumerate()
                .map(|(dim, &count)| (count, rng.gen::<u64>(), dim as u32))
                .collect();
            order.sort_unstable();
            let mut chosen: Vec<u32> = order[..k].iter().map(|&(_, _, dim)| dim).collect();
            chosen.sort_unstable();
            chosen
        };

        for &dim in &subset {
            self.usage[dim as usize] += 1;
        }
        subset.shrink_to_fit();
        subset
    }

    /// Per-dimension usage counts accumulated so far.
    #[cfg(test)]
    pub fn usage(&self) -> &[u32] {
        &self.usage
    }

    /// Consume the selector, yielding the final usage counts.
    pub fn into_usage(self) -> Vec<u32> {
        self.usage
    }
}
