//! Testing utilities: assertion helpers and synthetic stream generators.
//!
//! Used by both unit tests and the integration tests under `tests/`.

use approx::AbsDiffEq;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::data::DenseMatrix;

/// Default tolerance for probability comparisons.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Assert that two f64 slices are approximately equal element-wise.
///
/// # Panics
///
/// Panics if lengths differ or any element differs by more than `tolerance`.
pub fn assert_slice_approx_eq(actual: &[f64], expected: &[f64], tolerance: f64, context: &str) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "{context}: length mismatch - got {}, expected {}",
        actual.len(),
        expected.len()
    );
    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert!(
            a.abs_diff_eq(e, tolerance),
            "{context}[{i}]: {a} ≠ {e} (tolerance={tolerance})"
        );
    }
}

/// Generate labeled samples from well-separated Gaussian clusters.
///
/// Class `c` is centered at `c * separation` on every dimension with unit
/// standard deviation. Rows interleave classes (`row % num_classes`) so the
/// stream never presents one class in a long run.
pub fn gaussian_clusters(
    samples_per_class: usize,
    num_classes: usize,
    n_dims: usize,
    separation: f32,
    seed: u64,
) -> (DenseMatrix<f32>, Vec<usize>) {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let n_rows = samples_per_class * num_classes;
    let mut data = Vec::with_capacity(n_rows * n_dims);
    let mut labels = Vec::with_capacity(n_rows);

    for row in 0..n_rows {
        let class = row % num_classes;
        let normal = Normal::new(class as f32 * separation, 1.0).expect("unit sigma is valid");
        for _ in 0..n_dims {
            data.push(normal.sample(&mut rng));
        }
        labels.push(class);
    }

    (DenseMatrix::from_vec(data, n_rows, n_dims), labels)
}
