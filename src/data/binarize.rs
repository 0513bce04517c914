//! Threshold binarization: recode matrix values to 0/1 against a threshold.
//!
//! Values strictly greater than the threshold become 1, all others 0. These
//! are pure single-pass transforms; whole-matrix and single-dimension
//! variants are provided, each in-place and copying.

use super::DenseMatrix;

/// Binarize every element of `matrix` in place.
pub fn binarize_in_place(matrix: &mut DenseMatrix<f32>, threshold: f32) {
    for v in matrix.as_mut_slice() {
        *v = if *v > threshold { 1.0 } else { 0.0 };
    }
}

/// Binarize one dimension (column) of `matrix` in place.
///
/// # Panics
///
/// Panics if `dim >= matrix.num_cols()`.
pub fn binarize_dimension_in_place(matrix: &mut DenseMatrix<f32>, threshold: f32, dim: usize) {
    assert!(
        dim < matrix.num_cols(),
        "Dimension index {} out of bounds",
        dim
    );
    for row in 0..matrix.num_rows() {
        let v = &mut matrix.row_slice_mut(row)[dim];
        *v = if *v > threshold { 1.0 } else { 0.0 };
    }
}

/// Binarize every element into a fresh matrix, leaving the input untouched.
pub fn binarize(matrix: &DenseMatrix<f32>, threshold: f32) -> DenseMatrix<f32> {
    let data = matrix
        .as_slice()
        .iter()
        .map(|&v| if v > threshold { 1.0 } else { 0.0 })
        .collect();
    DenseMatrix::from_vec(data, matrix.num_rows(), matrix.num_cols())
}

/// Binarize one dimension into a fresh matrix; other dimensions are copied
/// unchanged.
///
/// # Panics
///
/// Panics if `dim >= matrix.num_cols()`.
pub fn binarize_dimension(matrix: &DenseMatrix<f32>, threshold: f32, dim: usize) -> DenseMatrix<f32> {
    let mut output = matrix.clone();
    binarize_dimension_in_place(&mut output, threshold, dim);
    output
}
