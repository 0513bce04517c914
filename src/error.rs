//! Error types for ensemble construction and training.

/// Errors surfaced by forest construction, training, and classification.
///
/// Every input-validation error is detected before any ensemble member is
/// mutated, so a failed call leaves the forest exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForestError {
    /// Invalid construction parameters (forest size, class count, subset size).
    #[error("invalid configuration: {reason}")]
    Configuration { reason: String },

    /// Input vector or matrix width does not match the schema dimension count.
    #[error("dimension mismatch: expected {expected} dimensions, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Label outside `[0, num_classes)`.
    #[error("label {label} out of range for {num_classes} classes")]
    LabelRange { label: usize, num_classes: usize },

    /// Batch labels not aligned with the number of data rows.
    #[error("number of labels ({labels}) does not match number of rows ({rows})")]
    LengthMismatch { rows: usize, labels: usize },
}
