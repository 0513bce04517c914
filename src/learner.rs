//! The streaming learner contract consumed by the forest.

use crate::data::SchemaView;

/// An incrementally trainable classifier usable as an ensemble member.
///
/// A learner sees only *projected* feature vectors: the forest extracts each
/// member's dimension subset from every incoming sample, so index `j` of a
/// projected vector corresponds to index `j` of the [`SchemaView`] the
/// learner was constructed with.
///
/// Implementations must be deterministic: two learners built from the same
/// configuration and trained on the same projected sample sequence must
/// produce identical predictions.
pub trait StreamingLearner: Sized {
    /// Construction-time configuration, copied into every fresh member.
    type Config: Clone;

    /// Build an untrained learner for `num_classes` classes over the
    /// projected dimensions described by `view`.
    fn with_config(config: Self::Config, num_classes: usize, view: &SchemaView<'_>) -> Self;

    /// The configuration this learner was built with.
    fn config(&self) -> &Self::Config;

    /// Number of classes this learner predicts over.
    fn num_classes(&self) -> usize;

    /// Consume one projected sample with its label, updating internal
    /// statistics. Never stores the sample itself.
    fn train(&mut self, point: &[f32], label: usize);

    /// Predict the most likely label for a projected sample.
    fn classify(&self, point: &[f32]) -> usize {
        self.classify_with_probability(point).0
    }

    /// Predict the most likely label together with its estimated probability.
    fn classify_with_probability(&self, point: &[f32]) -> (usize, f64);

    /// Fill `out` (length `num_classes()`) with the per-class probability
    /// estimate for a projected sample. The result sums to 1.
    fn class_probabilities(&self, point: &[f32], out: &mut [f64]);
}
