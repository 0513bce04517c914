//! End-to-end behavior: accuracy on synthetic streams and batch equivalence.

use streamforest::data::DatasetSchema;
use streamforest::forest::{ForestParams, StreamingForest, Verbosity};
use streamforest::testing::gaussian_clusters;
use streamforest::tree::{HoeffdingTree, HoeffdingTreeParams};

fn build(forest_size: usize, num_classes: usize, n_dims: usize, seed: u64) -> StreamingForest<HoeffdingTree> {
    let params = ForestParams {
        forest_size,
        num_classes,
        seed,
        verbosity: Verbosity::Silent,
        ..Default::default()
    };
    StreamingForest::with_owned_schema(
        params,
        DatasetSchema::numeric(n_dims),
        HoeffdingTreeParams::default(),
    )
    .unwrap()
}

#[test]
fn separable_clusters_classify_above_ninety_percent() {
    let mut forest = build(3, 2, 4, 42);

    let (train, train_labels) = gaussian_clusters(50, 2, 4, 6.0, 100);
    assert_eq!(train.num_rows(), 100);
    forest.train_batch(&train, &train_labels, true).unwrap();

    let (test, test_labels) = gaussian_clusters(25, 2, 4, 6.0, 200);
    assert_eq!(test.num_rows(), 50);
    let predictions = forest.classify_batch(&test).unwrap();

    let correct = predictions
        .iter()
        .zip(&test_labels)
        .filter(|(p, t)| p == t)
        .count();
    let accuracy = correct as f64 / test_labels.len() as f64;
    assert!(accuracy > 0.9, "held-out accuracy {accuracy} too low");
}

#[test]
fn three_class_stream_is_learned() {
    let mut forest = build(10, 3, 5, 7);

    let (train, train_labels) = gaussian_clusters(100, 3, 5, 8.0, 300);
    forest.train_batch(&train, &train_labels, true).unwrap();

    let (test, test_labels) = gaussian_clusters(30, 3, 5, 8.0, 301);
    let predictions = forest.classify_batch(&test).unwrap();

    let correct = predictions
        .iter()
        .zip(&test_labels)
        .filter(|(p, t)| p == t)
        .count();
    let accuracy = correct as f64 / test_labels.len() as f64;
    assert!(accuracy > 0.9, "held-out accuracy {accuracy} too low");
}

#[test]
fn batch_flag_never_changes_the_trained_model() {
    let (train, train_labels) = gaussian_clusters(80, 2, 4, 6.0, 500);

    let mut one_shot = build(5, 2, 4, 55);
    one_shot.train_batch(&train, &train_labels, true).unwrap();

    let mut incremental = build(5, 2, 4, 55);
    incremental
        .train_batch(&train, &train_labels, false)
        .unwrap();

    let mut sample_by_sample = build(5, 2, 4, 55);
    for row in 0..train.num_rows() {
        sample_by_sample
            .train(train.row_slice(row), train_labels[row])
            .unwrap();
    }

    let a = one_shot.to_bytes().unwrap();
    let b = incremental.to_bytes().unwrap();
    let c = sample_by_sample.to_bytes().unwrap();
    assert_eq!(a, b, "batch flag changed trained state");
    assert_eq!(a, c, "batch path diverged from sample-by-sample training");

    let (test, _) = gaussian_clusters(20, 2, 4, 6.0, 501);
    assert_eq!(
        one_shot.classify_batch(&test).unwrap(),
        sample_by_sample.classify_batch(&test).unwrap()
    );
}

#[test]
fn confidence_reflects_ensemble_agreement() {
    let mut forest = build(9, 2, 4, 3);
    let (train, train_labels) = gaussian_clusters(100, 2, 4, 8.0, 600);
    forest.train_batch(&train, &train_labels, true).unwrap();

    // Deep inside class 1's cluster every member should agree.
    let (label, confidence) = forest
        .classify_with_probability(&[8.0, 8.0, 8.0, 8.0])
        .unwrap();
    assert_eq!(label, 1);
    assert!(confidence > 0.99, "confidence {confidence}");
    assert!(confidence <= 1.0);
}
