//! Ensemble construction and aggregation invariants.

use std::sync::Arc;

use rstest::rstest;

use streamforest::data::DatasetSchema;
use streamforest::error::ForestError;
use streamforest::forest::{ForestParams, StreamingForest, SubsetSize, Verbosity};
use streamforest::testing::{assert_slice_approx_eq, gaussian_clusters};
use streamforest::tree::{HoeffdingTree, HoeffdingTreeParams};

fn forest(
    forest_size: usize,
    num_classes: usize,
    n_dims: usize,
    seed: u64,
) -> StreamingForest<HoeffdingTree> {
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

#[rstest]
#[case(1, 2, 1)]
#[case(3, 2, 4)]
#[case(10, 5, 16)]
#[case(25, 3, 7)]
fn construction_yields_valid_members(
    #[case] forest_size: usize,
    #[case] num_classes: usize,
    #[case] n_dims: usize,
) {
    let forest = forest(forest_size, num_classes, n_dims, 42);
    assert_eq!(forest.num_members(), forest_size);
    assert_eq!(forest.num_classes(), num_classes);

    for member in 0..forest_size {
        let dims = forest.member_dimensions(member);
        assert!(!dims.is_empty(), "member {member} has no dimensions");
        assert!(dims.iter().all(|&d| (d as usize) < n_dims));
        for w in dims.windows(2) {
            assert!(w[0] < w[1], "member {member} subset not sorted");
        }
    }
}

#[test]
fn dimension_coverage_when_slots_cover_all_dims() {
    // 6 members × ⌈√16⌉ = 24 slots over 16 dimensions.
    let forest = forest(6, 2, 16, 123);
    let usage = forest.dimension_usage();
    assert_eq!(usage.len(), 16);
    assert!(
        usage.iter().all(|&count| count >= 1),
        "uncovered dimensions: {usage:?}"
    );
}

#[test]
fn subset_all_gives_every_member_every_dimension() {
    let params = ForestParams {
        forest_size: 3,
        subset_size: SubsetSize::All,
        verbosity: Verbosity::Silent,
        ..Default::default()
    };
    let forest = StreamingForest::<HoeffdingTree>::with_owned_schema(
        params,
        DatasetSchema::numeric(5),
        HoeffdingTreeParams::default(),
    )
    .unwrap();
    for member in 0..3 {
        assert_eq!(forest.member_dimensions(member), &[0, 1, 2, 3, 4]);
    }
    assert_eq!(forest.dimension_usage(), &[3, 3, 3, 3, 3]);
}

#[test]
fn oversized_fixed_subset_caps_at_dimension_count() {
    let params = ForestParams {
        forest_size: 2,
        subset_size: SubsetSize::Fixed(100),
        verbosity: Verbosity::Silent,
        ..Default::default()
    };
    let forest = StreamingForest::<HoeffdingTree>::with_owned_schema(
        params,
        DatasetSchema::numeric(3),
        HoeffdingTreeParams::default(),
    )
    .unwrap();
    assert_eq!(forest.member_dimensions(0), &[0, 1, 2]);
}

#[test]
fn label_out_of_range_leaves_state_untouched() {
    let mut forest = forest(4, 2, 3, 9);
    let (data, labels) = gaussian_clusters(20, 2, 3, 6.0, 1);
    forest.train_batch(&data, &labels, true).unwrap();

    let before = forest.to_bytes().unwrap();
    let err = forest.train(&[1.0, 2.0, 3.0], 2).unwrap_err();
    assert_eq!(
        err,
        ForestError::LabelRange {
            label: 2,
            num_classes: 2
        }
    );
    let after = forest.to_bytes().unwrap();
    assert_eq!(before, after, "rejected train call mutated ensemble state");
}

#[test]
fn batch_with_one_bad_label_trains_nothing() {
    let mut forest = forest(4, 2, 2, 5);
    let before = forest.to_bytes().unwrap();

    let data = streamforest::data::DenseMatrix::from_vec(vec![0.0f32; 6], 3, 2);
    let err = forest.train_batch(&data, &[0, 1, 7], false).unwrap_err();
    assert_eq!(
        err,
        ForestError::LabelRange {
            label: 7,
            num_classes: 2
        }
    );
    assert_eq!(forest.to_bytes().unwrap(), before);
}

#[test]
fn short_point_is_rejected_on_classify() {
    let forest = forest(3, 2, 4, 0);
    assert_eq!(
        forest.classify(&[1.0, 2.0, 3.0]),
        Err(ForestError::DimensionMismatch {
            expected: 4,
            got: 3
        })
    );
}

#[test]
fn training_is_deterministic_under_a_fixed_seed() {
    let (data, labels) = gaussian_clusters(50, 2, 4, 6.0, 3);
    let mut a = forest(5, 2, 4, 77);
    let mut b = forest(5, 2, 4, 77);

    for row in 0..data.num_rows() {
        a.train(data.row_slice(row), labels[row]).unwrap();
        b.train(data.row_slice(row), labels[row]).unwrap();
    }

    assert_eq!(a.to_bytes().unwrap(), b.to_bytes().unwrap());

    let (held_out, _) = gaussian_clusters(10, 2, 4, 6.0, 4);
    assert_eq!(
        a.classify_batch(&held_out).unwrap(),
        b.classify_batch(&held_out).unwrap()
    );
}

#[test]
fn classification_is_idempotent() {
    let mut forest = forest(5, 2, 4, 2);
    let (data, labels) = gaussian_clusters(30, 2, 4, 6.0, 8);
    forest.train_batch(&data, &labels, true).unwrap();

    let point = [0.5, 0.5, 0.5, 0.5];
    let first = forest.classify_with_probability(&point).unwrap();
    for _ in 0..10 {
        assert_eq!(forest.classify_with_probability(&point).unwrap(), first);
    }
}

#[test]
fn batch_classification_matches_single_sample_path() {
    let mut forest = forest(7, 2, 4, 11);
    let (data, labels) = gaussian_clusters(40, 2, 4, 6.0, 12);
    forest.train_batch(&data, &labels, true).unwrap();

    let (held_out, _) = gaussian_clusters(15, 2, 4, 6.0, 13);
    let (batch_labels, batch_probs) =
        forest.classify_batch_with_probabilities(&held_out).unwrap();

    for row in 0..held_out.num_rows() {
        let (label, prob) = forest
            .classify_with_probability(held_out.row_slice(row))
            .unwrap();
        assert_eq!(batch_labels[row], label, "row {row}");
        assert_eq!(batch_probs[row], prob, "row {row}");
    }
}

#[test]
fn averaged_probabilities_sum_to_one() {
    let mut forest = forest(5, 3, 4, 21);
    let (data, labels) = gaussian_clusters(30, 3, 4, 6.0, 22);
    forest.train_batch(&data, &labels, true).unwrap();

    let probs = forest.class_probabilities(&[1.0, 1.0, 1.0, 1.0]).unwrap();
    assert_eq!(probs.len(), 3);
    assert_slice_approx_eq(
        &[probs.iter().sum::<f64>()],
        &[1.0],
        1e-9,
        "probability mass",
    );
}

#[test]
fn shared_schema_is_not_duplicated() {
    let schema = Arc::new(DatasetSchema::numeric(6));
    let params = ForestParams {
        forest_size: 3,
        verbosity: Verbosity::Silent,
        ..Default::default()
    };
    let forest = StreamingForest::<HoeffdingTree>::new(
        params,
        Arc::clone(&schema),
        HoeffdingTreeParams::default(),
    )
    .unwrap();

    assert_eq!(forest.schema().n_dims(), 6);
    // Caller's Arc plus the forest's.
    assert_eq!(Arc::strong_count(&schema), 2);
}
