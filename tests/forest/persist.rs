//! Serialization round-trips and schema ownership on restore.

use std::sync::Arc;

use streamforest::data::{DatasetSchema, SchemaOwnership};
use streamforest::forest::{ForestParams, StreamingForest, Verbosity};
use streamforest::io::PersistError;
use streamforest::testing::gaussian_clusters;
use streamforest::tree::{HoeffdingTree, HoeffdingTreeParams};

fn trained_forest(ownership_owned: bool) -> StreamingForest<HoeffdingTree> {
    let params = ForestParams {
        forest_size: 5,
        num_classes: 2,
        seed: 31,
        verbosity: Verbosity::Silent,
        ..Default::default()
    };
    let mut forest = if ownership_owned {
        StreamingForest::with_owned_schema(
            params,
            DatasetSchema::numeric(4),
            HoeffdingTreeParams::default(),
        )
        .unwrap()
    } else {
        StreamingForest::new(
            params,
            Arc::new(DatasetSchema::numeric(4)),
            HoeffdingTreeParams::default(),
        )
        .unwrap()
    };

    let (data, labels) = gaussian_clusters(60, 2, 4, 6.0, 17);
    forest.train_batch(&data, &labels, true).unwrap();
    forest
}

#[test]
fn owned_schema_roundtrip_preserves_classification() {
    let forest = trained_forest(true);
    let bytes = forest.to_bytes().unwrap();
    let restored = StreamingForest::<HoeffdingTree>::from_bytes(&bytes).unwrap();

    assert_eq!(restored.schema_ownership(), SchemaOwnership::Owned);
    assert_eq!(restored.num_members(), forest.num_members());
    assert_eq!(restored.dimension_usage(), forest.dimension_usage());

    let (held_out, _) = gaussian_clusters(25, 2, 4, 6.0, 18);
    for row in 0..held_out.num_rows() {
        let point = held_out.row_slice(row);
        assert_eq!(
            forest.classify_with_probability(point).unwrap(),
            restored.classify_with_probability(point).unwrap(),
            "row {row}"
        );
    }
}

#[test]
fn restored_forest_continues_training_identically() {
    let mut original = trained_forest(true);
    let bytes = original.to_bytes().unwrap();
    let mut restored = StreamingForest::<HoeffdingTree>::from_bytes(&bytes).unwrap();

    // The bagging generator state travels with the forest, so further
    // training must stay in lockstep.
    let (more, labels) = gaussian_clusters(30, 2, 4, 6.0, 19);
    original.train_batch(&more, &labels, false).unwrap();
    restored.train_batch(&more, &labels, false).unwrap();

    assert_eq!(original.to_bytes().unwrap(), restored.to_bytes().unwrap());
}

#[test]
fn shared_schema_restore_requires_the_schema() {
    let forest = trained_forest(false);
    let bytes = forest.to_bytes().unwrap();

    assert!(matches!(
        StreamingForest::<HoeffdingTree>::from_bytes(&bytes),
        Err(PersistError::SchemaRequired)
    ));

    let schema = Arc::new(DatasetSchema::numeric(4));
    let restored =
        StreamingForest::<HoeffdingTree>::from_bytes_with_schema(&bytes, schema).unwrap();
    assert_eq!(restored.schema_ownership(), SchemaOwnership::Shared);

    let (held_out, _) = gaussian_clusters(10, 2, 4, 6.0, 20);
    assert_eq!(
        forest.classify_batch(&held_out).unwrap(),
        restored.classify_batch(&held_out).unwrap()
    );
}

#[test]
fn mismatched_schema_is_rejected() {
    let forest = trained_forest(false);
    let bytes = forest.to_bytes().unwrap();

    let wrong = Arc::new(DatasetSchema::numeric(7));
    assert!(matches!(
        StreamingForest::<HoeffdingTree>::from_bytes_with_schema(&bytes, wrong),
        Err(PersistError::SchemaMismatch {
            expected: 4,
            got: 7
        })
    ));
}

#[test]
fn corrupt_input_is_rejected() {
    assert!(matches!(
        StreamingForest::<HoeffdingTree>::from_bytes(&[1, 2, 3]),
        Err(PersistError::TruncatedHeader)
    ));

    let mut bytes = trained_forest(true).to_bytes().unwrap();
    bytes[0] = b'Z';
    assert!(matches!(
        StreamingForest::<HoeffdingTree>::from_bytes(&bytes),
        Err(PersistError::BadMagic)
    ));
}
