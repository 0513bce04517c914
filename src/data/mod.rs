//! Data types shared across the ensemble: schemas, matrices, and transforms.

mod dense;
mod schema;

pub mod binarize;

pub use dense::DenseMatrix;
pub use schema::{DatasetSchema, FeatureType, SchemaOwnership, SchemaView};
