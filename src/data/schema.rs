//! Dataset schema: per-dimension type descriptions shared across the ensemble.

use serde::{Deserialize, Serialize};

/// Type tag for a single input dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureType {
    /// Continuous numeric values.
    Numeric,
    /// Integer category IDs in `[0, cardinality)`.
    Categorical {
        /// Number of distinct category values.
        cardinality: u32,
    },
}

impl FeatureType {
    /// Returns true for categorical dimensions.
    #[inline]
    pub fn is_categorical(&self) -> bool {
        matches!(self, FeatureType::Categorical { .. })
    }

    /// Category count for categorical dimensions, `None` for numeric ones.
    #[inline]
    pub fn cardinality(&self) -> Option<u32> {
        match self {
            FeatureType::Numeric => None,
            FeatureType::Categorical { cardinality } => Some(*cardinality),
        }
    }
}

/// Immutable description of the input space: one [`FeatureType`] per dimension.
///
/// A schema is built once and shared by reference across every ensemble
/// member; the forest never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSchema {
    dims: Vec<FeatureType>,
}

impl DatasetSchema {
    /// Create a schema from explicit per-dimension types.
    pub fn new(dims: Vec<FeatureType>) -> Self {
        Self { dims }
    }

    /// Create an all-numeric schema with `n_dims` dimensions.
    pub fn numeric(n_dims: usize) -> Self {
        Self {
            dims: vec![FeatureType::Numeric; n_dims],
        }
    }

    /// Number of dimensions.
    #[inline]
    pub fn n_dims(&self) -> usize {
        self.dims.len()
    }

    /// Returns true if the schema has no dimensions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dims.is_empty()
    }

    /// Type of dimension `dim`.
    ///
    /// # Panics
    ///
    /// Panics if `dim >= n_dims()`.
    #[inline]
    pub fn feature_type(&self, dim: usize) -> FeatureType {
        self.dims[dim]
    }

    /// All per-dimension types, in order.
    #[inline]
    pub fn types(&self) -> &[FeatureType] {
        &self.dims
    }
}

/// A schema restricted to one member's dimension subset.
///
/// Index `j` of the view corresponds to dimension `dims[j]` of the full
/// schema, matching the layout of projected feature vectors.
#[derive(Debug, Clone, Copy)]
pub struct SchemaView<'a> {
    schema: &'a DatasetSchema,
    dims: &'a [u32],
}

impl<'a> SchemaView<'a> {
    /// Create a view of `schema` over the given subset of dimension indices.
    pub fn new(schema: &'a DatasetSchema, dims: &'a [u32]) -> Self {
        Self { schema, dims }
    }

    /// Number of projected dimensions.
    #[inline]
    pub fn n_dims(&self) -> usize {
        self.dims.len()
    }

    /// Type of projected dimension `j`.
    #[inline]
    pub fn feature_type(&self, j: usize) -> FeatureType {
        self.schema.feature_type(self.dims[j] as usize)
    }

    /// Original dimension index behind projected dimension `j`.
    #[inline]
    pub fn source_dim(&self, j: usize) -> u32 {
        self.dims[j]
    }
}

/// Whether the forest owns its schema or shares one held by the caller.
///
/// Owned schemas are embedded in serialized state; shared schemas are
/// persisted as a reference marker and must be re-supplied on restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaOwnership {
    /// The forest owns the schema and embeds it when serialized.
    Owned,
    /// The caller retains the schema; serialized state stores a marker.
    Shared,
}
