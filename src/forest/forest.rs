//! The ensemble coordinator: an online-bagged forest of streaming learners.

use std::sync::Arc;

use derive_builder::Builder;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::data::{DatasetSchema, DenseMatrix, FeatureType, SchemaOwnership, SchemaView};
use crate::error::ForestError;
use crate::io::native::{decode_payload, encode_payload, PersistError};
use crate::io::payload::{MemberPayload, Payload, PayloadV1, SchemaPayload};
use crate::learner::StreamingLearner;

use super::bagging::OnlineBagger;
use super::dimensions::{DimensionSelector, SubsetSize};
use super::logger::{TrainLogger, Verbosity};

/// Decorrelates the bagging draw stream from the subset-selection stream.
const BAGGING_SEED_MIX: u64 = 0x9E3779B97F4A7C15;

/// Rows between progress lines at debug verbosity.
const BATCH_LOG_INTERVAL: usize = 1000;

// ============================================================================
// ForestParams
// ============================================================================

/// Construction parameters for [`StreamingForest`].
///
/// # Example
///
/// ```ignore
/// use streamforest::forest::{ForestParams, SubsetSize};
///
/// let params = ForestParams::builder()
///     .forest_size(25usize)
///     .num_classes(3usize)
///     .subset_size(SubsetSize::Sqrt)
///     .seed(42u64)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(into), default)]
pub struct ForestParams {
    /// Number of ensemble members. Fixed for the forest's lifetime.
    pub forest_size: usize,
    /// Number of classes. Must be at least 2.
    pub num_classes: usize,
    /// How many dimensions each member receives.
    pub subset_size: SubsetSize,
    /// Seed for subset selection and online bagging.
    pub seed: u64,
    /// Logging level for batch training.
    pub verbosity: Verbosity,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            forest_size: 10,
            num_classes: 2,
            subset_size: SubsetSize::Sqrt,
            seed: 0,
            verbosity: Verbosity::Info,
        }
    }
}

impl ForestParams {
    /// Fluent builder over the default parameters.
    pub fn builder() -> ForestParamsBuilder {
        ForestParamsBuilder::default()
    }
}

// ============================================================================
// StreamingForest
// ============================================================================

/// One ensemble member: a learner plus its fixed dimension subset.
#[derive(Debug, Clone)]
struct ForestMember<L> {
    learner: L,
    dims: Vec<u32>,
}

/// An online-bagged ensemble of streaming learners.
///
/// The forest owns a fixed set of members. Every incoming sample is
/// replicated per member by a Poisson(1) draw (online bagging) and projected
/// onto that member's dimension subset before training. Classification
/// aggregates the members' top labels by plurality vote, breaking ties
/// toward the lowest label index.
///
/// All input validation happens before any member is mutated, so a failed
/// call never leaves the ensemble partially trained.
#[derive(Debug, Clone)]
pub struct StreamingForest<L: StreamingLearner> {
    params: ForestParams,
    schema: Arc<DatasetSchema>,
    ownership: SchemaOwnership,
    members: Vec<ForestMember<L>>,
    usage: Vec<u32>,
    bagger: OnlineBagger,
    logger: TrainLogger,
}

impl<L: StreamingLearner> StreamingForest<L> {
    /// Build a forest over a schema shared with the caller.
    ///
    /// The schema is not embedded when the forest is serialized; restoring
    /// requires the caller to supply it again
    /// (see [`from_bytes_with_schema`](Self::from_bytes_with_schema)).
    pub fn new(
        params: ForestParams,
        schema: Arc<DatasetSchema>,
        config: L::Config,
    ) -> Result<Self, ForestError> {
        Self::build(params, schema, SchemaOwnership::Shared, config)
    }

    /// Build a forest that takes ownership of its schema.
    ///
    /// The schema is embedded in serialized state, so the forest restores
    /// without outside help.
    pub fn with_owned_schema(
        params: ForestParams,
        schema: DatasetSchema,
        config: L::Config,
    ) -> Result<Self, ForestError> {
        Self::build(params, Arc::new(schema), SchemaOwnership::Owned, config)
    }

    /// Build a forest of fresh members copying `exemplar`'s configuration.
    ///
    /// The exemplar's own training state is not copied; every member starts
    /// untrained. The schema stays caller-owned, as with [`new`](Self::new).
    pub fn from_exemplar(
        exemplar: &L,
        params: ForestParams,
        schema: Arc<DatasetSchema>,
    ) -> Result<Self, ForestError> {
        Self::build(
            params,
            schema,
            SchemaOwnership::Shared,
            exemplar.config().clone(),
        )
    }

    fn build(
        params: ForestParams,
        schema: Arc<DatasetSchema>,
        ownership: SchemaOwnership,
        config: L::Config,
    ) -> Result<Self, ForestError> {
        if params.forest_size == 0 {
            return Err(ForestError::Configuration {
                reason: "forest must have at least one member".to_string(),
            });
        }
        if params.num_classes < 2 {
            return Err(ForestError::Configuration {
                reason: format!("need at least 2 classes, got {}", params.num_classes),
            });
        }
        for (dim, ty) in schema.types().iter().enumerate() {
            if let FeatureType::Categorical { cardinality: 0 } = ty {
                return Err(ForestError::Configuration {
                    reason: format!("dimension {dim} is categorical with zero cardinality"),
                });
            }
        }

        let subset_size = params.subset_size.resolve(schema.n_dims());
        let mut selector = DimensionSelector::new(schema.n_dims(), subset_size)?;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(params.seed);

        let members = (0..params.forest_size)
            .map(|_| {
                let dims = selector.select(&mut rng);
                let view = SchemaView::new(&schema, &dims);
                let learner = L::with_config(config.clone(), params.num_classes, &view);
                ForestMember { learner, dims }
            })
            .collect();

        let bagger = OnlineBagger::new(params.seed ^ BAGGING_SEED_MIX);
        let logger = TrainLogger::new(params.verbosity);

        Ok(Self {
            usage: selector.into_usage(),
            params,
            schema,
            ownership,
            members,
            bagger,
            logger,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Number of ensemble members.
    #[inline]
    pub fn num_members(&self) -> usize {
        self.members.len()
    }

    /// Number of classes.
    #[inline]
    pub fn num_classes(&self) -> usize {
        self.params.num_classes
    }

    /// The shared dataset schema.
    #[inline]
    pub fn schema(&self) -> &DatasetSchema {
        &self.schema
    }

    /// Whether this forest owns its schema.
    #[inline]
    pub fn schema_ownership(&self) -> SchemaOwnership {
        self.ownership
    }

    /// Construction parameters.
    #[inline]
    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// How many members use each dimension.
    #[inline]
    pub fn dimension_usage(&self) -> &[u32] {
        &self.usage
    }

    /// Dimension subset of member `member`.
    ///
    /// # Panics
    ///
    /// Panics if `member >= num_members()`.
    #[inline]
    pub fn member_dimensions(&self, member: usize) -> &[u32] {
        &self.members[member].dims
    }

    /// Immutable access to a member's learner.
    ///
    /// # Panics
    ///
    /// Panics if `member >= num_members()`.
    #[inline]
    pub fn member_learner(&self, member: usize) -> &L {
        &self.members[member].learner
    }

    // ========================================================================
    // Training
    // ========================================================================

    /// Train every member on one sample.
    ///
    /// Each member draws a Poisson(1) replication count; the sample is
    /// projected onto the member's dimension subset and trained that many
    /// times (members drawing 0 skip the sample).
    pub fn train(&mut self, point: &[f32], label: usize) -> Result<(), ForestError> {
        self.validate_width(point.len())?;
        self.validate_label(label)?;
        self.train_unchecked(point, label);
        Ok(())
    }

    /// Train on a batch of rows, presented one at a time in row order.
    ///
    /// `batch_training` records that the caller intends a one-shot full pass;
    /// it is a performance hint only and never changes the trained model.
    /// All rows and labels are validated before any member is mutated.
    pub fn train_batch(
        &mut self,
        data: &DenseMatrix<f32>,
        labels: &[usize],
        batch_training: bool,
    ) -> Result<(), ForestError> {
        if labels.len() != data.num_rows() {
            return Err(ForestError::LengthMismatch {
                rows: data.num_rows(),
                labels: labels.len(),
            });
        }
        self.validate_width(data.num_cols())?;
        for &label in labels {
            self.validate_label(label)?;
        }

        let _ = batch_training;
        for (row, &label) in labels.iter().enumerate() {
            self.train_unchecked(data.row_slice(row), label);
            if (row + 1) % BATCH_LOG_INTERVAL == 0 {
                self.logger
                    .debug(&format!("trained {}/{} rows", row + 1, data.num_rows()));
            }
        }
        self.logger.info(&format!(
            "trained {} samples across {} members",
            data.num_rows(),
            self.members.len()
        ));
        Ok(())
    }

    /// Train one pre-validated sample. Replication counts are drawn for all
    /// members, in member order, before any member trains.
    fn train_unchecked(&mut self, point: &[f32], label: usize) {
        let mut counts = Vec::with_capacity(self.members.len());
        self.bagger.draw_counts(self.members.len(), &mut counts);

        let mut projected = Vec::new();
        for (member, &count) in self.members.iter_mut().zip(&counts) {
            if count == 0 {
                continue;
            }
            project(point, &member.dims, &mut projected);
            for _ in 0..count {
                member.learner.train(&projected, label);
            }
        }
    }

    // ========================================================================
    // Classification
    // ========================================================================

    /// Predict the label for one sample by plurality vote.
    pub fn classify(&self, point: &[f32]) -> Result<usize, ForestError> {
        self.validate_width(point.len())?;
        Ok(self.vote(point).0)
    }

    /// Predict the label and the fraction of members voting for it.
    pub fn classify_with_probability(&self, point: &[f32]) -> Result<(usize, f64), ForestError> {
        self.validate_width(point.len())?;
        Ok(self.vote(point))
    }

    /// Per-class probability vector averaged across members.
    pub fn class_probabilities(&self, point: &[f32]) -> Result<Vec<f64>, ForestError> {
        self.validate_width(point.len())?;

        let mut averaged = vec![0.0; self.params.num_classes];
        let mut member_probs = vec![0.0; self.params.num_classes];
        let mut projected = Vec::new();
        for member in &self.members {
            project(point, &member.dims, &mut projected);
            member
                .learner
                .class_probabilities(&projected, &mut member_probs);
            for (avg, &p) in averaged.iter_mut().zip(&member_probs) {
                *avg += p;
            }
        }
        for avg in &mut averaged {
            *avg /= self.members.len() as f64;
        }
        Ok(averaged)
    }

    /// Predict labels for every row, in row order.
    pub fn classify_batch(&self, data: &DenseMatrix<f32>) -> Result<Vec<usize>, ForestError>
    where
        L: Sync,
    {
        self.validate_width(data.num_cols())?;
        Ok((0..data.num_rows())
            .into_par_iter()
            .map(|row| self.vote(data.row_slice(row)).0)
            .collect())
    }

    /// Predict labels and vote fractions for every row, in row order.
    pub fn classify_batch_with_probabilities(
        &self,
        data: &DenseMatrix<f32>,
    ) -> Result<(Vec<usize>, Vec<f64>), ForestError>
    where
        L: Sync,
    {
        self.validate_width(data.num_cols())?;
        Ok((0..data.num_rows())
            .into_par_iter()
            .map(|row| self.vote(data.row_slice(row)))
            .unzip())
    }

    /// Plurality vote over members' top labels for a pre-validated point.
    /// Ties resolve to the lowest label index.
    fn vote(&self, point: &[f32]) -> (usize, f64) {
        let mut votes = vec![0u32; self.params.num_classes];
        let mut projected = Vec::new();
        for member in &self.members {
            project(point, &member.dims, &mut projected);
            votes[member.learner.classify(&projected)] += 1;
        }

        let mut winner = 0;
        for (label, &count) in votes.iter().enumerate() {
            if count > votes[winner] {
                winner = label;
            }
        }
        (winner, f64::from(votes[winner]) / self.members.len() as f64)
    }

    // ========================================================================
    // Validation
    // ========================================================================

    fn validate_width(&self, got: usize) -> Result<(), ForestError> {
        let expected = self.schema.n_dims();
        if got != expected {
            return Err(ForestError::DimensionMismatch { expected, got });
        }
        Ok(())
    }

    fn validate_label(&self, label: usize) -> Result<(), ForestError> {
        if label >= self.params.num_classes {
            return Err(ForestError::LabelRange {
                label,
                num_classes: self.params.num_classes,
            });
        }
        Ok(())
    }
}

// ============================================================================
// Persistence
// ============================================================================

impl<L> StreamingForest<L>
where
    L: StreamingLearner + Serialize + DeserializeOwned,
{
    /// Serialize the forest to bytes.
    ///
    /// An owned schema is embedded; a shared schema is stored as a reference
    /// marker and must be re-supplied on restore. Member learner state is
    /// delegated to each learner's own serde implementation.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PersistError> {
        let schema = match self.ownership {
            SchemaOwnership::Owned => SchemaPayload::Embedded(self.schema.as_ref().clone()),
            SchemaOwnership::Shared => SchemaPayload::Reference {
                n_dims: self.schema.n_dims() as u32,
            },
        };
        let members = self
            .members
            .iter()
            .map(|member| {
                Ok(MemberPayload {
                    dimensions: member.dims.clone(),
                    learner: postcard::to_allocvec(&member.learner)?,
                })
            })
            .collect::<Result<Vec<_>, PersistError>>()?;

        encode_payload(&Payload::V1(PayloadV1 {
            params: self.params.clone(),
            schema,
            members,
            usage_counts: self.usage.clone(),
            bagger: self.bagger.clone(),
        }))
    }

    /// Restore a forest whose serialized state embeds its schema.
    ///
    /// Fails with [`PersistError::SchemaRequired`] if the state carries only
    /// a reference marker.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PersistError> {
        let Payload::V1(payload) = decode_payload(bytes)?;
        let schema = match &payload.schema {
            SchemaPayload::Embedded(embedded) => Arc::new(embedded.clone()),
            SchemaPayload::Reference { .. } => return Err(PersistError::SchemaRequired),
        };
        Self::restore(payload, schema, SchemaOwnership::Owned)
    }

    /// Restore a forest serialized with a shared schema, supplying the
    /// schema it referenced.
    ///
    /// The supplied schema is used only when the state carries a reference
    /// marker; an embedded schema takes precedence. Fails with
    /// [`PersistError::SchemaMismatch`] if the dimension counts disagree.
    pub fn from_bytes_with_schema(
        bytes: &[u8],
        schema: Arc<DatasetSchema>,
    ) -> Result<Self, PersistError> {
        let Payload::V1(payload) = decode_payload(bytes)?;
        let (resolved, ownership) = match &payload.schema {
            SchemaPayload::Embedded(embedded) => {
                (Arc::new(embedded.clone()), SchemaOwnership::Owned)
            }
            SchemaPayload::Reference { n_dims } => {
                let expected = *n_dims as usize;
                if schema.n_dims() != expected {
                    return Err(PersistError::SchemaMismatch {
                        expected,
                        got: schema.n_dims(),
                    });
                }
                (schema, SchemaOwnership::Shared)
            }
        };
        Self::restore(payload, resolved, ownership)
    }

    fn restore(
        payload: PayloadV1,
        schema: Arc<DatasetSchema>,
        ownership: SchemaOwnership,
    ) -> Result<Self, PersistError> {
        let members = payload
            .members
            .into_iter()
            .map(|member| {
                Ok(ForestMember {
                    learner: postcard::from_bytes(&member.learner)?,
                    dims: member.dimensions,
                })
            })
            .collect::<Result<Vec<_>, PersistError>>()?;

        let logger = TrainLogger::new(payload.params.verbosity);
        Ok(Self {
            params: payload.params,
            schema,
            ownership,
            members,
            usage: payload.usage_counts,
            bagger: payload.bagger,
            logger,
        })
    }
}

/// Extract the subset coordinates of `point` into `buf`, in subset order.
fn project(point: &[f32], dims: &[u32], buf: &mut Vec<f32>) {
    buf.clear();
    buf.extend(dims.iter().map(|&dim| point[dim as usize]));
}
