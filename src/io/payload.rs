//! Payload structures for the native storage format.
//!
//! These structs are designed for compact Postcard serialization. They
//! mirror the runtime forest but keep member learner state as opaque bytes,
//! delegated to each learner's own serde implementation.

use serde::{Deserialize, Serialize};

use crate::data::DatasetSchema;
use crate::forest::{ForestParams, OnlineBagger};

/// Version-tagged payload enum for forward compatibility.
///
/// New format versions add new variants rather than modifying existing ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Payload {
    /// Version 1 payload format.
    V1(PayloadV1),
}

/// Version 1 payload structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadV1 {
    /// Construction parameters (forest size, class count, seed, policies).
    pub params: ForestParams,
    /// The schema, embedded or referenced.
    pub schema: SchemaPayload,
    /// Per-member state, in member order.
    pub members: Vec<MemberPayload>,
    /// Per-dimension usage counts from construction.
    pub usage_counts: Vec<u32>,
    /// Bagging generator state, so a restored forest continues the same
    /// replication draw sequence.
    pub bagger: OnlineBagger,
}

/// How the schema is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SchemaPayload {
    /// Forest-owned schema, stored inline.
    Embedded(DatasetSchema),
    /// Caller-owned schema: only the dimension count is recorded, and the
    /// caller must re-supply the schema on restore.
    Reference { n_dims: u32 },
}

/// One ensemble member: its dimension subset plus opaque learner state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberPayload {
    /// Sorted dimension indices this member trains on.
    pub dimensions: Vec<u32>,
    /// The member's learner, serialized by its own serde implementation.
    pub learner: Vec<u8>,
}
