//! Persistence for trained forests.
//!
//! Serialized state consists of a small versioned header
//! ([`native`]) around a Postcard-encoded payload ([`payload`]). The
//! forest-level entry points are
//! [`StreamingForest::to_bytes`](crate::forest::StreamingForest::to_bytes),
//! [`StreamingForest::from_bytes`](crate::forest::StreamingForest::from_bytes),
//! and
//! [`StreamingForest::from_bytes_with_schema`](crate::forest::StreamingForest::from_bytes_with_schema).

pub mod native;
pub mod payload;

pub use native::PersistError;
