//! The ensemble coordinator and its supporting pieces.
//!
//! # Overview
//!
//! - [`StreamingForest`]: the forest itself — train/classify over streams
//!   and batches
//! - [`ForestParams`]: construction parameters with a fluent builder
//! - [`OnlineBagger`]: Poisson(1) replication counts per member per sample
//! - [`SubsetSize`]: per-member dimension subset sizing policy
//! - [`Verbosity`]: batch-training log levels

mod bagging;
mod dimensions;
mod forest;
mod logger;

pub use bagging::OnlineBagger;
pub use dimensions::SubsetSize;
pub use forest::{ForestParams, ForestParamsBuilder, StreamingForest};
pub use logger::Verbosity;
