//! Leveled progress logging for batch training.

use serde::{Deserialize, Serialize};

/// How chatty training should be.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum Verbosity {
    /// No output.
    Silent,
    /// One summary line per batch.
    #[default]
    Info,
    /// Periodic progress lines during a batch.
    Debug,
}

/// Writes leveled progress messages to stderr.
#[derive(Debug, Clone)]
pub(crate) struct TrainLogger {
    verbosity: Verbosity,
}

impl TrainLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    pub fn info(&self, message: &str) {
        if self.verbosity >= Verbosity::Info {
            eprintln!("[streamforest] {message}");
        }
    }

    pub fn debug(&self, message: &str) {
        if self.verbosity >= Verbosity::Debug {
            eprintln!("[streamforest] {message}");
        }
    }
}
