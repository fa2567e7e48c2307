//! Trainable classifiers for membership inference experiments.
//!
//! Provides the target/shadow/attack network architectures built on
//! `candle-nn`, checkpoint persistence, compute device selection, and a
//! parameter fingerprint for identifying trained weights.
//!
//! # Modules
//!
//! - [`network`] — [`Classifier`] and the per-architecture layer stacks
//! - [`device`] — CUDA / Metal / CPU selection
//! - [`fingerprint`] — randomised projection hash of model parameters

pub mod device;
pub mod fingerprint;
pub mod network;

pub use device::{seed_device, select_device, select_seeded_device};
pub use fingerprint::model_fingerprint;
pub use network::{CheckpointMeta, Classifier, ModelSpec};

use mia_core::MiaError;

/// Attach context to a `candle` error and convert it into [`MiaError::Model`].
pub trait CandleResultExt<T> {
    fn model_ctx(self, context: &str) -> mia_core::Result<T>;
}

impl<T> CandleResultExt<T> for candle_core::Result<T> {
    fn model_ctx(self, context: &str) -> mia_core::Result<T> {
        self.map_err(|e| MiaError::Model(format!("{context}: {e}")))
    }
}
