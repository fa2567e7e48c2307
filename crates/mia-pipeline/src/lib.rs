//! Shadow-model membership inference pipeline
//!
//! Trains a target classifier on part of an image dataset, trains shadow
//! classifiers on disjoint data to imitate it, turns every model's
//! confidence vectors into member/non-member training data, and fits one
//! binary attack model per class to predict whether an example was in the
//! target's training set.
//!
//! # Modules
//!
//! - [`config`] — YAML experiment configuration
//! - [`datasets`] — MNIST / Fashion-MNIST / CIFAR-10 / synthetic loaders
//! - [`training`] — batching, training loop, metrics, standalone training
//! - [`attack`] — partitioning, extraction, shadows, balancing, attack models

pub mod attack;
pub mod config;
pub mod datasets;
pub mod training;

/// Re-export commonly used types for pipeline callers.
pub mod prelude {
    pub use crate::attack::classifier::{AttackReport, ClassAttackResult};
    pub use crate::attack::pipeline::{run_attack_only, run_full_attack, AttackRun};
    pub use crate::datasets::{load_dataset, ImageDataset};
    pub use crate::training::metrics::ClassificationReport;
    pub use crate::training::standalone::{train_standalone, StandaloneReport};
    pub use mia_core::{
        Architecture, AttackDataset, AttackSplit, DatasetKind, ExperimentConfig, MiaError,
        TrainParams,
    };
}
