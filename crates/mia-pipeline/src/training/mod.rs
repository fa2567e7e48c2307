//! Classifier training infrastructure.
//!
//! Provides the mini-batch data plumbing, the training loop used for target,
//! shadow, and attack models, the metrics reported on them, and the
//! single-model training workflow behind `mia train`.

pub mod data;
pub mod metrics;
pub mod standalone;
pub mod trainer;
