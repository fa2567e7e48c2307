//! Target and shadow model runs.
//!
//! The target model's records become the attack test split. Shadow models
//! imitate the target on data drawn from the disjoint shadow pools; their
//! concatenated records become the attack training split.

use crate::attack::extract::train_and_extract;
use crate::attack::partition::sample_from;
use crate::datasets::ImageDataset;
use mia_core::{AttackSplit, ExperimentConfig, Result};
use rand::Rng;
use std::path::PathBuf;

/// Checkpoint file name for the target model.
pub const TARGET_MODEL_FILE: &str = "target_model.safetensors";

/// Checkpoint path for shadow model `i` under `config.output_dir`.
pub fn shadow_checkpoint(config: &ExperimentConfig, i: usize) -> PathBuf {
    config
        .output_dir
        .join(format!("shadow_model_{i}.safetensors"))
}

/// Train the target model on `train_indices`, test it on `test_indices`.
pub fn train_target_model<R: Rng + ?Sized>(
    dataset: &ImageDataset,
    train_indices: &[usize],
    test_indices: &[usize],
    config: &ExperimentConfig,
    rng: &mut R,
) -> Result<AttackSplit> {
    tracing::info!(
        train = train_indices.len(),
        test = test_indices.len(),
        architecture = %config.target.architecture,
        "Training target model"
    );
    let checkpoint = config
        .save_model
        .then(|| config.output_dir.join(TARGET_MODEL_FILE));
    let split = train_and_extract(
        dataset,
        train_indices,
        test_indices,
        &config.target,
        checkpoint.as_deref(),
        rng,
    )?;
    tracing::info!(records = split.len(), "Done training target model");
    Ok(split)
}

/// Train `config.n_shadow` shadow models and concatenate their records.
///
/// Every shadow draws `config.train_size` training indices from
/// `train_pool` and `config.shadow_test_size()` test indices from
/// `test_pool`, each without replacement and independently of the other
/// shadows.
pub fn train_shadow_models<R: Rng + ?Sized>(
    dataset: &ImageDataset,
    train_pool: &[usize],
    test_pool: &[usize],
    config: &ExperimentConfig,
    rng: &mut R,
) -> Result<AttackSplit> {
    let mut records = AttackSplit::new(dataset.num_classes);
    let test_size = config.shadow_test_size();

    for i in 0..config.n_shadow {
        tracing::info!(shadow = i, "Training shadow model");
        let train_indices = sample_from(train_pool, config.train_size, rng)?;
        let test_indices = sample_from(test_pool, test_size, rng)?;
        let checkpoint = config.save_model.then(|| shadow_checkpoint(config, i));

        let split = train_and_extract(
            dataset,
            &train_indices,
            &test_indices,
            &config.target,
            checkpoint.as_deref(),
            rng,
        )?;
        records.extend(&split)?;
    }

    tracing::info!(
        shadows = config.n_shadow,
        records = records.len(),
        "Done training shadow models"
    );
    Ok(records)
}
