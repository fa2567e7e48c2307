//! End-to-end and attack-only runs.
//!
//! A full run seeds one RNG from the configuration and threads it through
//! every sampling decision: partitioning, shadow subset draws, batch order,
//! and balancing. The same seed and data therefore reproduce the same
//! partitions and attack data.

use crate::attack::balance::balance_membership;
use crate::attack::classifier::{train_attack_models, AttackReport};
use crate::attack::partition::partition_indices;
use crate::attack::shadow::{train_shadow_models, train_target_model};
use crate::attack::store::{load_attack_dataset, save_attack_dataset};
use crate::datasets::ImageDataset;
use candle_core::Device;
use mia_core::{AttackDataset, ExperimentConfig, MiaError, Result};
use mia_models::seed_device;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Attack data produced or loaded by a run, and the attack results.
#[derive(Debug, Clone)]
pub struct AttackRun {
    pub data: AttackDataset,
    pub report: AttackReport,
}

/// Train target and shadow models on `dataset`, then the attack models.
///
/// With `config.save_model`, checkpoints and both attack splits are written
/// to `config.output_dir`.
pub fn run_full_attack(config: &ExperimentConfig, dataset: &ImageDataset) -> Result<AttackRun> {
    config.validate()?;
    let device = dataset.train_images.device().clone();
    seed_device(&device, config.seed);
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    let train_part = partition_indices(dataset.train_len(), config.train_size, &mut rng)?;
    let test_part = partition_indices(dataset.test_len(), config.test_size, &mut rng)?;
    tracing::info!(
        target_train = train_part.target.len(),
        shadow_train_pool = train_part.shadow.len(),
        target_test = test_part.target.len(),
        shadow_test_pool = test_part.shadow.len(),
        "Partitioned dataset"
    );

    if config.save_model {
        std::fs::create_dir_all(&config.output_dir)?;
    }

    let test = train_target_model(
        dataset,
        &train_part.target,
        &test_part.target,
        config,
        &mut rng,
    )?;
    let train = train_shadow_models(
        dataset,
        &train_part.shadow,
        &test_part.shadow,
        config,
        &mut rng,
    )?;
    let data = AttackDataset { train, test };
    if !data.is_populated() {
        return Err(MiaError::Data(format!(
            "no attack records (train {}, test {}); batch size {} exceeds a subset",
            data.train.len(),
            data.test.len(),
            config.target.batch_size
        )));
    }

    if config.save_model {
        save_attack_dataset(&config.output_dir, &data)?;
    }

    tracing::info!("Training attack model");
    let report = attack_from_data(&data, config, &device, &mut rng)?;
    tracing::info!("Done training attack model");
    Ok(AttackRun { data, report })
}

/// Train attack models on attack data previously saved to
/// `config.output_dir`.
///
/// Fails with [`mia_core::MiaError::NotFound`] when the saved splits are
/// missing.
pub fn run_attack_only(config: &ExperimentConfig, device: &Device) -> Result<AttackRun> {
    config.validate()?;
    seed_device(device, config.seed);
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let data = load_attack_dataset(&config.output_dir)?;
    tracing::info!(
        train = data.train.len(),
        test = data.test.len(),
        dir = %config.output_dir.display(),
        "Loaded attack data"
    );
    let report = attack_from_data(&data, config, device, &mut rng)?;
    Ok(AttackRun { data, report })
}

/// Balance both splits and train the per-class attack models.
pub fn attack_from_data<R: Rng + ?Sized>(
    data: &AttackDataset,
    config: &ExperimentConfig,
    device: &Device,
    rng: &mut R,
) -> Result<AttackReport> {
    let balanced = AttackDataset {
        train: balance_membership(&data.train, config.balance_ratio, rng)?,
        test: balance_membership(&data.test, config.balance_ratio, rng)?,
    };
    train_attack_models(&balanced, &config.attack, device, rng)
}
