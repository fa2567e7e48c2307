//! Single-model training with a validation hold-out.
//!
//! Trains one classifier on a dataset's full training split minus a shuffled
//! validation fraction, keeps the best-validation checkpoint on disk,
//! measures test accuracy, and fingerprints the final weights.

use crate::datasets::ImageDataset;
use crate::training::data::Subset;
use crate::training::trainer::{evaluate, train_classifier, EpochMetrics};
use mia_core::{MiaError, Result, TrainParams};
use mia_models::{model_fingerprint, ModelSpec};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};

/// File name of the best-validation checkpoint inside the output directory.
pub const BEST_MODEL_FILE: &str = "best_model.safetensors";

/// Outcome of [`train_standalone`].
#[derive(Debug, Clone)]
pub struct StandaloneReport {
    pub history: Vec<EpochMetrics>,
    pub best_val_accuracy: Option<f64>,
    pub test_accuracy: f64,
    pub fingerprint: String,
    pub checkpoint: PathBuf,
}

/// Train on `dataset` holding out `val_ratio` of the training rows.
pub fn train_standalone(
    dataset: &ImageDataset,
    params: &TrainParams,
    val_ratio: f64,
    output_dir: &Path,
    seed: u64,
) -> Result<StandaloneReport> {
    if !(0.0..1.0).contains(&val_ratio) {
        return Err(MiaError::Config(format!(
            "val_ratio must be in [0, 1), got {val_ratio}"
        )));
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let n = dataset.train_len();
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut rng);
    let split = (val_ratio * n as f64).floor() as usize;
    let (val_idx, train_idx) = indices.split_at(split);

    tracing::info!(
        dataset = %dataset.kind,
        train = train_idx.len(),
        val = val_idx.len(),
        architecture = %params.architecture,
        "Training standalone model"
    );

    let train = Subset::from_indices(&dataset.train_images, &dataset.train_labels, train_idx)?;
    let val = Subset::from_indices(&dataset.train_images, &dataset.train_labels, val_idx)?;
    let test_idx: Vec<usize> = (0..dataset.test_len()).collect();
    let test = Subset::from_indices(&dataset.test_images, &dataset.test_labels, &test_idx)?;

    std::fs::create_dir_all(output_dir)?;
    let checkpoint = output_dir.join(BEST_MODEL_FILE);
    let spec = ModelSpec::for_images(params, dataset.input_shape, dataset.num_classes);
    let trained = train_classifier(spec, params, &train, Some(&val), Some(&checkpoint), &mut rng)?;

    let test_accuracy = evaluate(&trained.classifier, &test)?;
    let fingerprint = model_fingerprint(&trained.classifier, seed)?;
    tracing::info!(test_accuracy, %fingerprint, "Standalone training done");

    Ok(StandaloneReport {
        history: trained.history,
        best_val_accuracy: trained.best_accuracy,
        test_accuracy,
        fingerprint,
        checkpoint,
    })
}
