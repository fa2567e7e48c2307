//! Membership-labelled confidence vectors from a trained model.
//!
//! Inference runs over the model's own training rows (labelled [`MEMBER`])
//! and over rows it never saw (labelled [`NON_MEMBER`]). Each subset is read
//! in a shuffled order and its trailing partial batch is dropped, so every
//! batch contributes exactly `batch_size` records.

use crate::datasets::ImageDataset;
use crate::training::data::{BatchIterator, Subset};
use crate::training::trainer::train_classifier;
use mia_core::{AttackSplit, ConfidenceRecord, Result, TrainParams, MEMBER, NON_MEMBER};
use mia_models::{CandleResultExt, Classifier, ModelSpec};
use rand::Rng;
use std::path::Path;

/// Collect confidence records for `members` then `non_members`.
pub fn extract_confidences<R: Rng + ?Sized>(
    model: &Classifier,
    members: &Subset,
    non_members: &Subset,
    batch_size: usize,
    rng: &mut R,
) -> Result<AttackSplit> {
    let mut split = AttackSplit::new(model.spec().num_classes);
    for (subset, membership) in [(members, MEMBER), (non_members, NON_MEMBER)] {
        let mut batches = BatchIterator::over(subset, batch_size).drop_last(true);
        batches.reshuffle(rng);
        tracing::debug!(membership, rows = batches.num_rows(), "extracting confidences");
        while let Some((inputs, labels)) = batches.next_batch()? {
            let confidences: Vec<Vec<f32>> = model
                .predict_proba(&inputs)?
                .detach()
                .to_vec2()
                .model_ctx("confidences to vec")?;
            let classes: Vec<i64> = labels.to_vec1().model_ctx("classes to vec")?;
            for (confidences, class) in confidences.into_iter().zip(classes) {
                split.push(&ConfidenceRecord {
                    confidences,
                    membership,
                    true_class: class as i32,
                })?;
            }
        }
    }
    Ok(split)
}

/// Train one model on `train_indices` and extract its membership records.
///
/// `train_indices` select from the dataset's training split (members),
/// `test_indices` from its test split (non-members, also used as the
/// held-out split while training).
pub fn train_and_extract<R: Rng + ?Sized>(
    dataset: &ImageDataset,
    train_indices: &[usize],
    test_indices: &[usize],
    params: &TrainParams,
    checkpoint: Option<&Path>,
    rng: &mut R,
) -> Result<AttackSplit> {
    let train = Subset::from_indices(&dataset.train_images, &dataset.train_labels, train_indices)?;
    let test = Subset::from_indices(&dataset.test_images, &dataset.test_labels, test_indices)?;

    let spec = ModelSpec::for_images(params, dataset.input_shape, dataset.num_classes);
    let trained = train_classifier(spec, params, &train, Some(&test), checkpoint, rng)?;
    if let Some(last) = trained.history.last() {
        tracing::info!(
            epochs = last.epoch,
            train_loss = ?last.train_loss,
            heldout_accuracy = ?last.heldout_accuracy,
            "model trained"
        );
    }

    extract_confidences(&trained.classifier, &train, &test, params.batch_size, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::synthetic;
    use candle_core::Device;
    use mia_core::{Architecture, InputShape};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn params(batch_size: usize) -> TrainParams {
        TrainParams {
            epochs: 1,
            batch_size,
            learning_rate: 0.01,
            weight_decay: 0.0,
            hidden_dim: 8,
            architecture: Architecture::Mlp,
        }
    }

    #[test]
    fn test_extract_lengths_drop_partial_batches() {
        let ds = synthetic(60, 30, InputShape::flat(5), 3, 1, &Device::Cpu).unwrap();
        let p = params(10);
        let spec = ModelSpec::for_images(&p, ds.input_shape, ds.num_classes);
        let model = Classifier::new_trainable(spec, &Device::Cpu).unwrap();

        let members_idx: Vec<usize> = (0..37).collect();
        let non_members_idx: Vec<usize> = (0..14).collect();
        let members = Subset::from_indices(&ds.train_images, &ds.train_labels, &members_idx).unwrap();
        let non_members =
            Subset::from_indices(&ds.test_images, &ds.test_labels, &non_members_idx).unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let split = extract_confidences(&model, &members, &non_members, 10, &mut rng).unwrap();

        // floor(37/10)*10 + floor(14/10)*10
        assert_eq!(split.len(), 40);
        assert_eq!(split.count_label(MEMBER), 30);
        assert_eq!(split.count_label(NON_MEMBER), 10);
        assert_eq!(split.feature_dim, 3);
        assert_eq!(split.features.len(), 40 * 3);
        assert!(split.classes.iter().all(|c| (0..3).contains(c)));
        for i in 0..split.len() {
            let sum: f32 = split.row(i).iter().sum();
            assert!((sum - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_train_and_extract_counts() {
        let ds = synthetic(100, 40, InputShape::flat(4), 2, 2, &Device::Cpu).unwrap();
        let train_idx: Vec<usize> = (0..50).collect();
        let test_idx: Vec<usize> = (0..20).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let split =
            train_and_extract(&ds, &train_idx, &test_idx, &params(10), None, &mut rng).unwrap();
        assert_eq!(split.count_label(MEMBER), 50);
        assert_eq!(split.count_label(NON_MEMBER), 20);
    }
}
