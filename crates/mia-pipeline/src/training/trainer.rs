//! Training loop shared by target, shadow, and attack models.

use crate::training::data::{BatchIterator, Subset};
use crate::training::metrics::accuracy_score;
use candle_core::Tensor;
use candle_nn::Optimizer;
use mia_core::{Result, TrainParams};
use mia_models::{CandleResultExt, Classifier, ModelSpec};
use rand::Rng;
use std::path::Path;

/// Rows per forward pass when evaluating or predicting.
const EVAL_BATCH_SIZE: usize = 512;

/// Per-epoch metrics logged during training.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochMetrics {
    pub epoch: usize,
    /// Mean batch loss; `None` when the epoch ran no batch.
    pub train_loss: Option<f64>,
    pub heldout_accuracy: Option<f64>,
}

/// A trained classifier together with its training history.
pub struct TrainedModel {
    pub classifier: Classifier,
    pub history: Vec<EpochMetrics>,
    pub best_accuracy: Option<f64>,
}

/// Train a fresh classifier for `params.epochs` epochs.
///
/// Each epoch visits every training row in a new shuffled order; the last
/// batch may be smaller than `params.batch_size`. When `heldout` is given, accuracy on it is
/// measured after every epoch and, if `checkpoint` is also given, the
/// weights with the best accuracy so far are written there. The returned
/// model always holds the final-epoch weights.
pub fn train_classifier<R: Rng + ?Sized>(
    spec: ModelSpec,
    params: &TrainParams,
    train: &Subset,
    heldout: Option<&Subset>,
    checkpoint: Option<&Path>,
    rng: &mut R,
) -> Result<TrainedModel> {
    let device = train.inputs.device().clone();
    let model = Classifier::new_trainable(spec, &device)?;

    let mut optimizer = candle_nn::AdamW::new(
        model.varmap().all_vars(),
        candle_nn::ParamsAdamW {
            lr: params.learning_rate,
            weight_decay: params.weight_decay,
            ..Default::default()
        },
    )
    .model_ctx("Failed to create optimizer")?;

    let mut batch_iter = BatchIterator::over(train, params.batch_size);
    if batch_iter.num_batches() == 0 {
        tracing::warn!("empty training subset; model stays at initialisation");
    }

    let mut best_accuracy: Option<f64> = None;
    let mut history = Vec::with_capacity(params.epochs);

    for epoch in 0..params.epochs {
        batch_iter.reshuffle(rng);

        let mut epoch_loss = 0.0;
        let mut batch_count = 0usize;

        while let Some((batch_inputs, batch_labels)) = batch_iter.next_batch()? {
            let logits = model.forward_logits(&batch_inputs)?;
            let loss = candle_nn::loss::cross_entropy(&logits, &batch_labels)
                .model_ctx("Loss computation failed")?;
            optimizer
                .backward_step(&loss)
                .model_ctx("Backward step failed")?;

            epoch_loss += f64::from(loss.to_scalar::<f32>().model_ctx("Loss scalar failed")?);
            batch_count += 1;
        }

        let train_loss = (batch_count > 0).then(|| epoch_loss / batch_count as f64);

        let heldout_accuracy = match heldout {
            Some(split) if !split.is_empty() => Some(evaluate(&model, split)?),
            _ => None,
        };

        let improved = match (heldout_accuracy, best_accuracy) {
            (Some(acc), Some(best)) => acc > best,
            (Some(_), None) => true,
            _ => false,
        };
        if improved {
            best_accuracy = heldout_accuracy;
            if let Some(path) = checkpoint {
                model.save(path, params)?;
                tracing::debug!(path = %path.display(), "saved best checkpoint");
            }
        }

        tracing::info!(
            epoch = epoch + 1,
            train_loss = ?train_loss,
            heldout_accuracy = ?heldout_accuracy,
            best = improved,
            "epoch complete"
        );

        history.push(EpochMetrics {
            epoch: epoch + 1,
            train_loss,
            heldout_accuracy,
        });
    }

    if let (Some(path), None) = (checkpoint, best_accuracy) {
        model.save(path, params)?;
    }

    Ok(TrainedModel {
        classifier: model,
        history,
        best_accuracy,
    })
}

/// Arg-max predictions for every row of `inputs`.
pub fn predict(model: &Classifier, inputs: &Tensor) -> Result<Vec<i64>> {
    let n = inputs.dim(0).model_ctx("predict dim")?;
    let mut preds = Vec::with_capacity(n);
    let mut start = 0;
    while start < n {
        let len = EVAL_BATCH_SIZE.min(n - start);
        let chunk = inputs.narrow(0, start, len).model_ctx("predict chunk")?;
        preds.extend(model.predict_classes(&chunk)?);
        start += len;
    }
    Ok(preds)
}

/// Accuracy of `model` on every row of `subset` (no rows dropped).
pub fn evaluate(model: &Classifier, subset: &Subset) -> Result<f64> {
    let preds = predict(model, &subset.inputs)?;
    Ok(accuracy_score(&preds, &subset.label_vec()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;
    use mia_core::{Architecture, InputShape};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Two well-separated clusters along the first axis.
    fn separable(n: usize) -> Subset {
        let device = Device::Cpu;
        let mut values = Vec::with_capacity(n * 2);
        let mut labels = Vec::with_capacity(n);
        for i in 0..n {
            let class = (i % 2) as i64;
            let sign = if class == 0 { -1.0 } else { 1.0 };
            values.push(sign * 2.0);
            values.push((i as f32 * 0.01).sin());
            labels.push(class);
        }
        Subset {
            inputs: Tensor::from_vec(values, (n, 2), &device).unwrap(),
            labels: Tensor::from_vec(labels, n, &device).unwrap(),
        }
    }

    fn params() -> TrainParams {
        TrainParams {
            epochs: 15,
            batch_size: 8,
            learning_rate: 0.05,
            weight_decay: 0.0,
            hidden_dim: 8,
            architecture: Architecture::Mlp,
        }
    }

    #[test]
    fn test_train_learns_separable_data() {
        let data = separable(64);
        let p = params();
        let spec = ModelSpec::for_images(&p, InputShape::flat(2), 2);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let trained = train_classifier(spec, &p, &data, Some(&data), None, &mut rng).unwrap();

        assert_eq!(trained.history.len(), 15);
        assert!(trained.history.iter().all(|m| m.heldout_accuracy.is_some()));
        let acc = evaluate(&trained.classifier, &data).unwrap();
        assert!(acc > 0.9, "accuracy {acc}");
    }

    #[test]
    fn test_train_without_heldout_has_no_accuracy() {
        let data = separable(16);
        let p = TrainParams {
            epochs: 2,
            architecture: Architecture::Softmax,
            ..params()
        };
        let spec = ModelSpec::for_attack(&p, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let trained = train_classifier(spec, &p, &data, None, None, &mut rng).unwrap();
        assert!(trained.best_accuracy.is_none());
        assert!(trained.history.iter().all(|m| m.heldout_accuracy.is_none()));
    }

    #[test]
    fn test_subset_smaller_than_batch_still_trains() {
        let data = separable(6);
        let p = TrainParams {
            epochs: 5,
            batch_size: 10,
            ..params()
        };
        let spec = ModelSpec::for_images(&p, InputShape::flat(2), 2);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let trained = train_classifier(spec, &p, &data, None, None, &mut rng).unwrap();

        let losses: Vec<f64> = trained
            .history
            .iter()
            .map(|m| m.train_loss.unwrap())
            .collect();
        assert_eq!(losses.len(), 5);
        assert!(losses.iter().all(|l| *l > 0.0));
        assert!(losses[4] < losses[0], "losses {losses:?}");
    }

    #[test]
    fn test_empty_subset_reports_no_loss() {
        let data = separable(0);
        let p = TrainParams {
            epochs: 2,
            ..params()
        };
        let spec = ModelSpec::for_images(&p, InputShape::flat(2), 2);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let trained = train_classifier(spec, &p, &data, None, None, &mut rng).unwrap();
        assert!(trained.history.iter().all(|m| m.train_loss.is_none()));
    }

    #[test]
    fn test_checkpoint_written_on_improvement() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best.safetensors");
        let data = separable(32);
        let p = TrainParams {
            epochs: 3,
            ..params()
        };
        let spec = ModelSpec::for_images(&p, InputShape::flat(2), 2);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        train_classifier(spec, &p, &data, Some(&data), Some(&path), &mut rng).unwrap();
        assert!(path.exists());
        assert!(mia_models::network::meta_path(&path).exists());
    }

    #[test]
    fn test_predict_covers_all_rows() {
        let data = separable(1100);
        let p = params();
        let spec = ModelSpec::for_images(&p, InputShape::flat(2), 2);
        let model = Classifier::new_trainable(spec, &Device::Cpu).unwrap();
        let preds = predict(&model, &data.inputs).unwrap();
        assert_eq!(preds.len(), 1100);
    }
}
