//! Per-class binary attack models.
//!
//! Membership signal differs by class, so one member/non-member classifier
//! is trained per true class on that class's confidence vectors and
//! evaluated on the same class's test rows. Predictions from all classes are
//! pooled for the aggregate accuracy and classification report.

use crate::training::data::Subset;
use crate::training::metrics::{
    accuracy_score, classification_report, compute_validation_metrics, ClassificationReport,
};
use crate::training::trainer::{predict, train_classifier};
use candle_core::Device;
use mia_core::{AttackDataset, MiaError, Result, TrainParams};
use mia_models::ModelSpec;
use rand::Rng;

/// Outcome for one true class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassAttackResult {
    pub class: i32,
    pub train_samples: usize,
    pub test_samples: usize,
    /// `None` when the class has no test rows.
    pub accuracy: Option<f64>,
}

/// Per-class and pooled attack results.
#[derive(Debug, Clone)]
pub struct AttackReport {
    pub per_class: Vec<ClassAttackResult>,
    pub true_labels: Vec<i64>,
    pub predictions: Vec<i64>,
    /// Test rows of classes with no attack model; excluded from the pooled
    /// predictions.
    pub unscored_test_rows: usize,
    /// Accuracy over all pooled test predictions.
    pub accuracy: f64,
    pub report: ClassificationReport,
}

impl std::fmt::Display for AttackReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:-<60}", "")?;
        writeln!(
            f,
            "{:>8} {:>10} {:>10} {:>10}",
            "class", "train", "test", "accuracy"
        )?;
        for c in &self.per_class {
            let acc = c
                .accuracy
                .map(|a| format!("{a:.4}"))
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                f,
                "{:>8} {:>10} {:>10} {:>10}",
                c.class, c.train_samples, c.test_samples, acc
            )?;
        }
        writeln!(f, "{:-<60}", "")?;
        if self.unscored_test_rows > 0 {
            writeln!(
                f,
                "Unscored test rows (class unseen in training): {}",
                self.unscored_test_rows
            )?;
        }
        writeln!(f, "Final attack accuracy: {:.2}", self.accuracy)?;
        write!(f, "{}", self.report)
    }
}

/// Train one attack model per class present in `data.train`.
///
/// `data` is expected to be balanced already. Test rows whose class never
/// appears in the training split receive no prediction and are counted in
/// [`AttackReport::unscored_test_rows`].
pub fn train_attack_models<R: Rng + ?Sized>(
    data: &AttackDataset,
    params: &TrainParams,
    device: &Device,
    rng: &mut R,
) -> Result<AttackReport> {
    if data.train.is_empty() {
        return Err(MiaError::Data("attack training split is empty".to_string()));
    }
    if !data.test.is_empty() && data.test.feature_dim != data.train.feature_dim {
        return Err(MiaError::Data(format!(
            "attack train/test width mismatch: {} vs {}",
            data.train.feature_dim, data.test.feature_dim
        )));
    }

    let mut per_class = Vec::new();
    let mut true_labels = Vec::new();
    let mut predictions = Vec::new();
    let mut scored_test_rows = 0;

    for class in data.train.unique_classes() {
        let c_train = data.train.select(&data.train.indices_of_class(class));
        let c_test = data.test.select(&data.test.indices_of_class(class));
        scored_test_rows += c_test.len();
        tracing::info!(
            class,
            train_samples = c_train.len(),
            test_samples = c_test.len(),
            "Training attack model"
        );

        let train = Subset::from_attack_split(&c_train, device)?;
        let spec = ModelSpec::for_attack(params, data.train.feature_dim);
        let trained = train_classifier(spec, params, &train, None, None, rng)?;

        let accuracy = if c_test.is_empty() {
            tracing::warn!(class, "no attack test rows for class");
            None
        } else {
            let test = Subset::from_attack_split(&c_test, device)?;
            let c_pred = predict(&trained.classifier, &test.inputs)?;
            let c_true = test.label_vec()?;
            let metrics = compute_validation_metrics(&c_pred, &c_true);
            tracing::info!(class, %metrics, "attack accuracy for class");
            true_labels.extend(c_true);
            predictions.extend(c_pred);
            Some(metrics.accuracy)
        };

        per_class.push(ClassAttackResult {
            class,
            train_samples: c_train.len(),
            test_samples: c_test.len(),
            accuracy,
        });
    }

    let unscored_test_rows = data.test.len() - scored_test_rows;
    if unscored_test_rows > 0 {
        tracing::warn!(
            unscored_test_rows,
            "attack test rows belong to classes absent from the training split"
        );
    }

    let accuracy = accuracy_score(&predictions, &true_labels);
    let report = classification_report(&predictions, &true_labels);
    tracing::info!(accuracy, predictions = predictions.len(), "Final attack accuracy");

    Ok(AttackReport {
        per_class,
        true_labels,
        predictions,
        unscored_test_rows,
        accuracy,
        report,
    })
}
