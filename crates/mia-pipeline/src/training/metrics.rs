//! Classification metrics for target, shadow, and attack models.
//!
//! Computes confusion-matrix-derived metrics from predicted and ground-truth
//! labels, plus a per-label classification report.

use std::collections::BTreeSet;

/// Binary metrics computed from a confusion matrix.
///
/// Class 1 = member (positive), class 0 = non-member.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub fpr: f64,
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    pub fn_count: usize,
}

/// Compute binary metrics from predicted and ground-truth labels.
pub fn compute_validation_metrics(predictions: &[i64], labels: &[i64]) -> ValidationMetrics {
    assert_eq!(
        predictions.len(),
        labels.len(),
        "predictions and labels must have same length"
    );

    let mut tp: usize = 0;
    let mut fp: usize = 0;
    let mut tn: usize = 0;
    let mut fn_count: usize = 0;

    for (&pred, &label) in predictions.iter().zip(labels.iter()) {
        match (pred, label) {
            (1, 1) => tp += 1,
            (1, 0) => fp += 1,
            (0, 0) => tn += 1,
            (0, 1) => fn_count += 1,
            _ => {}
        }
    }

    let total = (tp + fp + tn + fn_count) as f64;
    let accuracy = if total > 0.0 {
        (tp + tn) as f64 / total
    } else {
        0.0
    };
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_count);
    let f1 = harmonic(precision, recall);
    let fpr = ratio(fp, fp + tn);

    ValidationMetrics {
        accuracy,
        precision,
        recall,
        f1,
        fpr,
        tp,
        fp,
        tn,
        fn_count,
    }
}

/// One-line summary used in per-class attack logs.
impl std::fmt::Display for ValidationMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "accuracy {:.4}, member precision {:.4} recall {:.4}, fpr {:.4} [{} member / {} non-member hits]",
            self.accuracy,
            self.precision,
            self.recall,
            self.fpr,
            self.tp,
            self.tn,
        )
    }
}

/// Fraction of positions where prediction and label agree (0 when empty).
pub fn accuracy_score(predictions: &[i64], labels: &[i64]) -> f64 {
    assert_eq!(
        predictions.len(),
        labels.len(),
        "predictions and labels must have same length"
    );
    if labels.is_empty() {
        return 0.0;
    }
    let correct = predictions
        .iter()
        .zip(labels)
        .filter(|(p, l)| p == l)
        .count();
    correct as f64 / labels.len() as f64
}

/// Precision / recall / F1 for one label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMetrics {
    pub label: i64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-label metrics with macro and support-weighted averages.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub labels: Vec<LabelMetrics>,
    pub accuracy: f64,
    pub macro_avg: LabelMetrics,
    pub weighted_avg: LabelMetrics,
    pub total: usize,
}

/// Build a report over every label seen in either `labels` or `predictions`.
pub fn classification_report(predictions: &[i64], labels: &[i64]) -> ClassificationReport {
    let accuracy = accuracy_score(predictions, labels);
    let seen: BTreeSet<i64> = labels.iter().chain(predictions).copied().collect();

    let per_label: Vec<LabelMetrics> = seen
        .iter()
        .map(|&label| {
            let mut tp = 0usize;
            let mut fp = 0usize;
            let mut fn_count = 0usize;
            for (&p, &l) in predictions.iter().zip(labels) {
                match (p == label, l == label) {
                    (true, true) => tp += 1,
                    (true, false) => fp += 1,
                    (false, true) => fn_count += 1,
                    (false, false) => {}
                }
            }
            let precision = ratio(tp, tp + fp);
            let recall = ratio(tp, tp + fn_count);
            LabelMetrics {
                label,
                precision,
                recall,
                f1: harmonic(precision, recall),
                support: tp + fn_count,
            }
        })
        .collect();

    let total = labels.len();
    let n = per_label.len().max(1) as f64;
    let macro_avg = LabelMetrics {
        label: -1,
        precision: per_label.iter().map(|m| m.precision).sum::<f64>() / n,
        recall: per_label.iter().map(|m| m.recall).sum::<f64>() / n,
        f1: per_label.iter().map(|m| m.f1).sum::<f64>() / n,
        support: total,
    };
    let weight = |get: fn(&LabelMetrics) -> f64| -> f64 {
        if total == 0 {
            return 0.0;
        }
        per_label
            .iter()
            .map(|m| get(m) * m.support as f64)
            .sum::<f64>()
            / total as f64
    };
    let weighted_avg = LabelMetrics {
        label: -1,
        precision: weight(|m| m.precision),
        recall: weight(|m| m.recall),
        f1: weight(|m| m.f1),
        support: total,
    };

    ClassificationReport {
        labels: per_label,
        accuracy,
        macro_avg,
        weighted_avg,
        total,
    }
}

impl std::fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for m in &self.labels {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                m.label, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10.2} {:>10}",
            "accuracy", "", "", self.accuracy, self.total
        )?;
        for (name, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        Ok(())
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den > 0 {
        num as f64 / den as f64
    } else {
        0.0
    }
}

fn harmonic(precision: f64, recall: f64) -> f64 {
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_predictions() {
        let preds = vec![0, 0, 1, 1];
        let labels = vec![0, 0, 1, 1];
        let m = compute_validation_metrics(&preds, &labels);
        assert!((m.accuracy - 1.0).abs() < 1e-9);
        assert!((m.precision - 1.0).abs() < 1e-9);
        assert!((m.recall - 1.0).abs() < 1e-9);
        assert!((m.f1 - 1.0).abs() < 1e-9);
        assert!((m.fpr).abs() < 1e-9);
    }

    #[test]
    fn test_mixed() {
        // 3 TP, 1 FP, 2 TN, 1 FN
        let preds = vec![1, 1, 1, 1, 0, 0, 0];
        let labels = vec![1, 1, 1, 0, 0, 0, 1];
        let m = compute_validation_metrics(&preds, &labels);
        assert_eq!((m.tp, m.fp, m.tn, m.fn_count), (3, 1, 2, 1));
        assert!((m.accuracy - 5.0 / 7.0).abs() < 1e-9);
        assert!((m.precision - 3.0 / 4.0).abs() < 1e-9);
        assert!((m.fpr - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_metrics_display_summary() {
        let m = compute_validation_metrics(&[1, 1, 1, 1, 0, 0, 0], &[1, 1, 1, 0, 0, 0, 1]);
        assert_eq!(
            m.to_string(),
            "accuracy 0.7143, member precision 0.7500 recall 0.7500, fpr 0.3333 \
             [3 member / 2 non-member hits]"
        );
    }

    #[test]
    fn test_empty() {
        let m = compute_validation_metrics(&[], &[]);
        assert!((m.accuracy).abs() < 1e-9);
        assert!((accuracy_score(&[], &[])).abs() < 1e-9);
    }

    #[test]
    fn test_accuracy_multiclass() {
        assert!((accuracy_score(&[0, 2, 1, 3], &[0, 1, 1, 3]) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_classification_report_binary() {
        let preds = vec![1, 1, 1, 1, 0, 0, 0];
        let labels = vec![1, 1, 1, 0, 0, 0, 1];
        let report = classification_report(&preds, &labels);
        assert_eq!(report.labels.len(), 2);
        assert_eq!(report.total, 7);

        let member = &report.labels[1];
        assert_eq!(member.label, 1);
        assert_eq!(member.support, 4);
        assert!((member.precision - 0.75).abs() < 1e-9);
        assert!((member.recall - 0.75).abs() < 1e-9);

        let non_member = &report.labels[0];
        assert_eq!(non_member.support, 3);
        assert!((non_member.recall - 2.0 / 3.0).abs() < 1e-9);

        let expected_weighted = (0.75 * 4.0 + (2.0 / 3.0) * 3.0) / 7.0;
        assert!((report.weighted_avg.recall - expected_weighted).abs() < 1e-9);
        assert!((report.weighted_avg.recall - report.accuracy).abs() < 1e-9);
    }

    #[test]
    fn test_report_display_has_rows() {
        let report = classification_report(&[0, 1], &[0, 0]);
        let text = report.to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("accuracy"));
        assert!(text.contains("weighted avg"));
    }
}
