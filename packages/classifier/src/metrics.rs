//! Held-out evaluation of a fitted classifier.

use nypd_shootings_classifier_models::{ConfusionMatrix, EvaluationMetrics, FeatureRow};

use crate::ModelError;
use crate::model::MurderClassifier;

/// Scores `classifier` on `test`.
///
/// An empty test set yields all-zero metrics.
///
/// # Errors
///
/// Returns [`ModelError::Solver`] if prediction fails.
pub fn evaluate(
    classifier: &MurderClassifier,
    test: &[FeatureRow],
) -> Result<EvaluationMetrics, ModelError> {
    let predictions = classifier.predict(test)?;

    let mut confusion = ConfusionMatrix::default();
    for (row, &predicted) in test.iter().zip(&predictions.labels) {
        confusion.record(row.is_murder, predicted);
    }

    if predictions.unseen_rows > 0 {
        log::warn!(
            "{} of {} test rows have levels unseen in training; encoded as reference levels",
            predictions.unseen_rows,
            test.len()
        );
    }

    let metrics = metrics_from(confusion, predictions.unseen_rows);
    log::info!(
        "Evaluated {} test rows: accuracy {:.3}, no-information rate {:.3}",
        metrics.test_rows,
        metrics.accuracy,
        metrics.no_information_rate
    );
    Ok(metrics)
}

fn metrics_from(confusion: ConfusionMatrix, unseen_rows: u64) -> EvaluationMetrics {
    let ConfusionMatrix {
        true_positive: tp,
        false_positive: fp,
        true_negative: tn,
        false_negative: fn_,
    } = confusion;
    let total = confusion.total();

    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    EvaluationMetrics {
        test_rows: total,
        accuracy: ratio(tp + tn, total),
        confusion,
        precision,
        recall,
        specificity: ratio(tn, tn + fp),
        f1,
        no_information_rate: ratio((tp + fn_).max(tn + fp), total),
        unseen_rows,
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
