//! Model evaluation
//!
//! Scores a fitted classifier on held-out data. Nothing here prints or logs;
//! callers decide what to do with the accuracy and report.

use crate::classifier::Classifier;
use crate::error::Result;
use crate::metrics::{MetricsReporter, TextReporter};
use crate::types::{FeatureMatrix, LabelVector};

/// Evaluate `model` on `features` against the true `labels`.
///
/// Returns the accuracy in `[0, 1]` and a text report with per-class
/// precision, recall and f1-score.
pub fn evaluate(
    model: &dyn Classifier,
    features: &FeatureMatrix,
    labels: &LabelVector,
) -> Result<(f64, String)> {
    evaluate_with(model, &TextReporter, features, labels)
}

/// Like [`evaluate`], with a caller-supplied reporter
pub fn evaluate_with(
    model: &dyn Classifier,
    reporter: &dyn MetricsReporter,
    features: &FeatureMatrix,
    labels: &LabelVector,
) -> Result<(f64, String)> {
    let predictions = model.predict(features)?;
    let accuracy = reporter.accuracy(labels, &predictions)?;
    let report = reporter.report(labels, &predictions)?;
    Ok((accuracy, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MaintenanceError;

    /// Flags any reading whose first channel runs hot
    struct ThresholdModel;

    impl Classifier for ThresholdModel {
        fn predict(&self, features: &FeatureMatrix) -> Result<LabelVector> {
            LabelVector::new(
                features
                    .rows()
                    .map(|row| u8::from(row[0] > 60.0))
                    .collect(),
            )
        }
    }

    /// Always answers "normal"
    struct NeverFault;

    impl Classifier for NeverFault {
        fn predict(&self, features: &FeatureMatrix) -> Result<LabelVector> {
            LabelVector::new(vec![0; features.n_rows()])
        }
    }

    struct FixedReporter;

    impl MetricsReporter for FixedReporter {
        fn accuracy(&self, _: &LabelVector, _: &LabelVector) -> Result<f64> {
            Ok(0.25)
        }

        fn report(&self, _: &LabelVector, _: &LabelVector) -> Result<String> {
            Ok("fixed".to_string())
        }
    }

    fn fixture() -> (FeatureMatrix, LabelVector) {
        (
            FeatureMatrix::from_readings(&[
                [50.0, 100.0, 5.0, 20.0, 1000.0],
                [65.0, 130.0, 8.0, 22.0, 1050.0],
            ]),
            LabelVector::new(vec![0, 1]).unwrap(),
        )
    }

    #[test]
    fn test_perfect_model_scores_one() {
        let (features, labels) = fixture();
        let (accuracy, report) = evaluate(&ThresholdModel, &features, &labels).unwrap();

        assert_eq!(accuracy, 1.0);
        assert!(report.contains("precision"));
        assert!(report.contains("recall"));
        assert!(report.contains("f1-score"));
    }

    #[test]
    fn test_missed_fault_halves_accuracy() {
        let (features, labels) = fixture();
        let (accuracy, report) = evaluate(&NeverFault, &features, &labels).unwrap();

        assert_eq!(accuracy, 0.5);
        // Fault class still listed with zeroed scores
        assert!(report.lines().any(|line| line.trim_start().starts_with('1')));
    }

    #[test]
    fn test_custom_reporter() {
        let (features, labels) = fixture();
        let (accuracy, report) =
            evaluate_with(&ThresholdModel, &FixedReporter, &features, &labels).unwrap();
        assert_eq!(accuracy, 0.25);
        assert_eq!(report, "fixed");
    }

    #[test]
    fn test_label_count_mismatch() {
        let (features, _) = fixture();
        let labels = LabelVector::new(vec![0]).unwrap();
        assert!(matches!(
            evaluate(&ThresholdModel, &features, &labels),
            Err(MaintenanceError::ShapeMismatch(_))
        ));
    }
}
