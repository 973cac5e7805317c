//! Classification metrics
//!
//! Accuracy and the per-class precision / recall / f1-score report used by the
//! evaluation stage.

use crate::error::{MaintenanceError, Result};
use crate::types::LabelVector;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Row label wide enough for every summary line
const SUMMARY_WIDTH: usize = "weighted avg".len();

/// Report precision
const DIGITS: usize = 2;

fn check_pair(y_true: &LabelVector, y_pred: &LabelVector) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(MaintenanceError::shape_mismatch(format!(
            "{} true labels but {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(MaintenanceError::empty_input("no labels to score"));
    }
    Ok(())
}

/// Fraction of predictions equal to the true label
pub fn accuracy_score(y_true: &LabelVector, y_pred: &LabelVector) -> Result<f64> {
    check_pair(y_true, y_pred)?;
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// `numerator / denominator`, or 0.0 when the ratio is undefined
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Scores for a single class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: u8,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    /// Number of true samples of this class
    pub support: usize,
}

/// Averaged scores across classes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Per-class precision, recall and f1-score with accuracy and averages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// One entry per class seen in either vector, ascending by label
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
}

impl ClassificationReport {
    /// Score predictions against true labels
    pub fn compute(y_true: &LabelVector, y_pred: &LabelVector) -> Result<Self> {
        check_pair(y_true, y_pred)?;

        let mut labels: Vec<u8> = y_true.iter().chain(y_pred.iter()).collect();
        labels.sort_unstable();
        labels.dedup();

        let classes: Vec<ClassMetrics> = labels
            .into_iter()
            .map(|label| {
                let mut true_positive = 0usize;
                let mut predicted = 0usize;
                let mut actual = 0usize;
                for (t, p) in y_true.iter().zip(y_pred.iter()) {
                    if p == label {
                        predicted += 1;
                    }
                    if t == label {
                        actual += 1;
                        if p == label {
                            true_positive += 1;
                        }
                    }
                }

                let precision = ratio(true_positive as f64, predicted as f64);
                let recall = ratio(true_positive as f64, actual as f64);
                ClassMetrics {
                    label,
                    precision,
                    recall,
                    f1_score: ratio(2.0 * precision * recall, precision + recall),
                    support: actual,
                }
            })
            .collect();

        let total = y_true.len();
        let n_classes = classes.len() as f64;
        let macro_avg = AverageMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n_classes,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n_classes,
            f1_score: classes.iter().map(|c| c.f1_score).sum::<f64>() / n_classes,
            support: total,
        };

        let weighted = |pick: fn(&ClassMetrics) -> f64| {
            classes
                .iter()
                .map(|c| pick(c) * c.support as f64)
                .sum::<f64>()
                / total as f64
        };
        let weighted_avg = AverageMetrics {
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1_score: weighted(|c| c.f1_score),
            support: total,
        };

        Ok(Self {
            classes,
            accuracy: accuracy_score(y_true, y_pred)?,
            macro_avg,
            weighted_avg,
        })
    }

    /// Scores for one label, if it appeared
    pub fn class(&self, label: u8) -> Option<&ClassMetrics> {
        self.classes.iter().find(|c| c.label == label)
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = SUMMARY_WIDTH;

        write!(f, "{:>width$} ", "")?;
        for header in ["precision", "recall", "f1-score", "support"] {
            write!(f, " {header:>9}")?;
        }
        writeln!(f)?;
        writeln!(f)?;

        for class in &self.classes {
            writeln!(
                f,
                "{:>width$}  {:>9.DIGITS$} {:>9.DIGITS$} {:>9.DIGITS$} {:>9}",
                class.label, class.precision, class.recall, class.f1_score, class.support
            )?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9.DIGITS$} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$}  {:>9.DIGITS$} {:>9.DIGITS$} {:>9.DIGITS$} {:>9}",
                name, avg.precision, avg.recall, avg.f1_score, avg.support
            )?;
        }

        Ok(())
    }
}

/// Text report for a prediction run
pub fn classification_report(y_true: &LabelVector, y_pred: &LabelVector) -> Result<String> {
    Ok(ClassificationReport::compute(y_true, y_pred)?.to_string())
}

/// Trait for scoring predictions
pub trait MetricsReporter {
    /// Fraction of correct predictions, in `[0, 1]`
    fn accuracy(&self, y_true: &LabelVector, y_pred: &LabelVector) -> Result<f64>;

    /// Human-readable summary containing per-class precision, recall and f1-score
    fn report(&self, y_true: &LabelVector, y_pred: &LabelVector) -> Result<String>;
}

/// Column-aligned plain text reporter
#[derive(Debug, Clone, Copy, Default)]
pub struct TextReporter;

impl MetricsReporter for TextReporter {
    fn accuracy(&self, y_true: &LabelVector, y_pred: &LabelVector) -> Result<f64> {
        accuracy_score(y_true, y_pred)
    }

    fn report(&self, y_true: &LabelVector, y_pred: &LabelVector) -> Result<String> {
        classification_report(y_true, y_pred)
    }
}
