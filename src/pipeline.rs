//! Pipeline orchestration
//!
//! Runs the predictive-maintenance demo end to end: generate sensor data,
//! separate features from labels, hold out a test partition, train the forest,
//! score it and classify two hand-crafted readings.

use crate::classifier::{Classifier, RandomForestClassifier};
use crate::config::PipelineConfig;
use crate::error::{MaintenanceError, Result};
use crate::evaluation::evaluate;
use crate::generator::DataGenerator;
use crate::splitter::{split, train_test_split};
use crate::training::train;
use crate::types::{
    Dataset, FaultDistribution, FeatureMatrix, Prediction, SensorRecord, NUM_SENSORS,
    SENSOR_COLUMNS,
};
use crate::{PRODUCER_NAME, VERSION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A reading well inside the normal operating envelope
pub const NORMAL_READING: [f64; NUM_SENSORS] = [50.0, 100.0, 5.0, 20.0, 1000.0];

/// A reading with elevated temperature, vibration and pressure
pub const FAULTY_READING: [f64; NUM_SENSORS] = [68.0, 135.0, 8.5, 22.0, 1050.0];

/// Row and column counts of the train/test partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionShapes {
    /// `(rows, columns)` of the training features
    pub train_features: (usize, usize),
    pub train_labels: usize,
    /// `(rows, columns)` of the test features
    pub test_features: (usize, usize),
    pub test_labels: usize,
}

/// Importance of one sensor column in the fitted forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Name and version of the software that produced an outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
}

impl Default for Producer {
    fn default() -> Self {
        Self {
            name: PRODUCER_NAME.to_string(),
            version: VERSION.to_string(),
        }
    }
}

/// Everything a pipeline run produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutcome {
    /// Unique identifier for this run
    pub run_id: String,
    pub producer: Producer,
    pub computed_at: DateTime<Utc>,
    /// Effective configuration
    pub config: PipelineConfig,
    /// Leading rows of the generated dataset
    pub preview: Vec<SensorRecord>,
    pub fault_distribution: FaultDistribution,
    pub shapes: PartitionShapes,
    /// Test-set accuracy in `[0, 1]`
    pub accuracy: f64,
    /// Per-class text report
    pub report: String,
    pub feature_importances: Vec<FeatureImportance>,
    pub normal_prediction: Prediction,
    pub faulty_prediction: Prediction,
}

impl PipelineOutcome {
    /// Whether the faulty reading was flagged and maintenance should be scheduled
    pub fn maintenance_alert(&self) -> bool {
        self.faulty_prediction == Prediction::Fault
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Classify a single reading
pub fn predict_reading(
    model: &dyn Classifier,
    reading: [f64; NUM_SENSORS],
) -> Result<Prediction> {
    let labels = model.predict(&FeatureMatrix::from_readings(&[reading]))?;
    labels
        .get(0)
        .map(Prediction::from_label)
        .ok_or_else(|| MaintenanceError::empty_input("model returned no prediction"))
}

/// Pair each sensor column with its importance
pub fn named_importances(model: &RandomForestClassifier) -> Vec<FeatureImportance> {
    SENSOR_COLUMNS
        .iter()
        .zip(model.feature_importances())
        .map(|(name, importance)| FeatureImportance {
            feature: (*name).to_string(),
            importance,
        })
        .collect()
}

/// End-to-end maintenance pipeline.
///
/// Holds the configuration for repeated runs; each run is independent and
/// fully determined by the configuration.
#[derive(Debug, Clone, Default)]
pub struct MaintenancePipeline {
    config: PipelineConfig,
}

impl MaintenancePipeline {
    /// Create a pipeline from settings
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Generate the dataset this pipeline would train on
    pub fn generate(&self) -> Result<Dataset> {
        self.config.validate()?;
        DataGenerator::new(self.config.generator.clone())?
            .generate(self.config.num_samples, self.config.seed)
    }

    /// Run every stage and collect the results.
    ///
    /// Pipeline stages:
    /// 1. DataGenerator - Synthetic readings with injected faults
    /// 2. split - Sensor features and fault labels
    /// 3. train_test_split - Seeded holdout partition
    /// 4. train - Class-balanced random forest
    /// 5. evaluate - Accuracy and per-class report on the test partition
    /// 6. predict_reading - Hand-crafted normal and faulty readings
    pub fn run(&self) -> Result<PipelineOutcome> {
        let config = &self.config;
        info!(
            num_samples = config.num_samples,
            seed = config.seed,
            test_ratio = config.test_ratio,
            stratify = config.stratify,
            "starting maintenance pipeline"
        );

        // Stage 1: Generate labeled sensor data
        let dataset = self.generate()?;
        let fault_distribution = dataset.fault_distribution();
        info!(
            rows = dataset.len(),
            normal = fault_distribution.normal,
            fault = fault_distribution.fault,
            "dataset generated"
        );

        // Stage 2: Separate features from labels
        let (features, labels) = split(&dataset);

        // Stage 3: Hold out a test partition
        let holdout = train_test_split(
            &features,
            &labels,
            config.test_ratio,
            config.seed,
            config.stratify,
        )?;
        let shapes = PartitionShapes {
            train_features: holdout.train_features.shape(),
            train_labels: holdout.train_labels.len(),
            test_features: holdout.test_features.shape(),
            test_labels: holdout.test_labels.len(),
        };
        debug!(?shapes, "holdout partitioned");

        // Stage 4: Train
        let model = train(&holdout.train_features, &holdout.train_labels)?;

        // Stage 5: Evaluate
        let (accuracy, report) = evaluate(&model, &holdout.test_features, &holdout.test_labels)?;
        info!(accuracy, "model evaluated");

        // Stage 6: Classify the reference readings
        let normal_prediction = predict_reading(&model, NORMAL_READING)?;
        let faulty_prediction = predict_reading(&model, FAULTY_READING)?;
        debug!(
            normal = normal_prediction.as_str(),
            faulty = faulty_prediction.as_str(),
            "reference readings classified"
        );

        Ok(PipelineOutcome {
            run_id: uuid::Uuid::new_v4().to_string(),
            producer: Producer::default(),
            computed_at: Utc::now(),
            config: config.clone(),
            preview: dataset.head(config.preview_rows).to_vec(),
            fault_distribution,
            shapes,
            accuracy,
            report,
            feature_importances: named_importances(&model),
            normal_prediction,
            faulty_prediction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LabelVector;

    fn small_config() -> PipelineConfig {
        PipelineConfig {
            num_samples: 400,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_run_produces_complete_outcome() {
        let outcome = MaintenancePipeline::new(small_config()).run().unwrap();

        assert_eq!(outcome.preview.len(), 5);
        assert_eq!(outcome.fault_distribution.total(), 400);
        assert_eq!(outcome.fault_distribution.fault, 60);
        assert_eq!(outcome.shapes.train_features.1, 5);
        assert_eq!(
            outcome.shapes.train_labels + outcome.shapes.test_labels,
            400
        );
        assert_eq!(outcome.shapes.test_features.0, outcome.shapes.test_labels);
        assert!((0.0..=1.0).contains(&outcome.accuracy));
        assert!(outcome.report.contains("f1-score"));
        assert_eq!(outcome.feature_importances.len(), 5);
        assert_eq!(outcome.feature_importances[0].feature, "sensor_1");
        assert!(!outcome.run_id.is_empty());
    }

    #[test]
    fn test_runs_are_reproducible() {
        let pipeline = MaintenancePipeline::new(small_config());
        let a = pipeline.run().unwrap();
        let b = pipeline.run().unwrap();

        assert_eq!(a.accuracy, b.accuracy);
        assert_eq!(a.report, b.report);
        assert_eq!(a.preview, b.preview);
        assert_eq!(a.feature_importances, b.feature_importances);
        assert_ne!(a.run_id, b.run_id);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let pipeline = MaintenancePipeline::new(PipelineConfig {
            test_ratio: 1.2,
            ..small_config()
        });
        assert!(matches!(pipeline.run(), Err(MaintenanceError::Config(_))));
    }

    #[test]
    fn test_predict_reading() {
        struct AlwaysFault;
        impl Classifier for AlwaysFault {
            fn predict(&self, features: &FeatureMatrix) -> Result<LabelVector> {
                LabelVector::new(vec![1; features.n_rows()])
            }
        }

        assert_eq!(
            predict_reading(&AlwaysFault, NORMAL_READING).unwrap(),
            Prediction::Fault
        );
    }

    #[test]
    fn test_outcome_json() {
        let outcome = MaintenancePipeline::new(small_config()).run().unwrap();
        let value: serde_json::Value = serde_json::from_str(&outcome.to_json().unwrap()).unwrap();

        assert_eq!(value["config"]["num_samples"], 400);
        assert_eq!(value["producer"]["name"], "fault-forest");
        assert_eq!(value["producer"]["version"], crate::VERSION);
        assert_eq!(value["preview"].as_array().unwrap().len(), 5);
        assert!(value["normal_prediction"].is_string());
        assert_eq!(
            outcome.maintenance_alert(),
            value["faulty_prediction"] == "fault"
        );
    }
}
