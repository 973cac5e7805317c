//! Fault Forest - Predictive maintenance on synthetic sensor data
//!
//! Fault Forest generates labeled machine-sensor readings with injected faults
//! and trains a class-balanced random forest to flag them through a
//! deterministic pipeline: generation → feature/target split → holdout
//! partition → training → evaluation.
//!
//! ## Modules
//!
//! - **Data**: [`generator`] and [`splitter`] produce the feature matrix and labels
//! - **Model**: [`classifier`] and [`training`] fit the forest
//! - **Scoring**: [`metrics`] and [`evaluation`] report accuracy, precision, recall and f1-score
//! - **Orchestration**: [`pipeline`] runs every stage from a [`PipelineConfig`]

pub mod classifier;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod generator;
pub mod metrics;
pub mod pipeline;
pub mod splitter;
pub mod training;
pub mod types;

pub use classifier::{Classifier, ForestConfig, RandomForestClassifier};
pub use config::PipelineConfig;
pub use error::{MaintenanceError, Result};
pub use evaluation::{evaluate, evaluate_with};
pub use generator::{generate, DataGenerator, GeneratorConfig};
pub use metrics::{ClassificationReport, MetricsReporter, TextReporter};
pub use pipeline::{MaintenancePipeline, PipelineOutcome};
pub use splitter::{holdout, split, train_test_split, Holdout, SplitRatio};
pub use training::train;
pub use types::{Dataset, FeatureMatrix, LabelVector, Prediction, SensorRecord};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name recorded in every pipeline outcome
pub const PRODUCER_NAME: &str = "fault-forest";
