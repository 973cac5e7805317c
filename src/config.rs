//! Pipeline configuration.

use crate::error::{MaintenanceError, Result};
use crate::generator::GeneratorConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for a full pipeline run.
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Rows to generate
    pub num_samples: usize,

    /// Seed for both the generator and the train/test shuffle
    pub seed: u64,

    /// Share of rows held out for evaluation
    pub test_ratio: f64,

    /// Keep class proportions equal across train and test
    pub stratify: bool,

    /// Rows shown in the data preview
    pub preview_rows: usize,

    /// Sensor profiles and fault ratio
    pub generator: GeneratorConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            num_samples: 2000,
            seed: 42,
            test_ratio: 0.3,
            stratify: true,
            preview_rows: 5,
            generator: GeneratorConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that the settings describe a runnable pipeline.
    pub fn validate(&self) -> Result<()> {
        if self.num_samples == 0 {
            return Err(MaintenanceError::config("num_samples must be positive"));
        }
        if !(self.test_ratio > 0.0 && self.test_ratio < 1.0) {
            return Err(MaintenanceError::config(format!(
                "test_ratio must be in (0, 1), got {}",
                self.test_ratio
            )));
        }
        self.generator.validate()
    }
}
