//! Synthetic sensor data generation
//!
//! This module produces labeled datasets of simulated sensor readings:
//! - Every channel is drawn from a "normal operation" Gaussian
//! - A fixed share of rows is chosen without replacement as faulty
//! - Faulty rows get shifted readings on the channels that carry a fault signal
//!
//! Only sensor_1..sensor_3 carry the fault signal. sensor_4 and sensor_5 keep
//! their normal-operation readings on faulty rows, simulating partial sensor
//! coverage.

use crate::error::{MaintenanceError, Result};
use crate::types::{
    Dataset, SensorRecord, FAULT_LABEL, NORMAL_LABEL, NUM_SENSORS, SENSOR_COLUMNS,
};
use rand::distributions::Open01;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

/// Default number of generated rows
pub const DEFAULT_NUM_SAMPLES: usize = 1000;

/// Default generator seed
pub const DEFAULT_SEED: u64 = 42;

/// Default share of faulty rows
pub const DEFAULT_FAULT_RATIO: f64 = 0.15;

/// Distribution parameters for one sensor channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelProfile {
    /// Column name
    pub name: String,
    /// Physical quantity the channel represents
    pub quantity: String,
    /// Mean reading during normal operation
    pub mean: f64,
    /// Standard deviation, shared by normal and fault readings
    pub std_dev: f64,
    /// Mean reading on faulty rows; `None` leaves the channel untouched
    pub fault_mean: Option<f64>,
}

impl ChannelProfile {
    fn new(name: &str, quantity: &str, mean: f64, std_dev: f64, fault_mean: Option<f64>) -> Self {
        Self {
            name: name.to_string(),
            quantity: quantity.to_string(),
            mean,
            std_dev,
            fault_mean,
        }
    }
}

/// Generator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// One profile per sensor column, in column order
    pub channels: [ChannelProfile; NUM_SENSORS],
    /// Share of rows turned into faults, in `[0, 1)`
    pub fault_ratio: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            channels: [
                ChannelProfile::new("sensor_1", "temperature", 50.0, 5.0, Some(65.0)),
                ChannelProfile::new("sensor_2", "vibration", 100.0, 10.0, Some(130.0)),
                ChannelProfile::new("sensor_3", "pressure", 5.0, 1.0, Some(8.0)),
                ChannelProfile::new("sensor_4", "current", 20.0, 2.0, None),
                ChannelProfile::new("sensor_5", "rotational_speed", 1000.0, 50.0, None),
            ],
            fault_ratio: DEFAULT_FAULT_RATIO,
        }
    }
}

impl GeneratorConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.fault_ratio) {
            return Err(MaintenanceError::config(format!(
                "fault_ratio must be in [0, 1), got {}",
                self.fault_ratio
            )));
        }

        for (channel, expected) in self.channels.iter().zip(SENSOR_COLUMNS) {
            if channel.name != expected {
                return Err(MaintenanceError::config(format!(
                    "channel {expected} is named {:?}; channels map to sensor columns in order",
                    channel.name
                )));
            }
            if !channel.std_dev.is_finite() || channel.std_dev <= 0.0 {
                return Err(MaintenanceError::config(format!(
                    "{}: std_dev must be positive and finite, got {}",
                    channel.name, channel.std_dev
                )));
            }
            let means_finite =
                channel.mean.is_finite() && channel.fault_mean.map_or(true, f64::is_finite);
            if !means_finite {
                return Err(MaintenanceError::config(format!(
                    "{}: means must be finite",
                    channel.name
                )));
            }
        }

        Ok(())
    }

    /// Number of faulty rows for a dataset of `num_samples` rows
    pub fn fault_count(&self, num_samples: usize) -> usize {
        (num_samples as f64 * self.fault_ratio).floor() as usize
    }
}

/// Synthetic dataset generator
#[derive(Debug, Clone, Default)]
pub struct DataGenerator {
    config: GeneratorConfig,
}

impl DataGenerator {
    /// Create a generator, rejecting invalid configurations
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate a dataset from a fresh source seeded with `seed`.
    ///
    /// Identical `(num_samples, seed)` pairs always produce identical datasets.
    pub fn generate(&self, num_samples: usize, seed: u64) -> Result<Dataset> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.generate_with_rng(num_samples, &mut rng)
    }

    /// Generate a dataset drawing from a caller-owned random source.
    ///
    /// Draw order: each channel's normal readings in column order, then the
    /// fault row indices, then the fault readings for each fault-carrying
    /// channel in column order.
    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        num_samples: usize,
        rng: &mut R,
    ) -> Result<Dataset> {
        if num_samples == 0 {
            return Err(MaintenanceError::invalid_argument(
                "num_samples must be a positive integer",
            ));
        }

        let mut columns = Vec::with_capacity(NUM_SENSORS);
        for channel in &self.config.channels {
            columns.push(draw_normal(rng, channel.mean, channel.std_dev, num_samples)?);
        }

        let num_faults = self.config.fault_count(num_samples);
        let fault_rows = index::sample(rng, num_samples, num_faults).into_vec();

        for (channel, column) in self.config.channels.iter().zip(columns.iter_mut()) {
            let Some(fault_mean) = channel.fault_mean else {
                continue;
            };
            let readings = draw_normal(rng, fault_mean, channel.std_dev, num_faults)?;
            for (&row, reading) in fault_rows.iter().zip(readings) {
                column[row] = reading;
            }
        }

        let mut labels = vec![NORMAL_LABEL; num_samples];
        for &row in &fault_rows {
            labels[row] = FAULT_LABEL;
        }

        let records = labels
            .iter()
            .enumerate()
            .map(|(row, &fault)| {
                SensorRecord::from_readings(
                    [
                        columns[0][row],
                        columns[1][row],
                        columns[2][row],
                        columns[3][row],
                        columns[4][row],
                    ],
                    fault,
                )
            })
            .collect();

        debug!(num_samples, num_faults, "generated sensor dataset");
        Dataset::from_records(records)
    }
}

/// Generate a labeled dataset with the default channel profiles.
///
/// # Arguments
/// * `num_samples` - Number of rows, must be positive
/// * `seed` - Seed for the dataset's own random source
///
/// # Example
/// ```
/// let dataset = fault_forest::generate(1000, 42)?;
/// assert_eq!(dataset.len(), 1000);
/// assert_eq!(dataset.fault_count(), 150);
/// # Ok::<(), fault_forest::MaintenanceError>(())
/// ```
pub fn generate(num_samples: usize, seed: u64) -> Result<Dataset> {
    DataGenerator::default().generate(num_samples, seed)
}

/// Draw `n` Gaussian values by inverting the CDF on open-interval uniforms
fn draw_normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64, n: usize) -> Result<Vec<f64>> {
    let normal =
        Normal::new(mean, std_dev).map_err(|e| MaintenanceError::Distribution(e.to_string()))?;

    Ok((0..n)
        .map(|_| {
            let u: f64 = rng.sample(Open01);
            normal.inverse_cdf(u)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_default_shape() {
        let dataset = generate(DEFAULT_NUM_SAMPLES, DEFAULT_SEED).unwrap();
        assert_eq!(dataset.len(), 1000);
        assert!(dataset.iter().all(|r| r.fault == 0 || r.fault == 1));
        assert_eq!(dataset.fault_count(), 150);
    }

    #[test]
    fn test_generate_rejects_zero_samples() {
        let result = generate(0, DEFAULT_SEED);
        assert!(matches!(result, Err(MaintenanceError::InvalidArgument(_))));
    }

    #[test]
    fn test_generate_is_reproducible() {
        let first = generate(100, 42).unwrap();
        let second = generate(100, 42).unwrap();
        assert_eq!(first, second);

        let other_seed = generate(100, 7).unwrap();
        assert_ne!(first, other_seed);
    }

    #[test]
    fn test_fault_count_is_floored() {
        let config = GeneratorConfig::default();
        assert_eq!(config.fault_count(10), 1);
        assert_eq!(config.fault_count(6), 0);
        assert_eq!(config.fault_count(2000), 300);
        assert_eq!(config.fault_count(333), 49);
    }

    #[test]
    fn test_tiny_dataset_without_faults() {
        let dataset = generate(5, 42).unwrap();
        assert_eq!(dataset.len(), 5);
        assert_eq!(dataset.fault_count(), 0);
    }

    #[test]
    fn test_fault_rows_are_shifted_on_signal_channels_only() {
        let dataset = generate(2000, 42).unwrap();
        let mean = |fault: u8, pick: fn(&SensorRecord) -> f64| {
            let values: Vec<f64> = dataset
                .iter()
                .filter(|r| r.fault == fault)
                .map(pick)
                .collect();
            values.iter().sum::<f64>() / values.len() as f64
        };

        assert!(mean(1, |r| r.sensor_1) - mean(0, |r| r.sensor_1) > 10.0);
        assert!(mean(1, |r| r.sensor_2) - mean(0, |r| r.sensor_2) > 20.0);
        assert!(mean(1, |r| r.sensor_3) - mean(0, |r| r.sensor_3) > 2.0);

        // Untouched channels stay within a fraction of a standard deviation
        assert!((mean(1, |r| r.sensor_4) - mean(0, |r| r.sensor_4)).abs() < 1.0);
        assert!((mean(1, |r| r.sensor_5) - mean(0, |r| r.sensor_5)).abs() < 25.0);
    }

    #[test]
    fn test_generate_with_caller_rng() {
        let generator = DataGenerator::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let from_rng = generator.generate_with_rng(50, &mut rng).unwrap();
        let from_seed = generator.generate(50, 42).unwrap();
        assert_eq!(from_rng, from_seed);
    }

    #[test]
    fn test_config_validation() {
        let mut config = GeneratorConfig::default();
        config.fault_ratio = 1.0;
        assert!(DataGenerator::new(config).is_err());

        let mut config = GeneratorConfig::default();
        config.channels[2].std_dev = 0.0;
        assert!(matches!(
            DataGenerator::new(config),
            Err(MaintenanceError::Config(_))
        ));
    }

    #[test]
    fn test_config_rejects_renamed_or_reordered_channels() {
        let mut renamed = GeneratorConfig::default();
        renamed.channels[0].name = "temperature".to_string();
        assert!(matches!(
            renamed.validate(),
            Err(MaintenanceError::Config(_))
        ));

        let mut reordered = GeneratorConfig::default();
        reordered.channels.swap(0, 1);
        assert!(DataGenerator::new(reordered).is_err());
    }

    #[test]
    fn test_config_roundtrips_with_defaults() {
        let parsed: GeneratorConfig = serde_json::from_str(r#"{"fault_ratio": 0.2}"#).unwrap();
        assert_eq!(parsed.fault_ratio, 0.2);
        assert_eq!(parsed.channels, GeneratorConfig::default().channels);
    }
}
