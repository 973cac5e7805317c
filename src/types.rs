//! Core types for the Fault Forest pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: sensor records, the generated dataset, and the feature/label split
//! consumed by the classifier.

use crate::error::{MaintenanceError, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Number of sensor channels per record
pub const NUM_SENSORS: usize = 5;

/// Sensor column names, in dataset order
pub const SENSOR_COLUMNS: [&str; NUM_SENSORS] =
    ["sensor_1", "sensor_2", "sensor_3", "sensor_4", "sensor_5"];

/// Label column name
pub const FAULT_COLUMN: &str = "fault";

/// Full dataset column order
pub const DATASET_COLUMNS: [&str; NUM_SENSORS + 1] = [
    "sensor_1", "sensor_2", "sensor_3", "sensor_4", "sensor_5", "fault",
];

/// Label value for normal operation
pub const NORMAL_LABEL: u8 = 0;

/// Label value for a faulty sample
pub const FAULT_LABEL: u8 = 1;

fn check_label(label: u8, position: usize) -> Result<()> {
    if label == NORMAL_LABEL || label == FAULT_LABEL {
        Ok(())
    } else {
        Err(MaintenanceError::invalid_argument(format!(
            "label at row {position} must be 0 or 1, got {label}"
        )))
    }
}

/// One row of the dataset: five sensor readings and a fault label
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    /// Temperature channel
    pub sensor_1: f64,
    /// Vibration channel
    pub sensor_2: f64,
    /// Pressure channel
    pub sensor_3: f64,
    /// Current channel
    pub sensor_4: f64,
    /// Rotational speed channel
    pub sensor_5: f64,
    /// 0 = normal, 1 = fault
    pub fault: u8,
}

impl SensorRecord {
    /// Build a record from readings in column order
    pub fn from_readings(readings: [f64; NUM_SENSORS], fault: u8) -> Self {
        Self {
            sensor_1: readings[0],
            sensor_2: readings[1],
            sensor_3: readings[2],
            sensor_4: readings[3],
            sensor_5: readings[4],
            fault,
        }
    }

    /// Sensor readings in column order
    pub fn readings(&self) -> [f64; NUM_SENSORS] {
        [
            self.sensor_1,
            self.sensor_2,
            self.sensor_3,
            self.sensor_4,
            self.sensor_5,
        ]
    }

    pub fn is_fault(&self) -> bool {
        self.fault == FAULT_LABEL
    }
}

/// Count of rows per label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultDistribution {
    pub normal: usize,
    pub fault: usize,
}

impl FaultDistribution {
    pub fn total(&self) -> usize {
        self.normal + self.fault
    }
}

/// Labeled table of sensor readings
///
/// Columns are fixed to `[sensor_1, sensor_2, sensor_3, sensor_4, sensor_5, fault]`.
/// A dataset is never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SensorRecord>", into = "Vec<SensorRecord>")]
pub struct Dataset {
    records: Vec<SensorRecord>,
}

impl Dataset {
    /// Build a dataset, rejecting labels outside `{0, 1}`
    pub fn from_records(records: Vec<SensorRecord>) -> Result<Self> {
        for (i, record) in records.iter().enumerate() {
            check_label(record.fault, i)?;
        }
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SensorRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &SensorRecord> {
        self.records.iter()
    }

    /// Column names in table order
    pub fn columns(&self) -> &'static [&'static str] {
        &DATASET_COLUMNS
    }

    /// Values of a named column, or `None` for an unknown name
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        if name == FAULT_COLUMN {
            return Some(self.records.iter().map(|r| f64::from(r.fault)).collect());
        }
        let index = SENSOR_COLUMNS.iter().position(|c| *c == name)?;
        Some(self.records.iter().map(|r| r.readings()[index]).collect())
    }

    /// First `n` rows (fewer if the dataset is shorter)
    pub fn head(&self, n: usize) -> &[SensorRecord] {
        &self.records[..n.min(self.records.len())]
    }

    pub fn fault_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_fault()).count()
    }

    pub fn fault_distribution(&self) -> FaultDistribution {
        let fault = self.fault_count();
        FaultDistribution {
            normal: self.records.len() - fault,
            fault,
        }
    }

    /// Share of faulty rows, 0.0 for an empty dataset
    pub fn fault_fraction(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        self.fault_count() as f64 / self.records.len() as f64
    }
}

impl TryFrom<Vec<SensorRecord>> for Dataset {
    type Error = MaintenanceError;

    fn try_from(records: Vec<SensorRecord>) -> Result<Self> {
        Self::from_records(records)
    }
}

impl From<Dataset> for Vec<SensorRecord> {
    fn from(dataset: Dataset) -> Self {
        dataset.records
    }
}

/// Row-major matrix of sensor readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MatrixParts")]
pub struct FeatureMatrix {
    columns: Vec<String>,
    data: Vec<f64>,
    n_rows: usize,
}

impl FeatureMatrix {
    /// Build a matrix from named columns and row vectors
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        if columns.is_empty() {
            return Err(MaintenanceError::invalid_argument(
                "feature matrix needs at least one column",
            ));
        }

        let width = columns.len();
        let mut data = Vec::with_capacity(rows.len() * width);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(MaintenanceError::shape_mismatch(format!(
                    "row {i} has {} values, expected {width}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }

        Ok(Self {
            columns,
            data,
            n_rows: rows.len(),
        })
    }

    /// Build a matrix over the five sensor columns
    pub fn from_readings(rows: &[[f64; NUM_SENSORS]]) -> Self {
        Self {
            columns: sensor_column_names(),
            data: rows.iter().flat_map(|r| r.iter().copied()).collect(),
            n_rows: rows.len(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.columns.len())
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Row `i`; panics when out of bounds like slice indexing
    pub fn row(&self, i: usize) -> &[f64] {
        let width = self.columns.len();
        &self.data[i * width..(i + 1) * width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.columns.len().max(1))
    }

    /// Values of column `j`
    pub fn column(&self, j: usize) -> Vec<f64> {
        self.rows().map(|row| row[j]).collect()
    }

    /// New matrix holding the given rows, in the given order
    pub fn select(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.columns.len());
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Self {
            columns: self.columns.clone(),
            data,
            n_rows: indices.len(),
        }
    }

    /// Contiguous block of rows
    pub fn slice(&self, range: Range<usize>) -> Self {
        let width = self.columns.len();
        let start = range.start.min(self.n_rows);
        let end = range.end.clamp(start, self.n_rows);
        Self {
            columns: self.columns.clone(),
            data: self.data[start * width..end * width].to_vec(),
            n_rows: end - start,
        }
    }
}

/// Serialized form of a [`FeatureMatrix`], checked before use
#[derive(Deserialize)]
struct MatrixParts {
    columns: Vec<String>,
    data: Vec<f64>,
    n_rows: usize,
}

impl TryFrom<MatrixParts> for FeatureMatrix {
    type Error = MaintenanceError;

    fn try_from(parts: MatrixParts) -> Result<Self> {
        if parts.columns.is_empty() {
            return Err(MaintenanceError::invalid_argument(
                "feature matrix needs at least one column",
            ));
        }
        let expected = parts.n_rows.checked_mul(parts.columns.len());
        if expected != Some(parts.data.len()) {
            return Err(MaintenanceError::shape_mismatch(format!(
                "{} values cannot fill {} rows of {} columns",
                parts.data.len(),
                parts.n_rows,
                parts.columns.len()
            )));
        }
        Ok(Self {
            columns: parts.columns,
            data: parts.data,
            n_rows: parts.n_rows,
        })
    }
}

/// Binary fault labels aligned with the rows of a [`FeatureMatrix`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct LabelVector {
    labels: Vec<u8>,
}

impl LabelVector {
    /// Build a label vector, rejecting values outside `{0, 1}`
    pub fn new(labels: Vec<u8>) -> Result<Self> {
        for (i, &label) in labels.iter().enumerate() {
            check_label(label, i)?;
        }
        Ok(Self { labels })
    }

    pub(crate) fn from_validated(labels: Vec<u8>) -> Self {
        Self { labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.labels
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.labels.iter().copied()
    }

    pub fn get(&self, i: usize) -> Option<u8> {
        self.labels.get(i).copied()
    }

    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }

    pub fn slice(&self, range: Range<usize>) -> Self {
        let start = range.start.min(self.labels.len());
        let end = range.end.clamp(start, self.labels.len());
        Self {
            labels: self.labels[start..end].to_vec(),
        }
    }

    /// Distinct labels, ascending
    pub fn classes(&self) -> Vec<u8> {
        let mut classes = self.labels.clone();
        classes.sort_unstable();
        classes.dedup();
        classes
    }

    pub fn count(&self, label: u8) -> usize {
        self.labels.iter().filter(|&&l| l == label).count()
    }
}

/// Human-readable outcome of a single prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Prediction {
    Normal,
    Fault,
}

impl Prediction {
    pub fn from_label(label: u8) -> Self {
        if label == FAULT_LABEL {
            Prediction::Fault
        } else {
            Prediction::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Prediction::Normal => "Normal",
            Prediction::Fault => "Fault",
        }
    }
}

impl TryFrom<Vec<u8>> for LabelVector {
    type Error = MaintenanceError;

    fn try_from(labels: Vec<u8>) -> Result<Self> {
        Self::new(labels)
    }
}

impl From<LabelVector> for Vec<u8> {
    fn from(labels: LabelVector) -> Self {
        labels.labels
    }
}

pub(crate) fn sensor_column_names() -> Vec<String> {
    SENSOR_COLUMNS.iter().map(|c| c.to_string()).collect()
}
