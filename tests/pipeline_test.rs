//! End-to-end tests across generation, splitting, training and evaluation

use fault_forest::pipeline::{predict_reading, FAULTY_READING, NORMAL_READING};
use fault_forest::training::{N_ESTIMATORS, RANDOM_STATE};
use fault_forest::types::{NUM_SENSORS, SENSOR_COLUMNS};
use fault_forest::{
    evaluate, generate, holdout, split, train, train_test_split, ClassificationReport,
    Classifier, FeatureMatrix, LabelVector, MaintenanceError, MaintenancePipeline,
    PipelineConfig, SplitRatio,
};
use pretty_assertions::assert_eq;

#[test]
fn test_generate_row_count() {
    for n in [1, 10, 250, 1000] {
        assert_eq!(generate(n, 42).unwrap().len(), n);
    }
}

#[test]
fn test_generate_rejects_zero_samples() {
    assert!(matches!(
        generate(0, 42),
        Err(MaintenanceError::InvalidArgument(_))
    ));
}

#[test]
fn test_generate_is_reproducible() {
    assert_eq!(generate(500, 42).unwrap(), generate(500, 42).unwrap());
}

#[test]
fn test_fault_fraction_near_fifteen_percent() {
    let dataset = generate(2000, 42).unwrap();
    let fraction = dataset.fault_fraction();
    assert!((0.12..=0.18).contains(&fraction), "fraction {fraction}");
    assert_eq!(dataset.fault_count(), 300);
}

#[test]
fn test_normal_rows_stay_in_range() {
    let dataset = generate(1000, 42).unwrap();
    let bounds = [
        (30.0, 70.0),
        (60.0, 140.0),
        (1.0, 9.0),
        (12.0, 28.0),
        (800.0, 1200.0),
    ];

    for record in dataset.iter().filter(|r| !r.is_fault()) {
        for (value, (low, high)) in record.readings().into_iter().zip(bounds) {
            assert!((low..=high).contains(&value), "{value} outside [{low}, {high}]");
        }
    }
}

#[test]
fn test_split_columns_and_labels() {
    let dataset = generate(50, 42).unwrap();
    let (features, labels) = split(&dataset);

    assert_eq!(features.shape(), (50, NUM_SENSORS));
    assert_eq!(features.columns(), SENSOR_COLUMNS.map(String::from).as_slice());
    for (i, record) in dataset.iter().enumerate() {
        assert_eq!(features.row(i), record.readings().as_slice());
        assert_eq!(labels.get(i), Some(record.fault));
    }
}

#[test]
fn test_ten_samples_are_usable() {
    let dataset = generate(10, 42).unwrap();
    let (features, labels) = split(&dataset);
    assert_eq!(features.n_rows(), 10);
    assert_eq!(labels.len(), 10);
    assert_eq!(labels.count(1), 1);
}

#[test]
fn test_train_uses_fixed_configuration() {
    let (features, labels) = split(&generate(150, 42).unwrap());
    let model = train(&features, &labels).unwrap();

    assert_eq!(model.n_trees(), N_ESTIMATORS);
    assert_eq!(model.config().n_estimators, 100);
    assert_eq!(model.config().random_state, RANDOM_STATE);
}

#[test]
fn test_small_positional_holdout() {
    let (features, labels) = split(&generate(300, 42).unwrap());
    let parts = holdout(&features, &labels, SplitRatio::SEVENTY_THIRTY).unwrap();
    assert_eq!(parts.train_labels.len(), 210);
    assert_eq!(parts.test_labels.len(), 90);

    let model = train(&parts.train_features, &parts.train_labels).unwrap();
    let (accuracy, report) = evaluate(&model, &parts.test_features, &parts.test_labels).unwrap();

    assert!(accuracy > 0.5, "accuracy {accuracy}");
    assert!(report.contains("precision"));

    for reading in [NORMAL_READING, FAULTY_READING] {
        let labels = model.predict(&FeatureMatrix::from_readings(&[reading])).unwrap();
        assert_eq!(labels.len(), 1);
        assert!(labels.iter().all(|l| l == 0 || l == 1));
    }
}

#[test]
fn test_thousand_samples_positional_holdout_accuracy() {
    let (features, labels) = split(&generate(1000, 42).unwrap());
    let parts = holdout(&features, &labels, SplitRatio::SEVENTY_THIRTY).unwrap();
    assert_eq!(parts.train_labels.len(), 700);
    assert_eq!(parts.test_labels.len(), 300);

    let model = train(&parts.train_features, &parts.train_labels).unwrap();
    let (accuracy, report) = evaluate(&model, &parts.test_features, &parts.test_labels).unwrap();

    assert!(accuracy >= 0.75, "accuracy {accuracy}");
    assert!(report.contains("precision"));
}

#[test]
fn test_thousand_samples_stratified_accuracy() {
    let (features, labels) = split(&generate(1000, 42).unwrap());
    let parts = train_test_split(&features, &labels, 0.3, 42, true).unwrap();

    // Stratification keeps both classes on both sides
    assert_eq!(parts.train_labels.classes(), vec![0, 1]);
    assert_eq!(parts.test_labels.classes(), vec![0, 1]);

    let model = train(&parts.train_features, &parts.train_labels).unwrap();
    let (accuracy, report) = evaluate(&model, &parts.test_features, &parts.test_labels).unwrap();

    assert!(accuracy >= 0.75, "accuracy {accuracy}");
    for needle in ["precision", "recall", "f1-score"] {
        assert!(report.contains(needle));
    }
}

#[test]
fn test_all_normal_training_data() {
    let dataset = generate(100, 42).unwrap();
    let (features, _) = split(&dataset);
    let labels = LabelVector::new(vec![0; 100]).unwrap();

    let model = train(&features, &labels).unwrap();
    let predictions = model.predict(&features).unwrap();

    assert_eq!(predictions.len(), 100);
    assert!(predictions.iter().all(|p| p == 0 || p == 1));
    assert_eq!(
        predict_reading(&model, FAULTY_READING).unwrap().as_str(),
        "Normal"
    );
}

#[test]
fn test_report_matches_evaluation() {
    let (features, labels) = split(&generate(200, 7).unwrap());
    let parts = holdout(&features, &labels, SplitRatio::EIGHTY_TWENTY).unwrap();
    let model = train(&parts.train_features, &parts.train_labels).unwrap();

    let (accuracy, text) = evaluate(&model, &parts.test_features, &parts.test_labels).unwrap();
    let predictions = model.predict(&parts.test_features).unwrap();
    let report = ClassificationReport::compute(&parts.test_labels, &predictions).unwrap();

    assert_eq!(report.accuracy, accuracy);
    assert_eq!(report.to_string(), text);
}

#[test]
fn test_pipeline_defaults() {
    let outcome = MaintenancePipeline::new(PipelineConfig::default())
        .run()
        .unwrap();

    assert_eq!(outcome.fault_distribution.total(), 2000);
    assert_eq!(outcome.fault_distribution.fault, 300);
    assert_eq!(outcome.shapes.test_features, (600, NUM_SENSORS));
    assert_eq!(outcome.shapes.train_features, (1400, NUM_SENSORS));
    assert_eq!(outcome.preview.len(), 5);
    assert!(outcome.accuracy >= 0.75);
    assert!(
        (outcome
            .feature_importances
            .iter()
            .map(|f| f.importance)
            .sum::<f64>()
            - 1.0)
            .abs()
            < 1e-9
    );
}
