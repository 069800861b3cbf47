use primitive_logit::utils::quarter_means;
use primitive_logit::{
    accuracy, argmax_accuracy, load_csv, numeric_rows, separable_dataset, CsvOptions,
    LogisticRegression, Matrix, Predictor, RegressionConfig, SplitTest, Tensor,
};
use std::fmt::Write as _;

fn scenario_config() -> RegressionConfig {
    RegressionConfig::new(10)
        .with_learning_rate(0.5)
        .with_iterations(50)
        .with_decision_boundary(0.5)
}

fn trained_on_separable_data() -> LogisticRegression {
    let (features, labels) = separable_dataset(100, 11);
    let mut model: LogisticRegression =
        LogisticRegression::from_rows(&features, &labels, scenario_config()).unwrap();
    model.train().unwrap();
    model
}

#[test]
fn separable_data_is_learned() {
    let model = trained_on_separable_data();
    let (test_x, test_y) = separable_dataset(100, 12);
    let test_x = Matrix::from_rows(&test_x).unwrap();
    let test_y = Matrix::from_rows(&test_y).unwrap();
    let acc = model.test(&test_x, &test_y).unwrap();
    assert!(acc > 0.9, "accuracy {acc}");
    assert_eq!(model.cost_history().len(), 50);
}

#[test]
fn cost_falls_over_training() {
    let model = trained_on_separable_data();
    let chronological: Vec<f64> = model.cost_history().iter().rev().copied().collect();
    let (first, last) = quarter_means(&chronological).unwrap();
    assert!(first > last, "first quarter {first}, last quarter {last}");
    assert!(chronological[0] < 2f64.ln());
}

#[test]
fn binary_accuracy_counts_matches() {
    let labels = Matrix::from_rows(&[vec![1.0], vec![0.0], vec![1.0], vec![1.0]]).unwrap();
    let predictions = Matrix::from_rows(&[vec![1.0], vec![0.0], vec![0.0], vec![1.0]]).unwrap();
    assert_eq!(accuracy(&predictions, &labels).unwrap(), 0.75);
}

#[test]
fn one_vs_all_on_three_clusters() {
    let centers = [(-6.0, 0.0), (6.0, 0.0), (0.0, 8.0)];
    let mut features = Vec::new();
    let mut labels = Vec::new();
    for i in 0..60 {
        let class = i % 3;
        let (cx, cy) = centers[class];
        let jitter = (i / 3) as f64 / 20.0 - 0.5;
        features.push(vec![cx + jitter, cy - jitter]);
        labels.push(primitive_logit::one_hot(class, 3));
    }
    let config = RegressionConfig::new(10).with_learning_rate(0.5).with_iterations(30);
    let mut model: LogisticRegression =
        LogisticRegression::from_rows(&features, &labels, config).unwrap();
    model.train().unwrap();
    assert_eq!(model.weights().shape(), (3, 3));

    let x = Matrix::from_rows(&features).unwrap();
    let y = Matrix::from_rows(&labels).unwrap();
    let proba = model.predict_proba(&x).unwrap();
    assert!(argmax_accuracy(&proba, &y).unwrap() > 0.9);
    assert!(model.test(&x, &y).unwrap() > 0.85);
}

#[test]
fn csv_pipeline_trains_and_persists() {
    let (features, labels) = separable_dataset(150, 21);
    let mut csv = String::from("passed,x1,x2,name\n");
    for (i, (row, label)) in features.iter().zip(&labels).enumerate() {
        let passed = if label[0] == 1.0 { "TRUE" } else { "FALSE" };
        writeln!(csv, "{passed},{},{},car {i}", row[0], row[1]).unwrap();
    }
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cars.csv");
    std::fs::write(&path, csv).unwrap();

    let options = CsvOptions::new(["x1", "x2"], ["passed"])
        .with_converter("passed", |v| Some(if v == "TRUE" { 1.0 } else { 0.0 }))
        .shuffled(42)
        .split(SplitTest::Count(50));
    let data = load_csv(&path, &options).unwrap();
    let train_x = numeric_rows(&data.features).unwrap();
    let train_y = numeric_rows(&data.labels).unwrap();
    let test_x = Matrix::from_rows(&numeric_rows(&data.test_features.unwrap()).unwrap()).unwrap();
    let test_y = Matrix::from_rows(&numeric_rows(&data.test_labels.unwrap()).unwrap()).unwrap();
    assert_eq!(train_x.len(), 100);

    let mut model: LogisticRegression =
        LogisticRegression::from_rows(&train_x, &train_y, scenario_config()).unwrap();
    model.train().unwrap();
    let acc = model.test(&test_x, &test_y).unwrap();
    assert!(acc > 0.9, "accuracy {acc}");

    let model_path = dir.path().join("emissions.json.gz");
    let predictor = model.into_predictor();
    predictor.save(&model_path).unwrap();
    let loaded: Predictor = Predictor::load(&model_path).unwrap();
    assert_eq!(loaded.test(&test_x, &test_y).unwrap(), acc);
}

#[cfg(feature = "ndarray")]
#[test]
fn ndarray_backend_trains_identically() {
    use ndarray::Array2;
    let (features, labels) = separable_dataset(100, 11);
    let mut model: LogisticRegression<Array2<f64>> =
        LogisticRegression::from_rows(&features, &labels, scenario_config()).unwrap();
    model.train().unwrap();
    let reference = trained_on_separable_data();
    for (a, b) in model.cost_history().iter().zip(reference.cost_history()) {
        assert!((a - b).abs() < 1e-6);
    }
}
