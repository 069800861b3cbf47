// ml_examples/src/main.rs
use anyhow::Result;
use primitive_logit::{
    print_model_summary, print_summary_table, separable_dataset, LogisticRegression, Matrix,
    RegressionConfig, Tensor,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Optional JSON config for the synthetic demo, e.g. {"batchSize": 10}
    let config = match std::env::args().nth(1) {
        Some(path) => RegressionConfig::from_json_file(path)?,
        None => RegressionConfig::new(10)
            .with_learning_rate(0.5)
            .with_iterations(50),
    };
    tracing::info!(?config, "synthetic demo configuration");

    println!("=== Synthetic separable dataset ===");
    let (features, labels) = separable_dataset(100, 1);
    let (test_features, test_labels) = separable_dataset(100, 2);
    let mut model: LogisticRegression = LogisticRegression::from_rows(&features, &labels, config)?;
    print_model_summary(&model);
    model.train()?;
    let accuracy = model.test(
        &Matrix::from_rows(&test_features)?,
        &Matrix::from_rows(&test_labels)?,
    )?;
    println!("Synthetic Accuracy: {:.2}%", accuracy * 100.0);
    print_summary_table(model.cost_history(), "Synthetic Cost");

    #[cfg(feature = "cars")]
    {
        use primitive_logit::{load_csv, numeric_rows, CsvOptions, Predictor, SplitTest};

        println!("\n=== Vehicle emissions ===");
        let cars_csv = concat!(env!("CARGO_MANIFEST_DIR"), "/data/cars.csv");
        let options = CsvOptions::new(["horsepower", "displacement", "weight"], ["passedemissions"])
            .with_converter("passedemissions", |v| Some(if v == "TRUE" { 1.0 } else { 0.0 }))
            .shuffled(42)
            .split(SplitTest::Count(50));
        let data = load_csv(cars_csv, &options)?;
        let test_features = data.test_features.unwrap_or_default();
        let test_labels = data.test_labels.unwrap_or_default();

        let config = RegressionConfig::new(10)
            .with_learning_rate(0.5)
            .with_iterations(100)
            .with_decision_boundary(0.6);
        let mut cars: LogisticRegression = LogisticRegression::from_rows(
            &numeric_rows(&data.features)?,
            &numeric_rows(&data.labels)?,
            config,
        )?;
        print_model_summary(&cars);
        cars.train()?;
        let test_x = Matrix::from_rows(&numeric_rows(&test_features)?)?;
        let test_y = Matrix::from_rows(&numeric_rows(&test_labels)?)?;
        println!("Emissions Accuracy: {:.2}%", cars.test(&test_x, &test_y)? * 100.0);
        print_summary_table(cars.cost_history(), "Emissions Cost");

        // Demo: save and load model
        let predictor = cars.into_predictor();
        predictor.save("models/emissions_model.json.gz")?;
        let reloaded: Predictor = Predictor::load("models/emissions_model.json.gz")?;
        println!(
            "Emissions Accuracy (reloaded): {:.2}%",
            reloaded.test(&test_x, &test_y)? * 100.0
        );
    }

    #[cfg(feature = "mnist")]
    {
        use primitive_logit::{argmax_accuracy, confusion_matrix, load_mnist};

        println!("\n=== MNIST Subset (first 1000) ===");
        let data = concat!(env!("CARGO_MANIFEST_DIR"), "/data");
        let (features, labels) = load_mnist(
            format!("{data}/train-images-idx3-ubyte.gz"),
            format!("{data}/train-labels-idx1-ubyte.gz"),
            Some(1000),
        )?;
        let (test_features, test_labels) = load_mnist(
            format!("{data}/t10k-images-idx3-ubyte.gz"),
            format!("{data}/t10k-labels-idx1-ubyte.gz"),
            Some(100),
        )?;

        let config = RegressionConfig::new(100)
            .with_learning_rate(1.0)
            .with_iterations(5);
        let mut digits: LogisticRegression =
            LogisticRegression::from_rows(&features, &labels, config)?;
        print_model_summary(&digits);
        digits.train()?;

        let test_x = Matrix::from_rows(&test_features)?;
        let test_y = Matrix::from_rows(&test_labels)?;
        println!("MNIST Cell Accuracy: {:.2}%", digits.test(&test_x, &test_y)? * 100.0);
        let proba = digits.predict_proba(&test_x)?;
        println!("MNIST Top-1 Accuracy: {:.2}%", argmax_accuracy(&proba, &test_y)? * 100.0);
        println!("Confusion matrix (rows=true, cols=pred):");
        for row in confusion_matrix(&proba, &test_y)? {
            let line: Vec<String> = row.iter().map(|c| format!("{c:4}")).collect();
            println!("{}", line.join(""));
        }
        print_summary_table(digits.cost_history(), "MNIST Cost");
    }

    println!("\nFinal weights shape: {:?}", model.weights().shape());
    Ok(())
}
