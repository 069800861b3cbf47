//! Logistic regression trained by mini-batch gradient descent.
use crate::activations::{Activation, Sigmoid};
use crate::config::RegressionConfig;
use crate::error::{Error, Result};
use crate::loss::cross_entropy_cost;
use crate::predict::Predictor;
use crate::schedule::{AdaptiveLearningRate, RateChange};
use crate::standardize::Standardizer;
use crate::tensor::{Matrix, Tensor};
use std::fmt;
use tracing::{debug, info};

/// Logistic regression over a fixed, in-memory training set.
///
/// Construction standardizes the features, prepends the bias column and
/// zero-initializes a `(D+1) x K` weight matrix. `K = 1` gives binary
/// classification; `K > 1` trains one-vs-all columns side by side.
#[derive(Debug, Clone)]
pub struct LogisticRegression<T: Tensor = Matrix> {
    /// Preprocessed training features, `N x (D+1)`.
    features: T,
    /// Training labels, `N x K`.
    labels: T,
    predictor: Predictor<T>,
    config: RegressionConfig,
    learning_rate: AdaptiveLearningRate,
    /// Most recent first.
    cost_history: Vec<f64>,
    steps: usize,
}

impl<T: Tensor> LogisticRegression<T> {
    /// Validate `config` and the shapes, fit the standardizer on `features`.
    pub fn new(features: T, labels: T, config: RegressionConfig) -> Result<Self> {
        config.validate()?;
        if features.nrows() != labels.nrows() {
            return Err(Error::ShapeMismatch {
                operation: "features/labels",
                expected: format!("{} label rows", features.nrows()),
                got: format!("{} label rows", labels.nrows()),
            });
        }
        if features.nrows() == 0 {
            return Err(Error::EmptyDataset);
        }
        if labels.ncols() == 0 {
            return Err(Error::ShapeMismatch {
                operation: "labels",
                expected: "at least 1 label column".to_string(),
                got: "0 columns".to_string(),
            });
        }
        let standardizer = Standardizer::fit(&features, config.zero_variance)?;
        let features = standardizer.preprocess(&features)?;
        let weights = T::zeros(features.ncols(), labels.ncols());
        let predictor = Predictor::new(weights, standardizer, config.decision_boundary)?;
        Ok(Self {
            features,
            labels,
            predictor,
            learning_rate: AdaptiveLearningRate::new(config.learning_rate),
            config,
            cost_history: Vec::new(),
            steps: 0,
        })
    }

    /// Convenience constructor from row vectors.
    pub fn from_rows(
        features: &[Vec<f64>],
        labels: &[Vec<f64>],
        config: RegressionConfig,
    ) -> Result<Self> {
        Self::new(T::from_rows(features)?, T::from_rows(labels)?, config)
    }

    /// Full batches per epoch; trailing rows that do not fill a batch are skipped.
    pub fn batch_count(&self) -> usize {
        self.features.nrows() / self.config.batch_size
    }

    /// Run `iterations` epochs. After each epoch the cost over the whole
    /// training set is recorded and the learning rate adapted.
    pub fn train(&mut self) -> Result<()> {
        let batch_size = self.config.batch_size;
        let batches = self.batch_count();
        for epoch in 0..self.config.iterations {
            for batch in 0..batches {
                let start = batch * batch_size;
                let features = self.features.slice_rows(start, batch_size)?;
                let labels = self.labels.slice_rows(start, batch_size)?;
                self.gradient_descent(&features, &labels)?;
            }
            let cost = self.record_cost()?;
            let change = self.update_learning_rate();
            debug!(
                epoch,
                cost,
                learning_rate = self.learning_rate.rate(),
                ?change,
                "epoch complete"
            );
        }
        info!(
            epochs = self.config.iterations,
            batches_per_epoch = batches,
            final_cost = self.cost_history.first().copied(),
            learning_rate = self.learning_rate.rate(),
            "training finished"
        );
        Ok(())
    }

    /// One update on a batch of preprocessed rows:
    /// `w -= lr * Xᵗ·(sigmoid(X·w) - y) / B`.
    pub fn gradient_descent(&mut self, features: &T, labels: &T) -> Result<()> {
        let rows = features.nrows();
        if rows == 0 {
            return Err(Error::EmptyDataset);
        }
        let weights = self.predictor.weights();
        let guesses = Sigmoid.apply_tensor(&features.matmul(weights)?);
        let differences = guesses.sub(labels)?;
        let slopes = features
            .transpose()
            .matmul(&differences)?
            .scale(1.0 / rows as f64);
        let updated = weights.sub(&slopes.scale(self.learning_rate.rate()))?;
        self.predictor.set_weights(updated);
        self.steps += 1;
        Ok(())
    }

    /// Cross-entropy over the full training set with the current weights,
    /// pushed to the front of the cost history.
    pub fn record_cost(&mut self) -> Result<f64> {
        let guesses = Sigmoid.apply_tensor(&self.features.matmul(self.predictor.weights())?);
        let cost = cross_entropy_cost(&guesses, &self.labels, self.config.log_epsilon)?;
        self.cost_history.insert(0, cost);
        Ok(cost)
    }

    /// Halve the rate if the last epoch got worse, otherwise grow it by 5%.
    pub fn update_learning_rate(&mut self) -> RateChange {
        self.learning_rate.adapt(&self.cost_history)
    }

    pub fn predict_proba(&self, observations: &T) -> Result<T> {
        self.predictor.predict_proba(observations)
    }

    pub fn predict(&self, observations: &T) -> Result<T> {
        self.predictor.predict(observations)
    }

    pub fn test(&self, features: &T, labels: &T) -> Result<f64> {
        self.predictor.test(features, labels)
    }

    /// Per-epoch costs, most recent first.
    pub fn cost_history(&self) -> &[f64] {
        &self.cost_history
    }

    /// Current (adapted) learning rate.
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate.rate()
    }

    pub fn weights(&self) -> &T {
        self.predictor.weights()
    }

    /// Total gradient-descent updates applied so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn config(&self) -> &RegressionConfig {
        &self.config
    }

    /// Bias-augmented, standardized training features.
    pub fn features(&self) -> &T {
        &self.features
    }

    pub fn labels(&self) -> &T {
        &self.labels
    }

    pub fn predictor(&self) -> &Predictor<T> {
        &self.predictor
    }

    /// Drop the training data, keeping what inference needs.
    pub fn into_predictor(self) -> Predictor<T> {
        self.predictor
    }
}

impl<T: Tensor> fmt::Display for LogisticRegression<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (n, width) = self.features.shape();
        write!(
            f,
            "LogisticRegression: {} rows, {} features (+bias), {} outputs, lr={:.4}",
            n,
            width - 1,
            self.labels.ncols(),
            self.learning_rate.rate()
        )
    }
}
