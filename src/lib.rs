//! A minimal logistic regression crate: batch gradient descent with feature
//! standardization, cross-entropy cost tracking and an adaptive learning rate.
//!
//! - Binary (one label column) and one-vs-all (one-hot label columns) models
//! - Pluggable dense matrix backend through [`Tensor`]
//! - CSV and MNIST (IDX) loaders
//! - Utility helpers for synthetic data and summaries

pub mod activations;
pub mod config;
pub mod datasets;
pub mod error;
pub mod loss;
pub mod metrics;
pub mod predict;
pub mod regression;
pub mod schedule;
pub mod standardize;
pub mod tensor;
pub mod utils;

pub use activations::{Activation, Sigmoid};
pub use config::{RegressionConfig, ZeroVariancePolicy};
pub use datasets::{
    load_csv, load_mnist, numeric_rows, one_hot, Cell, CsvData, CsvOptions, SplitTest,
};
pub use error::{Error, Result};
pub use loss::cross_entropy_cost;
pub use metrics::{accuracy, argmax_accuracy, confusion_matrix};
pub use predict::Predictor;
pub use regression::LogisticRegression;
pub use schedule::{AdaptiveLearningRate, RateChange};
pub use standardize::Standardizer;
pub use tensor::{Matrix, Tensor};
pub use utils::{print_model_summary, print_summary_table, separable_dataset};
