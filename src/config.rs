//! Hyperparameters for training and prediction.
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_LEARNING_RATE: f64 = 0.1;
pub const DEFAULT_ITERATIONS: usize = 10;
pub const DEFAULT_DECISION_BOUNDARY: f64 = 0.5;
/// Guesses are clipped to `[eps, 1 - eps]` before taking logs.
pub const DEFAULT_LOG_EPSILON: f64 = 1e-12;

/// What to do with a training column whose variance is exactly zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroVariancePolicy {
    /// Treat the variance as 1, so the column standardizes to all zeros.
    #[default]
    Clamp,
    /// Fail with [`Error::ZeroVariance`].
    Reject,
}

/// Immutable training configuration, validated before any training starts.
///
/// `learning_rate` here is only the starting rate; the model keeps its own
/// adapted copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionConfig {
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Rows per gradient step. No default: it must always be supplied.
    pub batch_size: usize,
    #[serde(default = "default_decision_boundary")]
    pub decision_boundary: f64,
    #[serde(default)]
    pub zero_variance: ZeroVariancePolicy,
    #[serde(default = "default_log_epsilon")]
    pub log_epsilon: f64,
}

fn default_learning_rate() -> f64 {
    DEFAULT_LEARNING_RATE
}

fn default_iterations() -> usize {
    DEFAULT_ITERATIONS
}

fn default_decision_boundary() -> f64 {
    DEFAULT_DECISION_BOUNDARY
}

fn default_log_epsilon() -> f64 {
    DEFAULT_LOG_EPSILON
}

impl RegressionConfig {
    /// Defaults for everything but the batch size.
    pub fn new(batch_size: usize) -> Self {
        Self {
            learning_rate: DEFAULT_LEARNING_RATE,
            iterations: DEFAULT_ITERATIONS,
            batch_size,
            decision_boundary: DEFAULT_DECISION_BOUNDARY,
            zero_variance: ZeroVariancePolicy::default(),
            log_epsilon: DEFAULT_LOG_EPSILON,
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_decision_boundary(mut self, decision_boundary: f64) -> Self {
        self.decision_boundary = decision_boundary;
        self
    }

    pub fn with_zero_variance(mut self, policy: ZeroVariancePolicy) -> Self {
        self.zero_variance = policy;
        self
    }

    pub fn with_log_epsilon(mut self, log_epsilon: f64) -> Self {
        self.log_epsilon = log_epsilon;
        self
    }

    /// Parse and validate a JSON config, e.g.
    /// `{"learningRate": 0.5, "iterations": 100, "batchSize": 10}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(Error::config(
                "learning_rate",
                format!("must be a finite value > 0, got {}", self.learning_rate),
            ));
        }
        if self.iterations == 0 {
            return Err(Error::config("iterations", "must be > 0"));
        }
        if self.batch_size == 0 {
            return Err(Error::config("batch_size", "must be > 0"));
        }
        if !(self.decision_boundary > 0.0 && self.decision_boundary < 1.0) {
            return Err(Error::config(
                "decision_boundary",
                format!("must lie in (0, 1), got {}", self.decision_boundary),
            ));
        }
        if !(self.log_epsilon > 0.0 && self.log_epsilon < 0.5) {
            return Err(Error::config(
                "log_epsilon",
                format!("must lie in (0, 0.5), got {}", self.log_epsilon),
            ));
        }
        Ok(())
    }
}
