//! Error type shared by every module of the crate.
use std::path::PathBuf;

/// Everything that can go wrong while loading data, configuring, training,
/// predicting or persisting a model.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A hyperparameter is missing or outside its valid range.
    #[error("invalid configuration for `{field}`: {reason}")]
    Configuration { field: &'static str, reason: String },

    /// Two matrices (or a matrix and a parameter vector) disagree in shape.
    #[error("shape mismatch in {operation}: expected {expected}, got {got}")]
    ShapeMismatch {
        operation: &'static str,
        expected: String,
        got: String,
    },

    /// A feature column has zero variance and the policy forbids clamping.
    #[error("feature column {column} has zero variance")]
    ZeroVariance { column: usize },

    /// No rows were supplied where at least one is needed.
    #[error("dataset is empty")]
    EmptyDataset,

    /// A requested CSV column is not present in the header row.
    #[error("column `{0}` not found in header")]
    UnknownColumn(String),

    /// A cell that must be numeric holds free text.
    #[error("row {row}, column {column}: `{value}` is not numeric")]
    NonNumeric {
        row: usize,
        column: usize,
        value: String,
    },

    /// An IDX file has an unexpected magic number or truncated payload.
    #[error("malformed IDX file {path}: {reason}")]
    Idx { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn shape(
        operation: &'static str,
        expected: (usize, usize),
        got: (usize, usize),
    ) -> Self {
        Error::ShapeMismatch {
            operation,
            expected: format!("{}x{}", expected.0, expected.1),
            got: format!("{}x{}", got.0, got.1),
        }
    }

    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Error::Configuration {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
