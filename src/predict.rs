//! Thresholded prediction, evaluation and persistence of a fitted model.
use crate::activations::{Activation, Sigmoid};
use crate::error::{Error, Result};
use crate::metrics::accuracy;
use crate::standardize::Standardizer;
use crate::tensor::{Matrix, Tensor};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// The parts of a model needed at inference time: weights, the training
/// standardization parameters and the decision boundary.
#[derive(Debug, Clone)]
pub struct Predictor<T: Tensor = Matrix> {
    weights: T,
    standardizer: Standardizer,
    decision_boundary: f64,
}

impl<T: Tensor> Predictor<T> {
    /// `weights` must be `(D+1) x K` where `D` is the standardizer width.
    pub fn new(weights: T, standardizer: Standardizer, decision_boundary: f64) -> Result<Self> {
        standardizer.validate()?;
        if weights.nrows() != standardizer.width() + 1 {
            return Err(Error::shape(
                "predictor weights",
                (standardizer.width() + 1, weights.ncols()),
                weights.shape(),
            ));
        }
        if !(decision_boundary > 0.0 && decision_boundary < 1.0) {
            return Err(Error::config(
                "decision_boundary",
                format!("must lie in (0, 1), got {decision_boundary}"),
            ));
        }
        Ok(Self {
            weights,
            standardizer,
            decision_boundary,
        })
    }

    pub fn weights(&self) -> &T {
        &self.weights
    }

    pub(crate) fn set_weights(&mut self, weights: T) {
        debug_assert_eq!(weights.shape(), self.weights.shape());
        self.weights = weights;
    }

    pub fn standardizer(&self) -> &Standardizer {
        &self.standardizer
    }

    pub fn decision_boundary(&self) -> f64 {
        self.decision_boundary
    }

    /// Number of label columns the model predicts.
    pub fn outputs(&self) -> usize {
        self.weights.ncols()
    }

    /// `sigmoid(preprocess(observations) · weights)`
    pub fn predict_proba(&self, observations: &T) -> Result<T> {
        let x = self.standardizer.preprocess(observations)?;
        Ok(Sigmoid.apply_tensor(&x.matmul(&self.weights)?))
    }

    /// 1 where the probability is strictly above the decision boundary, else 0.
    pub fn predict(&self, observations: &T) -> Result<T> {
        let boundary = self.decision_boundary;
        Ok(self
            .predict_proba(observations)?
            .map(|p| if p > boundary { 1.0 } else { 0.0 }))
    }

    /// Fraction of prediction cells that match `labels`.
    ///
    /// For one-hot labels this is per-cell agreement, not top-1 accuracy;
    /// see [`crate::metrics::argmax_accuracy`] for the latter.
    pub fn test(&self, features: &T, labels: &T) -> Result<f64> {
        let predictions = self.predict(features)?;
        accuracy(&predictions, labels)
    }

    /// Save to a gzip-compressed JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let dto = PredictorDto::from_predictor(self);
        let json = serde_json::to_vec(&dto)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        let mut enc = GzEncoder::new(file, Compression::default());
        enc.write_all(&json)?;
        enc.finish()?;
        Ok(())
    }

    /// Load a file written by [`Predictor::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let mut dec = GzDecoder::new(file);
        let mut buf = Vec::new();
        dec.read_to_end(&mut buf)?;
        let dto: PredictorDto = serde_json::from_slice(&buf)?;
        dto.into_predictor()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PredictorDto {
    weights: Vec<Vec<f64>>, // [D+1][K]
    standardizer: Standardizer,
    decision_boundary: f64,
}

impl PredictorDto {
    fn from_predictor<T: Tensor>(predictor: &Predictor<T>) -> Self {
        // JSON has no NaN/inf
        let weights = predictor
            .weights
            .to_rows()
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|w| if w.is_finite() { w } else { 0.0 })
                    .collect()
            })
            .collect();
        Self {
            weights,
            standardizer: predictor.standardizer.clone(),
            decision_boundary: predictor.decision_boundary,
        }
    }

    fn into_predictor<T: Tensor>(self) -> Result<Predictor<T>> {
        let weights = T::from_rows(&self.weights)?;
        Predictor::new(weights, self.standardizer, self.decision_boundary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ZeroVariancePolicy;

    fn fitted() -> Predictor {
        let train = Matrix::from_rows(&[vec![0.0], vec![2.0]]).unwrap();
        let scaler = Standardizer::fit(&train, ZeroVariancePolicy::Clamp).unwrap();
        // bias 0, slope 3 on the standardized feature
        let weights = Matrix::from_vec(2, 1, vec![0.0, 3.0]).unwrap();
        Predictor::new(weights, scaler, 0.5).unwrap()
    }

    #[test]
    fn thresholds_strictly_above_boundary() {
        let predictor = fitted();
        let obs = Matrix::from_rows(&[vec![0.0], vec![1.0], vec![2.0]]).unwrap();
        let proba = predictor.predict_proba(&obs).unwrap();
        assert_eq!(proba.get(1, 0), 0.5);
        let predicted = predictor.predict(&obs).unwrap();
        assert_eq!(predicted.as_slice(), &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn rejects_wrong_feature_width() {
        let predictor = fitted();
        let obs = Matrix::from_rows(&[vec![0.0, 1.0]]).unwrap();
        assert!(matches!(
            predictor.predict(&obs),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn rejects_weights_of_wrong_height() {
        let scaler = fitted().standardizer().clone();
        let weights = Matrix::zeros(5, 1);
        assert!(Predictor::new(weights, scaler, 0.5).is_err());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("emissions.json.gz");
        let predictor = fitted();
        predictor.save(&path).unwrap();
        let loaded: Predictor = Predictor::load(&path).unwrap();
        assert_eq!(loaded.weights(), predictor.weights());
        assert_eq!(loaded.standardizer(), predictor.standardizer());
        let obs = Matrix::from_rows(&[vec![1.7]]).unwrap();
        assert_eq!(
            loaded.predict(&obs).unwrap(),
            predictor.predict(&obs).unwrap()
        );
    }

    #[test]
    fn load_rejects_corrupt_standardizer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.json.gz");
        let json = r#"{
            "weights": [[0.0], [3.0]],
            "standardizer": {"mean": [1.0], "variance": [-1.0]},
            "decision_boundary": 0.5
        }"#;
        let mut enc = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        enc.write_all(json.as_bytes()).unwrap();
        enc.finish().unwrap();
        let loaded: Result<Predictor> = Predictor::load(&path);
        assert!(matches!(
            loaded,
            Err(Error::Configuration { field: "variance", .. })
        ));
    }
}
