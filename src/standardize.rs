//! Feature standardization and bias augmentation.
use crate::config::ZeroVariancePolicy;
use crate::error::{Error, Result};
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};

/// Per-column mean and variance captured from training features.
///
/// Fitted once; every later call to [`Standardizer::transform`] reuses the
/// same parameters so training and inference see the same scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    mean: Vec<f64>,
    variance: Vec<f64>,
}

impl Standardizer {
    /// Compute column moments of `features`, applying `policy` to any
    /// constant column.
    ///
    /// Constancy is decided from the column range, not the computed
    /// variance, which rounding can leave slightly above zero. A constant
    /// column keeps its exact value as the mean so it standardizes to zeros.
    pub fn fit<T: Tensor>(features: &T, policy: ZeroVariancePolicy) -> Result<Self> {
        let (mut mean, mut variance) = features.column_moments()?;
        for (column, value) in constant_columns(features) {
            match policy {
                ZeroVariancePolicy::Clamp => {
                    mean[column] = value;
                    variance[column] = 1.0;
                }
                ZeroVariancePolicy::Reject => return Err(Error::ZeroVariance { column }),
            }
        }
        Ok(Self { mean, variance })
    }

    /// Check parameters that came from outside [`Standardizer::fit`], e.g. a
    /// deserialized model.
    pub fn validate(&self) -> Result<()> {
        if self.mean.len() != self.variance.len() {
            return Err(Error::ShapeMismatch {
                operation: "standardizer",
                expected: format!("{} variances", self.mean.len()),
                got: format!("{} variances", self.variance.len()),
            });
        }
        if let Some(m) = self.mean.iter().find(|m| !m.is_finite()) {
            return Err(Error::config("mean", format!("must be finite, got {m}")));
        }
        if let Some(v) = self.variance.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
            return Err(Error::config("variance", format!("must be finite and > 0, got {v}")));
        }
        Ok(())
    }

    /// Raw feature width this standardizer was fitted on.
    pub fn width(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Variance after the zero-variance policy was applied.
    pub fn variance(&self) -> &[f64] {
        &self.variance
    }

    /// `(x - mean) / sqrt(variance)` with the stored parameters.
    pub fn transform<T: Tensor>(&self, features: &T) -> Result<T> {
        if features.ncols() != self.width() {
            return Err(Error::shape(
                "standardize",
                (features.nrows(), self.width()),
                features.shape(),
            ));
        }
        let std_dev: Vec<f64> = self.variance.iter().map(|v| v.sqrt()).collect();
        features.sub_row(&self.mean)?.div_row(&std_dev)
    }

    /// Standardize, then prepend the bias column: N x D becomes N x (D+1).
    pub fn preprocess<T: Tensor>(&self, features: &T) -> Result<T> {
        prepend_bias(&self.transform(features)?)
    }
}

/// `(column, value)` for every column whose values are all identical.
fn constant_columns<T: Tensor>(features: &T) -> Vec<(usize, f64)> {
    let rows = features.to_rows();
    let Some(first) = rows.first() else {
        return Vec::new();
    };
    first
        .iter()
        .enumerate()
        .filter(|&(column, &value)| rows.iter().all(|row| row[column] == value))
        .map(|(column, &value)| (column, value))
        .collect()
}

/// Prepend a column of ones as column 0.
pub fn prepend_bias<T: Tensor>(features: &T) -> Result<T> {
    T::filled(features.nrows(), 1, 1.0).hstack(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::Matrix;

    fn features() -> Matrix {
        Matrix::from_rows(&[
            vec![1.0, 10.0, 7.0],
            vec![2.0, 30.0, 7.0],
            vec![3.0, 20.0, 7.0],
            vec![6.0, 60.0, 7.0],
        ])
        .unwrap()
    }

    #[test]
    fn standardized_columns_have_zero_mean_unit_variance() {
        let x = features();
        let scaler = Standardizer::fit(&x, ZeroVariancePolicy::Clamp).unwrap();
        let z = scaler.transform(&x).unwrap();
        let (mean, variance) = z.column_moments().unwrap();
        for c in 0..2 {
            assert!(mean[c].abs() < 1e-12);
            assert!((variance[c] - 1.0).abs() < 1e-12);
        }
        // zero-variance column becomes zeros, not NaN
        for r in 0..z.nrows() {
            assert_eq!(z.get(r, 2), 0.0);
        }
    }

    #[test]
    fn constant_column_with_rounding_noise_becomes_zeros() {
        // 0.1 is not dyadic, so the computed variance is a few ulps above 0
        let x = Matrix::from_rows(&[vec![1.0, 0.1], vec![2.0, 0.1], vec![3.0, 0.1]]).unwrap();
        let scaler = Standardizer::fit(&x, ZeroVariancePolicy::Clamp).unwrap();
        assert_eq!(scaler.variance()[1], 1.0);
        let z = scaler.transform(&x).unwrap();
        assert!((0..3).all(|r| z.get(r, 1) == 0.0));

        let unseen = Matrix::from_rows(&[vec![2.0, 0.2]]).unwrap();
        let z = scaler.transform(&unseen).unwrap();
        assert!((z.get(0, 1) - 0.1).abs() < 1e-12);

        let err = Standardizer::fit(&x, ZeroVariancePolicy::Reject).unwrap_err();
        assert!(matches!(err, Error::ZeroVariance { column: 1 }));
    }

    #[test]
    fn validate_rejects_broken_parameters() {
        let ok = Standardizer::fit(&features(), ZeroVariancePolicy::Clamp).unwrap();
        assert!(ok.validate().is_ok());
        let uneven: Standardizer =
            serde_json::from_str(r#"{"mean": [1.0, 2.0], "variance": [1.0]}"#).unwrap();
        assert!(matches!(uneven.validate(), Err(Error::ShapeMismatch { .. })));
        let zero: Standardizer =
            serde_json::from_str(r#"{"mean": [1.0], "variance": [0.0]}"#).unwrap();
        assert!(matches!(
            zero.validate(),
            Err(Error::Configuration { field: "variance", .. })
        ));
    }

    #[test]
    fn zero_variance_can_be_rejected() {
        let err = Standardizer::fit(&features(), ZeroVariancePolicy::Reject).unwrap_err();
        assert!(matches!(err, Error::ZeroVariance { column: 2 }));
    }

    #[test]
    fn bias_column_is_all_ones() {
        let x = features();
        let scaler = Standardizer::fit(&x, ZeroVariancePolicy::Clamp).unwrap();
        let train = scaler.preprocess(&x).unwrap();
        let other = Matrix::from_rows(&[vec![100.0, -3.0, 0.0]]).unwrap();
        let infer = scaler.preprocess(&other).unwrap();
        assert_eq!(train.shape(), (4, 4));
        assert_eq!(infer.shape(), (1, 4));
        assert!((0..train.nrows()).all(|r| train.get(r, 0) == 1.0));
        assert_eq!(infer.get(0, 0), 1.0);
    }

    #[test]
    fn inference_reuses_training_parameters() {
        let scaler = Standardizer::fit(&features(), ZeroVariancePolicy::Clamp).unwrap();
        let before = scaler.clone();
        let a = Matrix::from_rows(&[vec![1.0, 1.0, 1.0], vec![2.0, 2.0, 2.0]]).unwrap();
        let shifted = a.map(|v| v + 5.0);
        let za = scaler.transform(&a).unwrap();
        let zb = scaler.transform(&shifted).unwrap();
        let std_dev: Vec<f64> = scaler.variance().iter().map(|v| v.sqrt()).collect();
        for r in 0..2 {
            for (c, sd) in std_dev.iter().enumerate() {
                assert!((zb.get(r, c) - za.get(r, c) - 5.0 / sd).abs() < 1e-12);
            }
        }
        assert_eq!(scaler, before);
    }

    #[test]
    fn width_mismatch_is_rejected() {
        let scaler = Standardizer::fit(&features(), ZeroVariancePolicy::Clamp).unwrap();
        let narrow = Matrix::from_rows(&[vec![1.0, 2.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&narrow),
            Err(Error::ShapeMismatch { operation: "standardize", .. })
        ));
    }
}
