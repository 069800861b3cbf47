//! Cross-entropy cost for sigmoid outputs.
use crate::error::{Error, Result};
use crate::tensor::Tensor;

/// Clamp a probability into `[eps, 1 - eps]` so `ln` stays finite.
pub fn clip_probability(p: f64, eps: f64) -> f64 {
    if !p.is_finite() || p < eps {
        eps
    } else if p > 1.0 - eps {
        1.0 - eps
    } else {
        p
    }
}

/// Mean binary cross-entropy over all rows:
/// `-(1/N) * sum(y * ln(g) + (1 - y) * ln(1 - g))`.
///
/// With several label columns the per-column costs are summed, which is the
/// trace of `-(1/N) * [yᵗ·ln(g) + (1-y)ᵗ·ln(1-g)]`.
pub fn cross_entropy_cost<T: Tensor>(guesses: &T, labels: &T, eps: f64) -> Result<f64> {
    if guesses.shape() != labels.shape() {
        return Err(Error::shape("cross_entropy", labels.shape(), guesses.shape()));
    }
    let n = labels.nrows();
    if n == 0 {
        return Err(Error::EmptyDataset);
    }
    let guesses = guesses.map(|g| clip_probability(g, eps));
    let positive = labels.mul_elem(&guesses.map(f64::ln))?;
    let negative = labels
        .map(|y| 1.0 - y)
        .mul_elem(&guesses.map(|g| (1.0 - g).ln()))?;
    Ok(-(positive.sum() + negative.sum()) / n as f64)
}
