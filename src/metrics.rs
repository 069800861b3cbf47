//! Metrics for evaluating classifier output.
use crate::error::{Error, Result};
use crate::tensor::Tensor;

fn check_same_shape<T: Tensor>(predictions: &T, labels: &T, operation: &'static str) -> Result<()> {
    if predictions.shape() != labels.shape() {
        return Err(Error::shape(operation, labels.shape(), predictions.shape()));
    }
    if labels.nrows() == 0 {
        return Err(Error::EmptyDataset);
    }
    Ok(())
}

/// Cell-wise accuracy: `(cells - sum(|pred - label|)) / cells`.
///
/// Identical to ordinary accuracy for a single label column. For one-hot
/// labels every cell counts, so a wrong row costs two cells out of `K`.
pub fn accuracy<T: Tensor>(predictions: &T, labels: &T) -> Result<f64> {
    check_same_shape(predictions, labels, "accuracy")?;
    let (rows, cols) = labels.shape();
    let total = (rows * cols) as f64;
    let incorrect = predictions.sub(labels)?.map(f64::abs).sum();
    Ok((total - incorrect) / total)
}

fn argmax(row: &[f64]) -> usize {
    row.iter()
        .enumerate()
        .fold(0usize, |max_i, (i, &v)| if v > row[max_i] { i } else { max_i })
}

/// Conventional top-1 accuracy over one-hot (or score) rows.
pub fn argmax_accuracy<T: Tensor>(predictions: &T, labels: &T) -> Result<f64> {
    check_same_shape(predictions, labels, "argmax_accuracy")?;
    let correct = predictions
        .to_rows()
        .iter()
        .zip(labels.to_rows().iter())
        .filter(|(p, t)| argmax(p) == argmax(t))
        .count();
    Ok(correct as f64 / labels.nrows() as f64)
}

/// Confusion matrix indexed `[true_class][predicted_class]` from one-hot rows.
pub fn confusion_matrix<T: Tensor>(predictions: &T, labels: &T) -> Result<Vec<Vec<usize>>> {
    check_same_shape(predictions, labels, "confusion_matrix")?;
    let classes = labels.ncols();
    let mut cm = vec![vec![0; classes]; classes];
    for (p, t) in predictions.to_rows().iter().zip(labels.to_rows().iter()) {
        cm[argmax(t)][argmax(p)] += 1;
    }
    Ok(cm)
}
