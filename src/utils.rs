//! Utility functions for synthetic data and terminal summaries.
use crate::regression::LogisticRegression;
use crate::tensor::Tensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Minimum distance from a sample to the separating line `2*x1 - x2 + 1 = 0`.
const MARGIN: f64 = 1.0;

/// Linearly separable 2-feature binary data, seeded. Label is 1 where
/// `2*x1 - x2 + 1 > 0`; no point lies closer than [`MARGIN`] to that line.
pub fn separable_dataset(n_samples: usize, seed: u64) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let norm = 5f64.sqrt();
    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    while features.len() < n_samples {
        let x1: f64 = rng.gen_range(-5.0..5.0);
        let x2: f64 = rng.gen_range(-5.0..5.0);
        let score = 2.0 * x1 - x2 + 1.0;
        if score.abs() / norm < MARGIN {
            continue;
        }
        features.push(vec![x1, x2]);
        labels.push(vec![if score > 0.0 { 1.0 } else { 0.0 }]);
    }
    (features, labels)
}

/// Mean of the first and last quarter of a chronological series.
pub fn quarter_means(values: &[f64]) -> Option<(f64, f64)> {
    let quarter = values.len() / 4;
    if quarter == 0 {
        return None;
    }
    let mean = |s: &[f64]| s.iter().sum::<f64>() / s.len() as f64;
    Some((mean(&values[..quarter]), mean(&values[values.len() - quarter..])))
}

/// Print model summary
pub fn print_model_summary<T: Tensor>(model: &LogisticRegression<T>) {
    println!("Model Summary:\n{}", model);
}

/// Print a small table for a most-recent-first cost history.
pub fn print_summary_table(cost_history: &[f64], title: &str) {
    let chronological: Vec<f64> = cost_history.iter().rev().copied().collect();
    println!("\n{} Summary Table:", title);
    println!("+----------------+------------+");
    println!("| Epoch Range    | Avg Cost   |");
    println!("+----------------+------------+");
    if let Some((first, last)) = quarter_means(&chronological) {
        println!("| First quarter  | {:>10.6} |", first);
        println!("| Last quarter   | {:>10.6} |", last);
    }
    if !chronological.is_empty() {
        let avg = chronological.iter().sum::<f64>() / chronological.len() as f64;
        println!("| All Epochs     | {:>10.6} |", avg);
    }
    println!("+----------------+------------+");
}
