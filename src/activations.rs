use crate::tensor::Tensor;
use std::fmt;

/// Trait for link functions mapping a linear score to an output.
pub trait Activation: fmt::Debug + Send + Sync {
    fn apply(&self, x: f64) -> f64;

    /// Apply elementwise to every cell of a tensor.
    fn apply_tensor<T: Tensor>(&self, x: &T) -> T
    where
        Self: Sized,
    {
        x.map(|v| self.apply(v))
    }
}

/// Sigmoid: 1 / (1 + exp(-x))
#[derive(Debug, Clone, Copy, Default)]
pub struct Sigmoid;

impl Activation for Sigmoid {
    fn apply(&self, x: f64) -> f64 {
        // Split form keeps exp() from overflowing for large |x|.
        if x >= 0.0 {
            1.0 / (1.0 + (-x).exp())
        } else {
            let e = x.exp();
            e / (1.0 + e)
        }
    }
}
