//! Output layers: the terminal component that turns the stack's final
//! activation and a response column into a scalar loss and the first error
//! signal of the backward pass.

pub mod performance;

pub use performance::{CrossEntropyError, MeanSquaredError, PerformanceFunction};

/// Loss head consumed by a [`Network`](crate::network::Network).
pub trait OutputLayer {
    /// Returns the loss of `activation` against `responses` and writes the
    /// derivative of that loss with respect to `activation` into `error`.
    fn output_error(&self, responses: &[f64], activation: &[f64], error: &mut Vec<f64>) -> f64;

    /// Maps the final activation of one example to its prediction column.
    fn output_prediction(&self, activation: &[f64], prediction: &mut [f64]);
}

fn seed_error<P: PerformanceFunction>(
    performance: &P,
    responses: &[f64],
    activation: &[f64],
    error: &mut Vec<f64>,
) -> f64 {
    error.clear();
    error.resize(activation.len(), 0.0);
    performance.gradient(activation, responses, error);
    performance.error(activation, responses)
}

/// Predicts the raw activation.
#[derive(Debug, Clone, Default)]
pub struct RegressionLayer<P = MeanSquaredError> {
    performance: P,
}

impl<P: PerformanceFunction> RegressionLayer<P> {
    pub fn new(performance: P) -> Self {
        Self { performance }
    }
}

impl<P: PerformanceFunction> OutputLayer for RegressionLayer<P> {
    fn output_error(&self, responses: &[f64], activation: &[f64], error: &mut Vec<f64>) -> f64 {
        seed_error(&self.performance, responses, activation, error)
    }

    fn output_prediction(&self, activation: &[f64], prediction: &mut [f64]) {
        prediction.copy_from_slice(activation);
    }
}

/// Classification head: predicts a one-hot column marking the largest
/// activation (the first one on ties).
#[derive(Debug, Clone, Default)]
pub struct OneHotLayer<P = MeanSquaredError> {
    performance: P,
}

impl<P: PerformanceFunction> OneHotLayer<P> {
    pub fn new(performance: P) -> Self {
        Self { performance }
    }
}

impl<P: PerformanceFunction> OutputLayer for OneHotLayer<P> {
    fn output_error(&self, responses: &[f64], activation: &[f64], error: &mut Vec<f64>) -> f64 {
        seed_error(&self.performance, responses, activation, error)
    }

    fn output_prediction(&self, activation: &[f64], prediction: &mut [f64]) {
        prediction.fill(0.0);
        let mut best = 0;
        for (index, &value) in activation.iter().enumerate() {
            if value > activation[best] {
                best = index;
            }
        }
        if let Some(slot) = prediction.get_mut(best) {
            *slot = 1.0;
        }
    }
}
