//! Dropout layer implementation for regularization
//!
//! This module provides a DropoutLayer that randomly drops (sets to zero) a fraction
//! of input units during training to prevent overfitting. In deterministic mode
//! (inference) all units are kept and outputs are passed through unchanged.

use super::{Layer, PassContext};
use crate::tensor::Shape;

/// Dropout layer for regularization.
///
/// During training, randomly sets a fraction of input units to zero with probability
/// `drop_rate`, and scales the remaining units by 1/(1-drop_rate) to maintain expected
/// values. When the pass is deterministic, passes inputs through unchanged.
///
/// The layer itself is stateless: the random source comes from the
/// [`PassContext`] and the mask of the last forward pass lives in the
/// workspace's auxiliary slot (empty after a deterministic pass).
///
/// # Example
///
/// ```ignore
/// use layer_stack_nets::layers::DropoutLayer;
///
/// let layer = DropoutLayer::new(0.5);
/// assert_eq!(layer.weight_size(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct DropoutLayer {
    drop_rate: f64,
}

impl DropoutLayer {
    /// Creates a new dropout layer with the given drop rate.
    ///
    /// # Panics
    ///
    /// Panics if `drop_rate` is outside [0.0, 1.0).
    pub fn new(drop_rate: f64) -> Self {
        assert!(
            (0.0..1.0).contains(&drop_rate),
            "drop_rate must be in range [0.0, 1.0)"
        );
        Self { drop_rate }
    }

    /// Get the dropout rate.
    pub fn drop_rate(&self) -> f64 {
        self.drop_rate
    }
}

impl Layer for DropoutLayer {
    fn name(&self) -> &'static str {
        "dropout"
    }

    fn output_shape(&self, input: Shape) -> Result<Shape, String> {
        Ok(input)
    }

    /// Forward propagation through the dropout layer.
    ///
    /// In training mode, draws a keep/drop decision per unit from `ctx.rng`,
    /// stores the mask in `aux` and scales kept units. In deterministic mode,
    /// copies the input and clears `aux`.
    fn forward(
        &self,
        input: &[f64],
        _shape: Shape,
        output: &mut [f64],
        aux: &mut Vec<f64>,
        ctx: &mut PassContext<'_>,
    ) {
        assert_eq!(
            input.len(),
            output.len(),
            "output len mismatch: expected {}, got {}",
            input.len(),
            output.len()
        );

        aux.clear();
        if ctx.deterministic {
            output.copy_from_slice(input);
            return;
        }

        let scale = 1.0 / (1.0 - self.drop_rate);
        aux.resize(input.len(), 0.0);
        for ((out, &x), mask) in output.iter_mut().zip(input).zip(aux.iter_mut()) {
            if ctx.rng.next_f64() >= self.drop_rate {
                // Keep this unit, scale to maintain expected value
                *mask = 1.0;
                *out = x * scale;
            } else {
                *mask = 0.0;
                *out = 0.0;
            }
        }
    }

    /// Backward propagation through the dropout layer.
    ///
    /// Applies the saved mask to the gradient; after a deterministic pass the
    /// gradient passes through unchanged.
    fn backward(
        &self,
        _input: &[f64],
        _output: &[f64],
        _shape: Shape,
        upstream: &[f64],
        delta: &mut [f64],
        aux: &[f64],
    ) {
        if aux.is_empty() {
            delta.copy_from_slice(upstream);
            return;
        }

        let scale = 1.0 / (1.0 - self.drop_rate);
        for ((d, &g), &mask) in delta.iter_mut().zip(upstream).zip(aux) {
            *d = g * mask * scale;
        }
    }
}
