//! Softmax layer over the whole (flattened) input.

use super::{Layer, PassContext};
use crate::tensor::Shape;
use crate::utils::activations::softmax;

/// Normalizes its input into a probability distribution.
///
/// The backward pass applies the exact softmax Jacobian, so any
/// [`PerformanceFunction`](crate::output::PerformanceFunction) can follow it.
#[derive(Debug, Clone, Default)]
pub struct SoftmaxLayer;

impl SoftmaxLayer {
    pub fn new() -> Self {
        Self
    }
}

impl Layer for SoftmaxLayer {
    fn name(&self) -> &'static str {
        "softmax"
    }

    fn output_shape(&self, input: Shape) -> Result<Shape, String> {
        if input.is_empty() {
            return Err("softmax over an empty input".to_string());
        }
        Ok(input)
    }

    fn forward(
        &self,
        input: &[f64],
        _shape: Shape,
        output: &mut [f64],
        _aux: &mut Vec<f64>,
        _ctx: &mut PassContext<'_>,
    ) {
        softmax(input, output);
    }

    fn backward(
        &self,
        _input: &[f64],
        output: &[f64],
        _shape: Shape,
        upstream: &[f64],
        delta: &mut [f64],
        _aux: &[f64],
    ) {
        // delta = s ⊙ (g - <s, g>)
        let dot: f64 = output.iter().zip(upstream).map(|(s, g)| s * g).sum();
        for ((d, &s), &g) in delta.iter_mut().zip(output).zip(upstream) {
            *d = s * (g - dot);
        }
    }
}
