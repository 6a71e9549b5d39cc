//! Linear (fully connected, bias-free) layer implementation
//!
//! This module provides a LinearLayer that performs the transformation
//! `output = W × input`. Biases are a separate [`BiasLayer`](super::BiasLayer)
//! so each family owns exactly one kind of learnable weight.

use super::{Layer, PassContext};
use crate::tensor::Shape;
use crate::utils::SimpleRng;

/// Linear mapping with an `output_size × input_size` weight matrix.
///
/// The input is flattened, so a linear layer can follow a convolution or
/// pooling layer directly. Weights are stored row-major: `W[o, i]` lives at
/// `o * input_size + i`.
///
/// # Example
///
/// ```ignore
/// use layer_stack_nets::layers::LinearLayer;
/// use layer_stack_nets::utils::SimpleRng;
///
/// let mut rng = SimpleRng::new(42);
/// let layer = LinearLayer::new(192, 10, &mut rng);
/// assert_eq!(layer.weight_size(), 1920);
/// ```
#[derive(Debug, Clone)]
pub struct LinearLayer {
    input_size: usize,
    output_size: usize,
    weights: Vec<f64>,
}

impl LinearLayer {
    /// Create a new LinearLayer with Xavier initialization.
    ///
    /// Weights are sampled uniformly from [-limit, limit] where
    /// limit = sqrt(6 / (input_size + output_size)).
    ///
    /// # Panics
    ///
    /// Panics if `input_size` is zero.
    pub fn new(input_size: usize, output_size: usize, rng: &mut SimpleRng) -> Self {
        assert!(input_size > 0, "input_size must be greater than 0");
        let limit = (6.0 / (input_size + output_size) as f64).sqrt();
        let weights = (0..input_size * output_size)
            .map(|_| rng.gen_range_f64(-limit, limit))
            .collect();

        Self {
            input_size,
            output_size,
            weights,
        }
    }

    /// Create a LinearLayer with explicit row-major weights.
    ///
    /// # Panics
    ///
    /// Panics if `input_size` is zero or `weights.len() != input_size * output_size`.
    pub fn from_weights(input_size: usize, output_size: usize, weights: Vec<f64>) -> Self {
        assert!(input_size > 0, "input_size must be greater than 0");
        assert_eq!(
            weights.len(),
            input_size * output_size,
            "weights len mismatch: expected {}, got {}",
            input_size * output_size,
            weights.len()
        );
        Self {
            input_size,
            output_size,
            weights,
        }
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }
}

impl Layer for LinearLayer {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn output_shape(&self, input: Shape) -> Result<Shape, String> {
        if input.len() != self.input_size {
            return Err(format!(
                "expected {} input elements, got {}",
                self.input_size,
                input.len()
            ));
        }
        Ok(Shape::vector(self.output_size))
    }

    fn weight_size(&self) -> usize {
        self.weights.len()
    }

    fn weights(&self) -> &[f64] {
        &self.weights
    }

    fn weights_mut(&mut self) -> &mut [f64] {
        &mut self.weights
    }

    fn forward(
        &self,
        input: &[f64],
        _shape: Shape,
        output: &mut [f64],
        _aux: &mut Vec<f64>,
        _ctx: &mut PassContext<'_>,
    ) {
        assert_eq!(input.len(), self.input_size, "input len mismatch");
        assert_eq!(output.len(), self.output_size, "output len mismatch");

        for (row, out) in self.weights.chunks_exact(self.input_size).zip(output.iter_mut()) {
            *out = row.iter().zip(input).map(|(w, x)| w * x).sum();
        }
    }

    fn backward(
        &self,
        _input: &[f64],
        _output: &[f64],
        _shape: Shape,
        upstream: &[f64],
        delta: &mut [f64],
        _aux: &[f64],
    ) {
        assert_eq!(upstream.len(), self.output_size, "upstream len mismatch");
        assert_eq!(delta.len(), self.input_size, "delta len mismatch");

        // delta = W^T × upstream
        delta.fill(0.0);
        for (row, &g) in self.weights.chunks_exact(self.input_size).zip(upstream) {
            for (d, w) in delta.iter_mut().zip(row) {
                *d += w * g;
            }
        }
    }

    fn gradient(&self, input: &[f64], _shape: Shape, upstream: &[f64], gradient: &mut [f64]) {
        assert_eq!(gradient.len(), self.weights.len(), "gradient len mismatch");

        // dW = upstream × input^T
        for (row, &g) in gradient.chunks_exact_mut(self.input_size).zip(upstream) {
            for (dw, x) in row.iter_mut().zip(input) {
                *dw += g * x;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_forward(layer: &LinearLayer, input: &[f64]) -> Vec<f64> {
        let mut rng = SimpleRng::new(1);
        let mut ctx = PassContext::new(true, &mut rng);
        let mut output = vec![0.0; layer.output_size()];
        layer.forward(input, Shape::vector(input.len()), &mut output, &mut Vec::new(), &mut ctx);
        output
    }

    #[test]
    fn test_linear_layer_weight_size() {
        let mut rng = SimpleRng::new(42);
        let layer = LinearLayer::new(784, 512, &mut rng);
        assert_eq!(layer.weight_size(), 784 * 512);
    }

    #[test]
    fn test_xavier_initialization() {
        let mut rng = SimpleRng::new(42);
        let layer = LinearLayer::new(100, 50, &mut rng);
        let limit = (6.0f64 / 150.0).sqrt();

        for &weight in layer.weights() {
            assert!(
                (-limit..=limit).contains(&weight),
                "Weight {} outside Xavier range [{}, {}]",
                weight,
                -limit,
                limit
            );
        }
    }

    #[test]
    fn test_deterministic_initialization() {
        let layer1 = LinearLayer::new(10, 5, &mut SimpleRng::new(42));
        let layer2 = LinearLayer::new(10, 5, &mut SimpleRng::new(42));
        assert_eq!(layer1.weights(), layer2.weights());
    }

    #[test]
    fn test_forward_matches_matrix_product() {
        // W = [[1, 2], [3, 4], [5, 6]]
        let layer = LinearLayer::from_weights(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let output = run_forward(&layer, &[1.0, -1.0]);
        assert_eq!(output, vec![-1.0, -1.0, -1.0]);
    }

    #[test]
    fn test_backward_is_transpose_product() {
        let layer = LinearLayer::from_weights(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let mut delta = vec![0.0; 2];
        layer.backward(&[0.0; 2], &[0.0; 3], Shape::vector(2), &[1.0, 0.0, 1.0], &mut delta, &[]);
        assert_eq!(delta, vec![6.0, 8.0]);
    }

    #[test]
    fn test_gradient_is_outer_product() {
        let layer = LinearLayer::from_weights(2, 2, vec![0.0; 4]);
        let mut gradient = vec![0.0; 4];
        layer.gradient(&[2.0, 3.0], Shape::vector(2), &[1.0, -1.0], &mut gradient);
        assert_eq!(gradient, vec![2.0, 3.0, -2.0, -3.0]);
    }

    #[test]
    fn test_output_shape_rejects_wrong_size() {
        let layer = LinearLayer::from_weights(4, 2, vec![0.0; 8]);
        assert_eq!(layer.output_shape(Shape::new(2, 2, 1)), Ok(Shape::vector(2)));
        assert!(layer.output_shape(Shape::vector(3)).is_err());
    }
}
