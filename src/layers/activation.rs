//! Element-wise activation layer (no learnable weights).

use super::{Layer, PassContext};
use crate::tensor::Shape;
use crate::utils::activations::{
    relu, relu_derivative, sigmoid, sigmoid_derivative, tanh_derivative,
};

/// Non-linearity applied by an [`ActivationLayer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationFunction {
    Identity,
    Logistic,
    Tanh,
    Relu,
}

impl ActivationFunction {
    /// Parses the names used in architecture files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "identity" => Some(Self::Identity),
            "logistic" | "sigmoid" => Some(Self::Logistic),
            "tanh" => Some(Self::Tanh),
            "relu" => Some(Self::Relu),
            _ => None,
        }
    }

    fn apply(self, x: f64) -> f64 {
        match self {
            Self::Identity => x,
            Self::Logistic => sigmoid(x),
            Self::Tanh => x.tanh(),
            Self::Relu => relu(x),
        }
    }

    /// Derivative given both the input `x` and the output `y`.
    fn derivative(self, x: f64, y: f64) -> f64 {
        match self {
            Self::Identity => 1.0,
            Self::Logistic => sigmoid_derivative(y),
            Self::Tanh => tanh_derivative(y),
            Self::Relu => relu_derivative(x),
        }
    }
}

/// Applies an [`ActivationFunction`] to every element.
#[derive(Debug, Clone)]
pub struct ActivationLayer {
    function: ActivationFunction,
}

impl ActivationLayer {
    pub fn new(function: ActivationFunction) -> Self {
        Self { function }
    }

    pub fn function(&self) -> ActivationFunction {
        self.function
    }
}

impl Layer for ActivationLayer {
    fn name(&self) -> &'static str {
        "activation"
    }

    fn output_shape(&self, input: Shape) -> Result<Shape, String> {
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
        for (out, &x) in output.iter_mut().zip(input) {
            *out = self.function.apply(x);
        }
    }

    fn backward(
        &self,
        input: &[f64],
        output: &[f64],
        _shape: Shape,
        upstream: &[f64],
        delta: &mut [f64],
        _aux: &[f64],
    ) {
        for (((d, &x), &y), &g) in delta.iter_mut().zip(input).zip(output).zip(upstream) {
            *d = g * self.function.derivative(x, y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::SimpleRng;

    #[test]
    fn test_activation_has_no_weights() {
        let layer = ActivationLayer::new(ActivationFunction::Logistic);
        assert_eq!(layer.weight_size(), 0);
        assert!(layer.weights().is_empty());
    }

    #[test]
    fn test_relu_forward_backward() {
        let layer = ActivationLayer::new(ActivationFunction::Relu);
        let input = [-1.0, 2.0];
        let mut output = [0.0; 2];
        let mut rng = SimpleRng::new(1);
        layer.forward(&input, Shape::vector(2), &mut output, &mut Vec::new(), &mut PassContext::new(true, &mut rng));
        assert_eq!(output, [0.0, 2.0]);

        let mut delta = [0.0; 2];
        layer.backward(&input, &output, Shape::vector(2), &[5.0, 5.0], &mut delta, &[]);
        assert_eq!(delta, [0.0, 5.0]);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(ActivationFunction::from_name("Sigmoid"), Some(ActivationFunction::Logistic));
        assert_eq!(ActivationFunction::from_name("tanh"), Some(ActivationFunction::Tanh));
        assert_eq!(ActivationFunction::from_name("swish"), None);
    }
}
