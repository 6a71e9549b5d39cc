//! Activation functions for neural networks
//!
//! Element-wise functions used by the activation layer, plus the numerically
//! stable softmax used by the softmax layer. Derivatives are expressed in terms
//! of the function output where that is cheaper.

/// Sigmoid activation function.
///
/// Returns the sigmoid of the input: 1 / (1 + exp(-x))
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Sigmoid derivative assuming y = sigmoid(x).
///
/// Returns the derivative: y * (1 - y)
pub fn sigmoid_derivative(y: f64) -> f64 {
    y * (1.0 - y)
}

/// Tanh derivative assuming y = tanh(x).
pub fn tanh_derivative(y: f64) -> f64 {
    1.0 - y * y
}

pub fn relu(x: f64) -> f64 {
    x.max(0.0)
}

/// ReLU derivative evaluated at the pre-activation `x`.
pub fn relu_derivative(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Softmax over the whole slice.
///
/// Uses the max-subtraction trick for numerical stability to avoid overflow
/// with large values.
pub fn softmax(input: &[f64], output: &mut [f64]) {
    assert_eq!(input.len(), output.len(), "softmax length mismatch");
    if input.is_empty() {
        return;
    }

    let max_value = input.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut sum = 0.0;
    for (out, &value) in output.iter_mut().zip(input) {
        *out = (value - max_value).exp();
        sum += *out;
    }

    let inv_sum = 1.0 / sum;
    for value in output.iter_mut() {
        *value *= inv_sum;
    }
}
