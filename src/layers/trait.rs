//! Layer trait definition for neural network layers
//!
//! This module defines the capability trait every layer kind implements. The
//! trait provides forward propagation, backward propagation and weight-gradient
//! computation over flat `f64` buffers, plus access to the layer's learnable
//! weights so a [`LayerStack`](crate::stack::LayerStack) can flatten them into a
//! single parameter vector.
//!
//! Layers hold no per-call state. Activations, deltas and any auxiliary data
//! (dropout masks, pooling arg-max indices) live in the caller's
//! [`Workspace`](crate::stack::Workspace); the inference/training mode travels
//! in a [`PassContext`].

use crate::tensor::Shape;
use crate::utils::SimpleRng;

/// Per-call state threaded through a forward pass.
///
/// `deterministic` is `true` for inference: layers with training-only
/// stochastic behavior (dropout) must then act as the identity.
pub struct PassContext<'r> {
    pub deterministic: bool,
    pub rng: &'r mut SimpleRng,
}

impl<'r> PassContext<'r> {
    pub fn new(deterministic: bool, rng: &'r mut SimpleRng) -> Self {
        Self { deterministic, rng }
    }
}

/// Core trait for neural network layers.
///
/// # Example
///
/// ```ignore
/// // Forward pass through a layer
/// let out_shape = layer.output_shape(in_shape)?;
/// let mut output = vec![0.0; out_shape.len()];
/// layer.forward(&input, in_shape, &mut output, &mut aux, &mut ctx);
///
/// // Backward pass: gradient with respect to the layer input
/// layer.backward(&input, &output, in_shape, &upstream, &mut delta, &aux);
///
/// // Weight gradient, accumulated into this layer's range
/// layer.gradient(&input, in_shape, &upstream, &mut gradient[range]);
/// ```
pub trait Layer {
    /// Short name used in error messages and logs.
    fn name(&self) -> &'static str;

    /// Shape produced for an input of shape `input`.
    ///
    /// Returns an error message when the layer cannot accept `input`; the
    /// stack turns it into [`NetworkError::LayerShapeMismatch`](crate::error::NetworkError).
    fn output_shape(&self, input: Shape) -> std::result::Result<Shape, String>;

    /// Number of learnable weights.
    fn weight_size(&self) -> usize {
        0
    }

    /// Learnable weights in their canonical flattened order.
    fn weights(&self) -> &[f64] {
        &[]
    }

    /// Mutable access to the learnable weights.
    fn weights_mut(&mut self) -> &mut [f64] {
        &mut []
    }

    /// Forward propagation.
    ///
    /// # Arguments
    ///
    /// * `input` - Input activation of shape `shape`
    /// * `shape` - Input shape
    /// * `output` - Output buffer, sized `output_shape(shape).len()`
    /// * `aux` - The layer's auxiliary scratch slot, kept for `backward`
    /// * `ctx` - Mode flag and randomness for this call
    fn forward(
        &self,
        input: &[f64],
        shape: Shape,
        output: &mut [f64],
        aux: &mut Vec<f64>,
        ctx: &mut PassContext<'_>,
    );

    /// Backward propagation.
    ///
    /// Writes into `delta` the gradient of the loss with respect to this
    /// layer's input, given `upstream`, the gradient with respect to its
    /// output. `input`, `output` and `aux` are the values stored by the
    /// matching forward pass.
    fn backward(
        &self,
        input: &[f64],
        output: &[f64],
        shape: Shape,
        upstream: &[f64],
        delta: &mut [f64],
        aux: &[f64],
    );

    /// Accumulate the gradient with respect to the weights into `gradient`.
    ///
    /// `gradient` is this layer's range of the flattened gradient vector and
    /// has length `weight_size()`. Layers without weights keep the default.
    fn gradient(&self, _input: &[f64], _shape: Shape, _upstream: &[f64], _gradient: &mut [f64]) {}
}

