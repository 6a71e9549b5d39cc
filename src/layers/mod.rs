//! Layer abstractions for neural networks
//!
//! This module provides the [`Layer`] capability trait, one implementation per
//! layer family, and [`LayerKind`], the closed set of variants a
//! [`LayerStack`](crate::stack::LayerStack) is built from. Dispatch over
//! `LayerKind` is a plain `match`, so traversal needs no boxing or vtables.

mod r#trait;
pub mod activation;
pub mod bias;
pub mod convolution;
pub mod dropout;
pub mod linear;
pub mod pooling;
pub mod softmax;

pub use activation::{ActivationFunction, ActivationLayer};
pub use bias::{BiasLayer, BiasMode};
pub use convolution::ConvolutionLayer;
pub use dropout::DropoutLayer;
pub use linear::LinearLayer;
pub use pooling::{PoolingKind, PoolingLayer};
pub use r#trait::{Layer, PassContext};
pub use softmax::SoftmaxLayer;

use crate::tensor::Shape;

/// One layer of a stack, tagged by family.
#[derive(Debug, Clone)]
pub enum LayerKind {
    Linear(LinearLayer),
    Bias(BiasLayer),
    Convolution(ConvolutionLayer),
    Pooling(PoolingLayer),
    Activation(ActivationLayer),
    Softmax(SoftmaxLayer),
    Dropout(DropoutLayer),
}

macro_rules! dispatch {
    ($self:expr, $layer:ident => $body:expr) => {
        match $self {
            LayerKind::Linear($layer) => $body,
            LayerKind::Bias($layer) => $body,
            LayerKind::Convolution($layer) => $body,
            LayerKind::Pooling($layer) => $body,
            LayerKind::Activation($layer) => $body,
            LayerKind::Softmax($layer) => $body,
            LayerKind::Dropout($layer) => $body,
        }
    };
}

impl Layer for LayerKind {
    fn name(&self) -> &'static str {
        dispatch!(self, layer => layer.name())
    }

    fn output_shape(&self, input: Shape) -> Result<Shape, String> {
        dispatch!(self, layer => layer.output_shape(input))
    }

    fn weight_size(&self) -> usize {
        dispatch!(self, layer => layer.weight_size())
    }

    fn weights(&self) -> &[f64] {
        dispatch!(self, layer => layer.weights())
    }

    fn weights_mut(&mut self) -> &mut [f64] {
        dispatch!(self, layer => layer.weights_mut())
    }

    fn forward(
        &self,
        input: &[f64],
        shape: Shape,
        output: &mut [f64],
        aux: &mut Vec<f64>,
        ctx: &mut PassContext<'_>,
    ) {
        dispatch!(self, layer => layer.forward(input, shape, output, aux, ctx))
    }

    fn backward(
        &self,
        input: &[f64],
        output: &[f64],
        shape: Shape,
        upstream: &[f64],
        delta: &mut [f64],
        aux: &[f64],
    ) {
        dispatch!(self, layer => layer.backward(input, output, shape, upstream, delta, aux))
    }

    fn gradient(&self, input: &[f64], shape: Shape, upstream: &[f64], gradient: &mut [f64]) {
        dispatch!(self, layer => layer.gradient(input, shape, upstream, gradient))
    }
}

macro_rules! impl_from_layer {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for LayerKind {
                fn from(layer: $ty) -> Self {
                    LayerKind::$variant(layer)
                }
            }
        )*
    };
}

impl_from_layer!(
    Linear(LinearLayer),
    Bias(BiasLayer),
    Convolution(ConvolutionLayer),
    Pooling(PoolingLayer),
    Activation(ActivationLayer),
    Softmax(SoftmaxLayer),
    Dropout(DropoutLayer),
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::SimpleRng;

    #[test]
    fn test_layer_kind_forwards_capabilities() {
        let mut rng = SimpleRng::new(42);
        let kind: LayerKind = LinearLayer::new(4, 3, &mut rng).into();
        assert_eq!(kind.name(), "linear");
        assert_eq!(kind.weight_size(), 12);
        assert_eq!(kind.output_shape(Shape::vector(4)), Ok(Shape::vector(3)));

        let kind: LayerKind = SoftmaxLayer::new().into();
        assert_eq!(kind.weight_size(), 0);
    }
}
