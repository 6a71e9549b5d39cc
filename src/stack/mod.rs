//! Layer-stack composition.
//!
//! A [`LayerStack`] is a fixed, ordered sequence of [`LayerKind`] values. It
//! threads activations forward and deltas backward through the layers and
//! owns the bookkeeping that maps every layer's weights to a contiguous range
//! of one flattened parameter vector. Offsets are computed once, at
//! construction, and the same ranges serve scatter, gather and gradient
//! flattening.

mod workspace;

pub use workspace::Workspace;

use std::ops::Range;

use log::debug;

use crate::error::{NetworkError, Result};
use crate::layers::{Layer, LayerKind, PassContext};
use crate::tensor::Shape;

/// Ordered, shape-checked collection of layers.
///
/// # Example
///
/// ```ignore
/// use layer_stack_nets::layers::{BiasLayer, LinearLayer, SoftmaxLayer};
/// use layer_stack_nets::stack::LayerStack;
/// use layer_stack_nets::tensor::Shape;
/// use layer_stack_nets::utils::SimpleRng;
///
/// let mut rng = SimpleRng::new(42);
/// let stack = LayerStack::new(
///     Shape::vector(16),
///     vec![
///         LinearLayer::new(16, 2, &mut rng).into(),
///         BiasLayer::per_unit(2).into(),
///         SoftmaxLayer::new().into(),
///     ],
/// )?;
/// assert_eq!(stack.network_size(), 34);
/// ```
#[derive(Debug, Clone)]
pub struct LayerStack {
    layers: Vec<LayerKind>,
    /// `shapes[i]` is the input shape of layer `i`; the last entry is the
    /// stack's output shape.
    shapes: Vec<Shape>,
    ranges: Vec<Range<usize>>,
    network_size: usize,
}

impl LayerStack {
    /// Builds a stack, checking that every layer accepts its predecessor's
    /// output.
    pub fn new(input_shape: Shape, layers: Vec<LayerKind>) -> Result<Self> {
        if layers.is_empty() {
            return Err(NetworkError::EmptyStack);
        }

        let mut shapes = Vec::with_capacity(layers.len() + 1);
        shapes.push(input_shape);
        let mut current = input_shape;
        for (index, layer) in layers.iter().enumerate() {
            current = layer
                .output_shape(current)
                .map_err(|reason| NetworkError::LayerShapeMismatch {
                    layer: index,
                    name: layer.name(),
                    input: current,
                    reason,
                })?;
            shapes.push(current);
        }

        let mut ranges = Vec::with_capacity(layers.len());
        let mut offset = 0;
        for layer in &layers {
            let size = layer.weight_size();
            ranges.push(offset..offset + size);
            offset += size;
        }

        debug!(
            "built layer stack: {} layers, {} -> {}, {} weights",
            layers.len(),
            input_shape,
            current,
            offset
        );

        Ok(Self {
            layers,
            shapes,
            ranges,
            network_size: offset,
        })
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn input_shape(&self) -> Shape {
        self.shapes[0]
    }

    pub fn output_shape(&self) -> Shape {
        self.shapes[self.layers.len()]
    }

    /// Input shape of layer `index`, or the output shape for `index == len()`.
    pub fn shape_at(&self, index: usize) -> Shape {
        self.shapes[index]
    }

    /// Total number of learnable weights across all layers.
    pub fn network_size(&self) -> usize {
        self.network_size
    }

    /// Range of layer `index` inside the flattened parameter vector. Empty for
    /// layers without weights.
    pub fn weight_range(&self, index: usize) -> Range<usize> {
        self.ranges[index].clone()
    }

    pub fn layer(&self, index: usize) -> &LayerKind {
        &self.layers[index]
    }

    pub fn layers(&self) -> &[LayerKind] {
        &self.layers
    }

    /// Mutable access to one layer's weights. The stack's shape cannot change
    /// through it.
    pub fn layer_weights_mut(&mut self, index: usize) -> &mut [f64] {
        self.layers[index].weights_mut()
    }

    /// Scratch buffers sized for this stack.
    pub fn workspace(&self) -> Workspace {
        Workspace::for_shapes(&self.shapes)
    }

    fn check_size(&self, actual: usize) -> Result<()> {
        if actual != self.network_size {
            return Err(NetworkError::ParameterSizeMismatch {
                expected: self.network_size,
                actual,
            });
        }
        Ok(())
    }

    /// Rejects a workspace whose buffers were not sized for this stack.
    fn check_workspace(&self, workspace: &Workspace) -> Result<()> {
        let layers = self.layers.len();
        if workspace.activations.len() != layers + 1
            || workspace.deltas.len() != layers
            || workspace.aux.len() != layers
        {
            return Err(NetworkError::WorkspaceMismatch {
                expected: layers,
                actual: workspace.deltas.len(),
            });
        }
        for (index, shape) in self.shapes.iter().enumerate() {
            let activation = workspace.activations[index].len();
            let delta = workspace.deltas.get(index).map_or(shape.len(), Vec::len);
            if activation != shape.len() || delta != shape.len() {
                return Err(NetworkError::ShapeMismatch {
                    shape: *shape,
                    actual: if activation != shape.len() { activation } else { delta },
                });
            }
        }
        Ok(())
    }

    /// Writes `parameters` into the layers, each layer taking its own range.
    pub fn network_weights(&mut self, parameters: &[f64]) -> Result<()> {
        self.check_size(parameters.len())?;
        for (layer, range) in self.layers.iter_mut().zip(&self.ranges) {
            if range.is_empty() {
                continue;
            }
            layer.weights_mut().copy_from_slice(&parameters[range.clone()]);
        }
        Ok(())
    }

    /// Copies every layer's weights into `parameters`; inverse of
    /// [`network_weights`](Self::network_weights).
    pub fn gather_weights(&self, parameters: &mut [f64]) -> Result<()> {
        self.check_size(parameters.len())?;
        for (layer, range) in self.layers.iter().zip(&self.ranges) {
            if range.is_empty() {
                continue;
            }
            parameters[range.clone()].copy_from_slice(layer.weights());
        }
        Ok(())
    }

    /// Clears per-call state before a new example is forwarded.
    pub fn reset_parameter(&self, workspace: &mut Workspace) {
        workspace.reset();
    }

    /// Forwards one example; the result is `workspace.output()`. The workspace
    /// must come from [`workspace`](Self::workspace) on this stack.
    pub fn forward(
        &self,
        input: &[f64],
        workspace: &mut Workspace,
        ctx: &mut PassContext<'_>,
    ) -> Result<()> {
        let input_shape = self.input_shape();
        if input.len() != input_shape.len() {
            return Err(NetworkError::ShapeMismatch {
                shape: input_shape,
                actual: input.len(),
            });
        }

        self.check_workspace(workspace)?;

        workspace.activations[0].copy_from_slice(input);
        for (index, layer) in self.layers.iter().enumerate() {
            let (done, rest) = workspace.activations.split_at_mut(index + 1);
            layer.forward(
                &done[index],
                self.shapes[index],
                &mut rest[0],
                &mut workspace.aux[index],
                ctx,
            );
        }
        Ok(())
    }

    /// Propagates `error` (gradient of the loss with respect to the stack
    /// output) back through the layers in reverse order, filling every
    /// layer's delta. Requires the activations of a preceding
    /// [`forward`](Self::forward) on the same workspace.
    pub fn backward(&self, error: &[f64], workspace: &mut Workspace) -> Result<()> {
        let output_shape = self.output_shape();
        if error.len() != output_shape.len() {
            return Err(NetworkError::ShapeMismatch {
                shape: output_shape,
                actual: error.len(),
            });
        }

        self.check_workspace(workspace)?;

        let last = self.layers.len() - 1;
        for index in (0..=last).rev() {
            let (before, after) = workspace.deltas.split_at_mut(index + 1);
            let upstream: &[f64] = if index == last { error } else { &after[0] };
            self.layers[index].backward(
                &workspace.activations[index],
                &workspace.activations[index + 1],
                self.shapes[index],
                upstream,
                &mut before[index],
                &workspace.aux[index],
            );
        }
        Ok(())
    }

    /// Flattens the weight gradients of the last forward/backward cycle into
    /// `gradient`. Layer `i` sees the delta of layer `i + 1` (or `error` for
    /// the last layer) as its upstream signal.
    pub fn update_gradients(
        &self,
        error: &[f64],
        workspace: &Workspace,
        gradient: &mut [f64],
    ) -> Result<()> {
        self.check_size(gradient.len())?;
        self.check_workspace(workspace)?;
        let output_shape = self.output_shape();
        if error.len() != output_shape.len() {
            return Err(NetworkError::ShapeMismatch {
                shape: output_shape,
                actual: error.len(),
            });
        }
        gradient.fill(0.0);

        let last = self.layers.len() - 1;
        for (index, (layer, range)) in self.layers.iter().zip(&self.ranges).enumerate() {
            if range.is_empty() {
                continue;
            }
            let upstream: &[f64] = if index == last {
                error
            } else {
                &workspace.deltas[index + 1]
            };
            layer.gradient(
                &workspace.activations[index],
                self.shapes[index],
                upstream,
                &mut gradient[range.clone()],
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{ActivationFunction, ActivationLayer, BiasLayer, LinearLayer};
    use crate::utils::SimpleRng;

    fn small_stack() -> LayerStack {
        let mut rng = SimpleRng::new(3);
        LayerStack::new(
            Shape::vector(3),
            vec![
                LinearLayer::new(3, 2, &mut rng).into(),
                ActivationLayer::new(ActivationFunction::Tanh).into(),
                BiasLayer::per_unit(2).into(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_ranges_are_contiguous() {
        let stack = small_stack();
        assert_eq!(stack.weight_range(0), 0..6);
        assert_eq!(stack.weight_range(1), 6..6);
        assert_eq!(stack.weight_range(2), 6..8);
        assert_eq!(stack.network_size(), 8);
    }

    #[test]
    fn test_empty_stack_rejected() {
        let result = LayerStack::new(Shape::vector(3), Vec::new());
        assert!(matches!(result, Err(NetworkError::EmptyStack)));
    }

    #[test]
    fn test_forward_input_length_checked() {
        let stack = small_stack();
        let mut workspace = stack.workspace();
        let mut rng = SimpleRng::new(1);
        let mut ctx = PassContext::new(true, &mut rng);
        let result = stack.forward(&[1.0, 2.0], &mut workspace, &mut ctx);
        assert!(matches!(result, Err(NetworkError::ShapeMismatch { actual: 2, .. })));
    }

    #[test]
    fn test_foreign_workspace_rejected() {
        let stack = small_stack();
        let mut rng = SimpleRng::new(4);
        let other = LayerStack::new(
            Shape::vector(3),
            vec![
                LinearLayer::new(3, 4, &mut rng).into(),
                ActivationLayer::new(ActivationFunction::Tanh).into(),
                BiasLayer::per_unit(4).into(),
            ],
        )
        .unwrap();
        let deeper = LayerStack::new(
            Shape::vector(3),
            vec![
                LinearLayer::new(3, 2, &mut rng).into(),
                ActivationLayer::new(ActivationFunction::Relu).into(),
                BiasLayer::per_unit(2).into(),
                ActivationLayer::new(ActivationFunction::Tanh).into(),
            ],
        )
        .unwrap();

        let mut ctx = PassContext::new(true, &mut rng);
        let mut same_depth = other.workspace();
        let result = stack.forward(&[1.0, 2.0, 3.0], &mut same_depth, &mut ctx);
        assert!(matches!(result, Err(NetworkError::ShapeMismatch { actual: 4, .. })));

        let mut too_deep = deeper.workspace();
        let result = stack.forward(&[1.0, 2.0, 3.0], &mut too_deep, &mut ctx);
        assert!(matches!(
            result,
            Err(NetworkError::WorkspaceMismatch { expected: 3, actual: 4 })
        ));
        assert!(stack.backward(&[0.0, 0.0], &mut too_deep).is_err());
        let mut gradient = vec![0.0; stack.network_size()];
        assert!(stack.update_gradients(&[0.0, 0.0], &too_deep, &mut gradient).is_err());
    }
}
