//! Per-call scratch buffers for a layer stack.

use crate::tensor::Shape;

/// Activations, deltas and auxiliary state for one forward/backward cycle.
///
/// `activations[0]` is a copy of the input and `activations[i + 1]` the output
/// of layer `i`; `deltas[i]` is the gradient of the loss with respect to the
/// input of layer `i`. Buffers are sized once from the stack's shapes and
/// overwritten on every call.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub(crate) activations: Vec<Vec<f64>>,
    pub(crate) deltas: Vec<Vec<f64>>,
    pub(crate) aux: Vec<Vec<f64>>,
}

impl Workspace {
    /// Allocates buffers for a stack whose layer `i` consumes `shapes[i]` and
    /// whose final output has shape `shapes[shapes.len() - 1]`.
    pub(crate) fn for_shapes(shapes: &[Shape]) -> Self {
        let layers = shapes.len().saturating_sub(1);
        Self {
            activations: shapes.iter().map(|s| vec![0.0; s.len()]).collect(),
            deltas: shapes[..layers].iter().map(|s| vec![0.0; s.len()]).collect(),
            aux: vec![Vec::new(); layers],
        }
    }

    /// Zero every buffer so nothing from a previous example leaks into the next.
    pub fn reset(&mut self) {
        for buffer in self.activations.iter_mut().chain(self.deltas.iter_mut()) {
            buffer.fill(0.0);
        }
        for aux in &mut self.aux {
            aux.clear();
        }
    }

    /// Output of the last layer.
    pub fn output(&self) -> &[f64] {
        self.activations.last().map_or(&[], Vec::as_slice)
    }

    /// Output of layer `index`.
    pub fn activation(&self, index: usize) -> &[f64] {
        &self.activations[index + 1]
    }

    /// Gradient with respect to the input of layer `index`.
    pub fn delta(&self, index: usize) -> &[f64] {
        &self.deltas[index]
    }
}
