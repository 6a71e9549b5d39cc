//! Additive bias layer.

use super::{Layer, PassContext};
use crate::tensor::Shape;

/// How biases are broadcast over the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiasMode {
    /// One bias per input element.
    PerUnit,
    /// One bias per slice (feature map), shared by every element of the slice.
    PerMap,
}

/// Adds a learnable bias to its input. Biases start at zero.
#[derive(Debug, Clone)]
pub struct BiasLayer {
    mode: BiasMode,
    biases: Vec<f64>,
}

impl BiasLayer {
    /// One bias per input element, for use after a linear layer.
    pub fn per_unit(size: usize) -> Self {
        Self {
            mode: BiasMode::PerUnit,
            biases: vec![0.0; size],
        }
    }

    /// One bias per feature map, for use after a convolution.
    pub fn per_map(maps: usize) -> Self {
        Self {
            mode: BiasMode::PerMap,
            biases: vec![0.0; maps],
        }
    }

    pub fn mode(&self) -> BiasMode {
        self.mode
    }

    pub fn biases(&self) -> &[f64] {
        &self.biases
    }
}

impl Layer for BiasLayer {
    fn name(&self) -> &'static str {
        match self.mode {
            BiasMode::PerUnit => "bias",
            BiasMode::PerMap => "bias2d",
        }
    }

    fn output_shape(&self, input: Shape) -> Result<Shape, String> {
        match self.mode {
            BiasMode::PerUnit if input.len() != self.biases.len() => Err(format!(
                "expected {} input elements, got {}",
                self.biases.len(),
                input.len()
            )),
            BiasMode::PerMap if input.slices != self.biases.len() => Err(format!(
                "expected {} feature maps, got {}",
                self.biases.len(),
                input.slices
            )),
            _ => Ok(input),
        }
    }

    fn weight_size(&self) -> usize {
        self.biases.len()
    }

    fn weights(&self) -> &[f64] {
        &self.biases
    }

    fn weights_mut(&mut self) -> &mut [f64] {
        &mut self.biases
    }

    fn forward(
        &self,
        input: &[f64],
        shape: Shape,
        output: &mut [f64],
        _aux: &mut Vec<f64>,
        _ctx: &mut PassContext<'_>,
    ) {
        assert_eq!(input.len(), output.len(), "output len mismatch");

        match self.mode {
            BiasMode::PerUnit => {
                for ((out, x), b) in output.iter_mut().zip(input).zip(&self.biases) {
                    *out = x + b;
                }
            }
            BiasMode::PerMap => {
                let slice_len = shape.slice_len();
                for (s, b) in self.biases.iter().enumerate() {
                    let range = s * slice_len..(s + 1) * slice_len;
                    for (out, x) in output[range.clone()].iter_mut().zip(&input[range]) {
                        *out = x + b;
                    }
                }
            }
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
        delta.copy_from_slice(upstream);
    }

    fn gradient(&self, _input: &[f64], shape: Shape, upstream: &[f64], gradient: &mut [f64]) {
        match self.mode {
            BiasMode::PerUnit => {
                for (g, u) in gradient.iter_mut().zip(upstream) {
                    *g += u;
                }
            }
            BiasMode::PerMap => {
                for (g, map) in gradient.iter_mut().zip(upstream.chunks(shape.slice_len().max(1))) {
                    *g += map.iter().sum::<f64>();
                }
            }
        }
    }
}
