//! 2D Convolutional layer implementation
//!
//! This module provides a ConvolutionLayer that slides learnable filters over
//! a multi-map input volume, with optional zero-padding and stride.

use super::{Layer, PassContext};
use crate::tensor::Shape;
use crate::utils::SimpleRng;

/// 2D convolution (cross-correlation) with learnable filters.
///
/// The input volume has one slice per input map; the output has one slice per
/// filter. Output spatial size is
/// `(rows + 2*padding - kernel_rows) / stride + 1` (likewise for columns).
///
/// Weights are laid out `[out_map][in_map][kernel_col][kernel_row]`, matching
/// the column-major storage of the activations. There is no bias term; follow
/// the convolution with [`BiasLayer::per_map`](super::BiasLayer::per_map).
///
/// # Example
///
/// ```ignore
/// use layer_stack_nets::layers::ConvolutionLayer;
/// use layer_stack_nets::utils::SimpleRng;
///
/// let mut rng = SimpleRng::new(42);
/// // 1 input map, 8 filters of 5x5, stride 1, no padding
/// let layer = ConvolutionLayer::new(1, 8, 5, 5, &mut rng);
/// assert_eq!(layer.weight_size(), 200);
/// ```
#[derive(Debug, Clone)]
pub struct ConvolutionLayer {
    in_maps: usize,
    out_maps: usize,
    kernel_rows: usize,
    kernel_cols: usize,
    stride: usize,
    padding: usize,
    weights: Vec<f64>,
}

impl ConvolutionLayer {
    /// Create a ConvolutionLayer with stride 1 and no padding.
    ///
    /// Weights are initialized using Xavier/Glorot initialization adapted for
    /// convolutions: fan_in = in_maps × kernel area, fan_out = out_maps × kernel area.
    pub fn new(
        in_maps: usize,
        out_maps: usize,
        kernel_rows: usize,
        kernel_cols: usize,
        rng: &mut SimpleRng,
    ) -> Self {
        let area = kernel_rows * kernel_cols;
        let fan_in = (in_maps * area) as f64;
        let fan_out = (out_maps * area) as f64;
        let limit = (6.0 / (fan_in + fan_out)).sqrt();

        let weights = (0..out_maps * in_maps * area)
            .map(|_| rng.gen_range_f64(-limit, limit))
            .collect();

        Self {
            in_maps,
            out_maps,
            kernel_rows,
            kernel_cols,
            stride: 1,
            padding: 0,
            weights,
        }
    }

    /// Set the stride.
    ///
    /// # Panics
    ///
    /// Panics if `stride` is zero.
    pub fn with_stride(mut self, stride: usize) -> Self {
        assert!(stride > 0, "stride must be greater than 0");
        self.stride = stride;
        self
    }

    /// Set the symmetric zero-padding.
    pub fn with_padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    pub fn in_maps(&self) -> usize {
        self.in_maps
    }

    pub fn out_maps(&self) -> usize {
        self.out_maps
    }

    pub fn kernel_size(&self) -> (usize, usize) {
        (self.kernel_rows, self.kernel_cols)
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    fn weight_index(&self, out_map: usize, in_map: usize, kr: usize, kc: usize) -> usize {
        ((out_map * self.in_maps + in_map) * self.kernel_cols + kc) * self.kernel_rows + kr
    }

    /// Calls `tap(output_index, weight_index, input_index)` for every
    /// filter tap that lands inside the (unpadded) input.
    fn for_each_tap(&self, input: Shape, mut tap: impl FnMut(usize, usize, usize)) {
        let output = match self.output_shape(input) {
            Ok(shape) => shape,
            Err(_) => return,
        };
        let pad = self.padding as isize;

        for o in 0..self.out_maps {
            for oc in 0..output.cols {
                for or in 0..output.rows {
                    let out_index = output.index(or, oc, o);
                    for m in 0..self.in_maps {
                        for kc in 0..self.kernel_cols {
                            let ic = (oc * self.stride + kc) as isize - pad;
                            if ic < 0 || ic >= input.cols as isize {
                                continue;
                            }
                            for kr in 0..self.kernel_rows {
                                let ir = (or * self.stride + kr) as isize - pad;
                                if ir < 0 || ir >= input.rows as isize {
                                    continue;
                                }
                                let in_index = input.index(ir as usize, ic as usize, m);
                                tap(out_index, self.weight_index(o, m, kr, kc), in_index);
                            }
                        }
                    }
                }
            }
        }
    }
}

impl Layer for ConvolutionLayer {
    fn name(&self) -> &'static str {
        "convolution"
    }

    fn output_shape(&self, input: Shape) -> Result<Shape, String> {
        if input.slices != self.in_maps {
            return Err(format!(
                "expected {} input maps, got {}",
                self.in_maps, input.slices
            ));
        }
        let padded_rows = input.rows + 2 * self.padding;
        let padded_cols = input.cols + 2 * self.padding;
        if padded_rows < self.kernel_rows || padded_cols < self.kernel_cols {
            return Err(format!(
                "kernel {}x{} larger than padded input {}x{}",
                self.kernel_rows, self.kernel_cols, padded_rows, padded_cols
            ));
        }
        Ok(Shape::new(
            (padded_rows - self.kernel_rows) / self.stride + 1,
            (padded_cols - self.kernel_cols) / self.stride + 1,
            self.out_maps,
        ))
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
        shape: Shape,
        output: &mut [f64],
        _aux: &mut Vec<f64>,
        _ctx: &mut PassContext<'_>,
    ) {
        assert_eq!(input.len(), shape.len(), "input len mismatch");
        output.fill(0.0);
        self.for_each_tap(shape, |out_index, weight_index, in_index| {
            output[out_index] += self.weights[weight_index] * input[in_index];
        });
    }

    fn backward(
        &self,
        _input: &[f64],
        _output: &[f64],
        shape: Shape,
        upstream: &[f64],
        delta: &mut [f64],
        _aux: &[f64],
    ) {
        assert_eq!(delta.len(), shape.len(), "delta len mismatch");
        delta.fill(0.0);
        self.for_each_tap(shape, |out_index, weight_index, in_index| {
            delta[in_index] += self.weights[weight_index] * upstream[out_index];
        });
    }

    fn gradient(&self, input: &[f64], shape: Shape, upstream: &[f64], gradient: &mut [f64]) {
        assert_eq!(gradient.len(), self.weights.len(), "gradient len mismatch");
        self.for_each_tap(shape, |out_index, weight_index, in_index| {
            gradient[weight_index] += upstream[out_index] * input[in_index];
        });
    }
}
