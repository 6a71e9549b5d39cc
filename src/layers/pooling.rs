//! Non-overlapping spatial pooling.

use super::{Layer, PassContext};
use crate::tensor::Shape;

/// Reduction applied inside each pooling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolingKind {
    Mean,
    Max,
}

/// Pools `kernel × kernel` windows with stride `kernel`, independently per slice.
///
/// Trailing rows/columns that do not fill a whole window are dropped. Max
/// pooling records the input index of each window's maximum in `aux` so the
/// backward pass can route the gradient.
#[derive(Debug, Clone)]
pub struct PoolingLayer {
    kernel: usize,
    kind: PoolingKind,
}

impl PoolingLayer {
    /// # Panics
    ///
    /// Panics if `kernel` is zero.
    pub fn new(kernel: usize, kind: PoolingKind) -> Self {
        assert!(kernel > 0, "kernel must be greater than 0");
        Self { kernel, kind }
    }

    pub fn mean(kernel: usize) -> Self {
        Self::new(kernel, PoolingKind::Mean)
    }

    pub fn max(kernel: usize) -> Self {
        Self::new(kernel, PoolingKind::Max)
    }

    pub fn kernel(&self) -> usize {
        self.kernel
    }

    pub fn kind(&self) -> PoolingKind {
        self.kind
    }

    /// Input indices covered by output element `(or, oc, s)`.
    fn window(&self, input: Shape, or: usize, oc: usize, s: usize) -> impl Iterator<Item = usize> {
        let k = self.kernel;
        (0..k).flat_map(move |c| (0..k).map(move |r| input.index(or * k + r, oc * k + c, s)))
    }

    /// Index of the window's maximum. A NaN anywhere in the window wins, so it
    /// reaches the output; ties keep the first index in window order.
    fn argmax(&self, input: &[f64], shape: Shape, or: usize, oc: usize, s: usize) -> usize {
        // Windows are never empty: `kernel > 0` and the output shape fits the input.
        self.window(shape, or, oc, s)
            .reduce(|best, i| {
                let takes_over = input[i].is_nan() || input[i] > input[best];
                if !input[best].is_nan() && takes_over {
                    i
                } else {
                    best
                }
            })
            .unwrap_or_default()
    }
}

impl Layer for PoolingLayer {
    fn name(&self) -> &'static str {
        "pooling"
    }

    fn output_shape(&self, input: Shape) -> Result<Shape, String> {
        if input.rows < self.kernel || input.cols < self.kernel {
            return Err(format!(
                "pooling window {} larger than input {}x{}",
                self.kernel, input.rows, input.cols
            ));
        }
        Ok(Shape::new(
            input.rows / self.kernel,
            input.cols / self.kernel,
            input.slices,
        ))
    }

    fn forward(
        &self,
        input: &[f64],
        shape: Shape,
        output: &mut [f64],
        aux: &mut Vec<f64>,
        _ctx: &mut PassContext<'_>,
    ) {
        let out_shape = Shape::new(shape.rows / self.kernel, shape.cols / self.kernel, shape.slices);
        assert_eq!(output.len(), out_shape.len(), "output len mismatch");

        let area = (self.kernel * self.kernel) as f64;
        aux.clear();
        if self.kind == PoolingKind::Max {
            aux.resize(out_shape.len(), 0.0);
        }

        for s in 0..out_shape.slices {
            for oc in 0..out_shape.cols {
                for or in 0..out_shape.rows {
                    let out_index = out_shape.index(or, oc, s);
                    match self.kind {
                        PoolingKind::Mean => {
                            let sum: f64 = self.window(shape, or, oc, s).map(|i| input[i]).sum();
                            output[out_index] = sum / area;
                        }
                        PoolingKind::Max => {
                            let best_index = self.argmax(input, shape, or, oc, s);
                            output[out_index] = input[best_index];
                            aux[out_index] = best_index as f64;
                        }
                    }
                }
            }
        }
    }

    fn backward(
        &self,
        _input: &[f64],
        _output: &[f64],
        shape: Shape,
        upstream: &[f64],
        delta: &mut [f64],
        aux: &[f64],
    ) {
        let out_shape = Shape::new(shape.rows / self.kernel, shape.cols / self.kernel, shape.slices);
        let area = (self.kernel * self.kernel) as f64;
        delta.fill(0.0);

        match self.kind {
            PoolingKind::Mean => {
                for s in 0..out_shape.slices {
                    for oc in 0..out_shape.cols {
                        for or in 0..out_shape.rows {
                            let g = upstream[out_shape.index(or, oc, s)] / area;
                            for i in self.window(shape, or, oc, s) {
                                delta[i] += g;
                            }
                        }
                    }
                }
            }
            PoolingKind::Max => {
                for (&index, &g) in aux.iter().zip(upstream) {
                    delta[index as usize] += g;
                }
            }
        }
    }
}
