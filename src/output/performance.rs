//! Performance (loss) functions used by output layers.

/// Scalar loss between a network output and its target, plus the derivative
/// of that loss with respect to the output.
pub trait PerformanceFunction {
    fn error(&self, output: &[f64], target: &[f64]) -> f64;

    /// Writes `d error / d output` into `gradient`.
    fn gradient(&self, output: &[f64], target: &[f64], gradient: &mut [f64]);
}

/// Mean of squared differences.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanSquaredError;

impl PerformanceFunction for MeanSquaredError {
    fn error(&self, output: &[f64], target: &[f64]) -> f64 {
        if output.is_empty() {
            return 0.0;
        }
        let sum: f64 = output
            .iter()
            .zip(target)
            .map(|(o, t)| (o - t) * (o - t))
            .sum();
        sum / output.len() as f64
    }

    fn gradient(&self, output: &[f64], target: &[f64], gradient: &mut [f64]) {
        let scale = 2.0 / output.len().max(1) as f64;
        for ((g, &o), &t) in gradient.iter_mut().zip(output).zip(target) {
            *g = scale * (o - t);
        }
    }
}

const CROSS_ENTROPY_FLOOR: f64 = 1e-10;

/// Cross-entropy of probability outputs against a target distribution.
///
/// Outputs are clamped to `1e-10` before the logarithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossEntropyError;

impl PerformanceFunction for CrossEntropyError {
    fn error(&self, output: &[f64], target: &[f64]) -> f64 {
        -output
            .iter()
            .zip(target)
            .map(|(&o, &t)| t * o.max(CROSS_ENTROPY_FLOOR).ln())
            .sum::<f64>()
    }

    fn gradient(&self, output: &[f64], target: &[f64], gradient: &mut [f64]) {
        for ((g, &o), &t) in gradient.iter_mut().zip(output).zip(target) {
            *g = -t / o.max(CROSS_ENTROPY_FLOOR);
        }
    }
}
