//! Initialization rules for the flattened parameter vector.
//!
//! A network hands its rule a vector already holding the layers' own initial
//! weights (gathered in stack order). The rule may overwrite it or keep it.

use crate::utils::SimpleRng;

/// Strategy that fills the parameter vector once, at network construction.
pub trait InitializationRule {
    /// Fills `parameters`, a `rows x cols` block laid out column-major.
    fn initialize(&mut self, parameters: &mut Vec<f64>, rows: usize, cols: usize);
}

/// Uniform random values in `[lower, upper)`.
#[derive(Debug, Clone)]
pub struct RandomInitialization {
    lower: f64,
    upper: f64,
    rng: SimpleRng,
}

impl RandomInitialization {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self::with_seed(lower, upper, 42)
    }

    pub fn with_seed(lower: f64, upper: f64, seed: u64) -> Self {
        Self {
            lower,
            upper,
            rng: SimpleRng::new(seed),
        }
    }
}

impl Default for RandomInitialization {
    fn default() -> Self {
        Self::new(-1.0, 1.0)
    }
}

impl InitializationRule for RandomInitialization {
    fn initialize(&mut self, parameters: &mut Vec<f64>, rows: usize, cols: usize) {
        parameters.clear();
        parameters.extend((0..rows * cols).map(|_| self.rng.gen_range_f64(self.lower, self.upper)));
    }
}

/// All zeros.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroInitialization;

impl InitializationRule for ZeroInitialization {
    fn initialize(&mut self, parameters: &mut Vec<f64>, rows: usize, cols: usize) {
        parameters.clear();
        parameters.resize(rows * cols, 0.0);
    }
}

/// Keeps whatever weights the layers were constructed with.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayerInitialization;

impl InitializationRule for LayerInitialization {
    fn initialize(&mut self, _parameters: &mut Vec<f64>, _rows: usize, _cols: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_initialization_respects_bounds() {
        let mut rule = RandomInitialization::new(-0.5, 0.5);
        let mut parameters = vec![0.0; 100];
        rule.initialize(&mut parameters, 100, 1);
        assert_eq!(parameters.len(), 100);
        assert!(parameters.iter().all(|&p| (-0.5..0.5).contains(&p)));
    }

    #[test]
    fn test_random_initialization_is_seedable() {
        let mut a = vec![0.0; 10];
        let mut b = vec![0.0; 10];
        RandomInitialization::with_seed(-1.0, 1.0, 7).initialize(&mut a, 10, 1);
        RandomInitialization::with_seed(-1.0, 1.0, 7).initialize(&mut b, 10, 1);
        assert_eq!(a, b);
    }

    #[test]
    fn test_layer_initialization_keeps_values() {
        let mut parameters = vec![0.25, -0.5];
        LayerInitialization.initialize(&mut parameters, 2, 1);
        assert_eq!(parameters, vec![0.25, -0.5]);
    }
}
