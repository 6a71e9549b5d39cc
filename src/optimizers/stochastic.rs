//! Single-example iteration driver.

use log::{debug, warn};

use crate::error::{NetworkError, Result};
use crate::optimizers::{ObjectiveFunction, Optimizer, UpdateRule};
use crate::utils::SimpleRng;

/// Visits one example per step and applies an [`UpdateRule`] after each.
///
/// A pass is one visit of every example. The driver stops when
/// `max_iterations` steps have been taken (`0` means no limit), when the
/// summed objective of a pass changes by less than `tolerance` from the
/// previous pass, or when a pass objective is not finite. It then returns the
/// deterministic objective summed over all examples at the final iterate.
#[derive(Debug, Clone)]
pub struct StochasticOptimizer<U> {
    rule: U,
    max_iterations: usize,
    tolerance: f64,
    shuffle: bool,
    reset_rule: bool,
    rng: SimpleRng,
}

impl<U: UpdateRule> StochasticOptimizer<U> {
    pub fn new(rule: U, max_iterations: usize, tolerance: f64, shuffle: bool) -> Self {
        Self {
            rule,
            max_iterations,
            tolerance,
            shuffle,
            reset_rule: true,
            rng: SimpleRng::new(42),
        }
    }

    /// Seed for the per-pass visitation order.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SimpleRng::new(seed);
        self
    }

    /// Whether the rule's accumulated state is cleared at the start of every
    /// `optimize` call (default `true`).
    pub fn with_reset_rule(mut self, reset_rule: bool) -> Self {
        self.reset_rule = reset_rule;
        self
    }

    pub fn rule(&self) -> &U {
        &self.rule
    }

    pub fn rule_mut(&mut self) -> &mut U {
        &mut self.rule
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.max_iterations = max_iterations;
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }
}

impl<U: UpdateRule> Optimizer for StochasticOptimizer<U> {
    fn optimize(&mut self, function: &mut dyn ObjectiveFunction, iterate: &mut [f64]) -> Result<f64> {
        let count = function.num_functions();
        if count == 0 {
            return Err(NetworkError::NoTrainingData);
        }
        if self.reset_rule {
            self.rule.reset();
        }

        let mut order: Vec<usize> = (0..count).collect();
        if self.shuffle {
            self.rng.shuffle_usize(&mut order);
        }
        let mut gradient = vec![0.0; iterate.len()];

        let mut last_objective = f64::INFINITY;
        let mut pass_objective = 0.0;
        let mut position = 0;
        let mut pass = 0;
        let mut step = 0;

        while self.max_iterations == 0 || step < self.max_iterations {
            let index = order[position];
            pass_objective += function.evaluate(iterate, index, false)?;
            function.gradient(iterate, index, &mut gradient)?;
            self.rule.update(iterate, &gradient);

            step += 1;
            position += 1;
            if position < count {
                continue;
            }

            pass += 1;
            debug!("pass {}: objective {:.6}", pass, pass_objective);
            if !pass_objective.is_finite() {
                warn!("objective became {} after pass {}; stopping", pass_objective, pass);
                break;
            }
            if (last_objective - pass_objective).abs() < self.tolerance {
                debug!("objective converged after {} passes", pass);
                break;
            }

            last_objective = pass_objective;
            pass_objective = 0.0;
            position = 0;
            if self.shuffle {
                self.rng.shuffle_usize(&mut order);
            }
        }

        let mut objective = 0.0;
        for index in 0..count {
            objective += function.evaluate(iterate, index, true)?;
        }
        Ok(objective)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizers::SGD;
    use approx::assert_relative_eq;

    /// f(x) = sum_i (x - c_i)^2 over a single scalar parameter.
    struct Quadratic {
        centers: Vec<f64>,
        evaluated: Vec<usize>,
    }

    impl ObjectiveFunction for Quadratic {
        fn num_functions(&self) -> usize {
            self.centers.len()
        }

        fn evaluate(&mut self, parameters: &[f64], index: usize, _deterministic: bool) -> Result<f64> {
            self.evaluated.push(index);
            let d = parameters[0] - self.centers[index];
            Ok(d * d)
        }

        fn gradient(&mut self, parameters: &[f64], index: usize, gradient: &mut [f64]) -> Result<()> {
            gradient[0] = 2.0 * (parameters[0] - self.centers[index]);
            Ok(())
        }
    }

    #[test]
    fn test_converges_to_mean() {
        let mut function = Quadratic {
            centers: vec![1.0, 3.0],
            evaluated: Vec::new(),
        };
        let mut optimizer = StochasticOptimizer::new(SGD::new(0.05), 10_000, 1e-12, false);
        let mut iterate = vec![10.0];
        let objective = optimizer.optimize(&mut function, &mut iterate).unwrap();

        assert_relative_eq!(iterate[0], 2.0, epsilon = 0.1);
        assert!(objective < 2.1);
    }

    #[test]
    fn test_max_iterations_counts_single_steps() {
        let mut function = Quadratic {
            centers: vec![0.0, 1.0, 2.0],
            evaluated: Vec::new(),
        };
        let mut optimizer = StochasticOptimizer::new(SGD::new(0.01), 4, 0.0, false);
        let mut iterate = vec![5.0];
        optimizer.optimize(&mut function, &mut iterate).unwrap();

        // Four training steps in order, then one deterministic sweep.
        assert_eq!(function.evaluated, vec![0, 1, 2, 0, 0, 1, 2]);
    }

    #[test]
    fn test_empty_objective_is_an_error() {
        let mut function = Quadratic {
            centers: Vec::new(),
            evaluated: Vec::new(),
        };
        let mut optimizer = StochasticOptimizer::new(SGD::new(0.01), 10, 0.0, false);
        let result = optimizer.optimize(&mut function, &mut [0.0]);
        assert!(matches!(result, Err(NetworkError::NoTrainingData)));
    }
}
