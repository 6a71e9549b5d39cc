//! Optimizer abstractions for neural network training
//!
//! This module separates three roles:
//!
//! - [`ObjectiveFunction`]: anything that can evaluate a loss and its gradient
//!   for one example at a time. A [`Network`](crate::network::Network)
//!   implements it over its bound batch.
//! - [`Optimizer`]: drives an objective function to update a flattened
//!   parameter vector and returns the final objective.
//! - [`UpdateRule`]: the per-step arithmetic that turns a gradient into a
//!   parameter update (SGD, Adam, RMSProp).
//!
//! [`StochasticOptimizer`] ties the last two together: it visits examples one
//! at a time and applies an update rule after each.
//!
//! # Example
//!
//! ```ignore
//! use layer_stack_nets::optimizers::{Optimizer, RMSProp, StochasticOptimizer};
//!
//! let mut optimizer = StochasticOptimizer::new(RMSProp::new(0.01, 0.88, 1e-8), 1000, 1e-8, true);
//! let objective = optimizer.optimize(&mut network, &mut parameters)?;
//! ```

pub mod adam;
pub mod rmsprop;
pub mod sgd;
pub mod stochastic;

pub use adam::Adam;
pub use rmsprop::RMSProp;
pub use sgd::SGD;
pub use stochastic::StochasticOptimizer;

use crate::error::Result;

/// A loss decomposed into per-example terms.
///
/// `evaluate` must be called for an index before `gradient` is asked for the
/// same index; the gradient reuses the forward state of that evaluation.
pub trait ObjectiveFunction {
    /// Number of separable terms (training examples).
    fn num_functions(&self) -> usize;

    /// Loss of example `index` at `parameters`.
    ///
    /// `deterministic` selects inference behavior for stochastic layers.
    fn evaluate(&mut self, parameters: &[f64], index: usize, deterministic: bool) -> Result<f64>;

    /// Gradient of the loss of example `index`, written into `gradient`.
    fn gradient(&mut self, parameters: &[f64], index: usize, gradient: &mut [f64]) -> Result<()>;
}

/// Minimizes an [`ObjectiveFunction`] in place.
pub trait Optimizer {
    /// Updates `iterate` and returns the objective at the final iterate.
    fn optimize(&mut self, function: &mut dyn ObjectiveFunction, iterate: &mut [f64]) -> Result<f64>;
}

/// Core trait for parameter update rules.
///
/// All rules (SGD, Adam, RMSProp) implement this trait to provide a uniform
/// interface for turning one gradient into one parameter update.
///
/// # State Management
///
/// Some rules (like Adam) maintain internal state across updates:
/// - Momentum estimates
/// - Adaptive learning rate statistics
/// - Time step counters
///
/// The rule manages this state internally, so callers only need to provide
/// parameters and gradients.
pub trait UpdateRule {
    /// Update parameters using gradients.
    ///
    /// # Panics
    ///
    /// Implementations panic if parameters and gradients have different lengths.
    fn update(&mut self, parameters: &mut [f64], gradients: &[f64]);

    /// Reset rule state.
    ///
    /// Clears any accumulated momentum or adaptive learning rate statistics.
    /// For stateless rules like vanilla SGD, this is a no-op.
    fn reset(&mut self);

    /// Get the base learning rate.
    fn learning_rate(&self) -> f64;

    /// Set the base learning rate.
    fn set_learning_rate(&mut self, lr: f64);
}
