//! Configuration structures for training
//!
//! This module parses the optimizer settings used to train a network from a
//! JSON file and turns them into a ready-to-use [`Optimizer`].

use serde::Deserialize;
use std::fs;

use crate::error::{NetworkError, Result};
use crate::optimizers::{Adam, Optimizer, RMSProp, StochasticOptimizer, SGD};

const DEFAULT_MAX_ITERATIONS: usize = 100_000;
const DEFAULT_TOLERANCE: f64 = 1e-5;
const DEFAULT_SEED: u64 = 42;

/// Configuration for training: which update rule to use and how long to run.
///
/// Optional fields fall back to defaults:
///
/// - `max_iterations`: 100000 single-example steps (`0` for no limit)
/// - `tolerance`: 1e-5
/// - `shuffle`: true
/// - `seed`: 42
/// - **rmsprop**: `alpha` 0.99, `epsilon` 1e-8
/// - **adam**: `beta1` 0.9, `beta2` 0.999, `epsilon` 1e-8
///
/// # Example
///
/// ```json
/// {
///   "optimizer": "rmsprop",
///   "learning_rate": 0.01,
///   "alpha": 0.88,
///   "epsilon": 1e-8,
///   "max_iterations": 8000,
///   "tolerance": 1e-8,
///   "shuffle": true
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingConfig {
    /// Update rule: "sgd", "adam" or "rmsprop"
    pub optimizer: String,

    /// Base step size of the update rule
    pub learning_rate: f64,

    /// Maximum number of single-example steps
    pub max_iterations: Option<usize>,

    /// Minimum change of the pass objective before stopping
    pub tolerance: Option<f64>,

    /// Whether examples are visited in a shuffled order each pass
    pub shuffle: Option<bool>,

    /// Seed for the visitation order
    pub seed: Option<u64>,

    /// Smoothing constant for RMSProp
    pub alpha: Option<f64>,

    /// First moment decay for Adam
    pub beta1: Option<f64>,

    /// Second moment decay for Adam
    pub beta2: Option<f64>,

    /// Numerical stability term for Adam and RMSProp
    pub epsilon: Option<f64>,
}

/// Loads a training configuration from a JSON file.
///
/// # Examples
///
/// ```no_run
/// use layer_stack_nets::config::load_config;
///
/// let cfg = load_config("config/cnn_rmsprop.json").unwrap();
/// assert_eq!(cfg.optimizer, "rmsprop");
/// ```
pub fn load_config(path: &str) -> Result<TrainingConfig> {
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parses and validates a training configuration from a JSON string.
pub fn parse_config(contents: &str) -> Result<TrainingConfig> {
    let config: TrainingConfig = serde_json::from_str(contents)?;
    validate_config(&config)?;
    Ok(config)
}

fn invalid(message: impl Into<String>) -> NetworkError {
    NetworkError::InvalidConfig(message.into())
}

fn validate_config(config: &TrainingConfig) -> Result<()> {
    let valid_optimizers = ["sgd", "adam", "rmsprop"];
    if !valid_optimizers.contains(&config.optimizer.to_lowercase().as_str()) {
        return Err(invalid(format!(
            "Invalid optimizer '{}'. Must be one of: {}",
            config.optimizer,
            valid_optimizers.join(", ")
        )));
    }

    if !(config.learning_rate >= 0.0) {
        return Err(invalid("learning_rate must be non-negative"));
    }

    if let Some(tolerance) = config.tolerance {
        if !(tolerance >= 0.0) {
            return Err(invalid("tolerance must be non-negative"));
        }
    }

    if let Some(epsilon) = config.epsilon {
        if !(epsilon >= 0.0) {
            return Err(invalid("epsilon must be non-negative"));
        }
    }

    for (name, value) in [
        ("alpha", config.alpha),
        ("beta1", config.beta1),
        ("beta2", config.beta2),
    ] {
        if let Some(value) = value {
            if !(0.0..1.0).contains(&value) {
                return Err(invalid(format!("{} must be in range [0.0, 1.0)", name)));
            }
        }
    }

    Ok(())
}

impl TrainingConfig {
    /// Builds the configured optimizer.
    pub fn build_optimizer(&self) -> Result<Box<dyn Optimizer>> {
        validate_config(self)?;

        let max_iterations = self.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS);
        let tolerance = self.tolerance.unwrap_or(DEFAULT_TOLERANCE);
        let shuffle = self.shuffle.unwrap_or(true);
        let seed = self.seed.unwrap_or(DEFAULT_SEED);
        let epsilon = self.epsilon.unwrap_or(1e-8);

        let optimizer: Box<dyn Optimizer> = match self.optimizer.to_lowercase().as_str() {
            "sgd" => Box::new(
                StochasticOptimizer::new(SGD::new(self.learning_rate), max_iterations, tolerance, shuffle)
                    .with_seed(seed),
            ),
            "adam" => {
                let rule = Adam::new(
                    self.learning_rate,
                    self.beta1.unwrap_or(0.9),
                    self.beta2.unwrap_or(0.999),
                    epsilon,
                );
                Box::new(StochasticOptimizer::new(rule, max_iterations, tolerance, shuffle).with_seed(seed))
            }
            "rmsprop" => {
                let rule = RMSProp::new(self.learning_rate, self.alpha.unwrap_or(0.99), epsilon);
                Box::new(StochasticOptimizer::new(rule, max_iterations, tolerance, shuffle).with_seed(seed))
            }
            other => return Err(invalid(format!("Invalid optimizer '{}'", other))),
        };
        Ok(optimizer)
    }
}
