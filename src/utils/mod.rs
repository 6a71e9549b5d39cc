//! Shared utilities for neural network implementations
//!
//! This module provides common utilities like random number generation and
//! activation functions used across layers, initialization rules and optimizers.

pub mod activations;
pub mod rng;

pub use rng::SimpleRng;
