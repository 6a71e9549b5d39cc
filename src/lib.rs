//! Layer-stack neural networks
//!
//! This library trains feed-forward and convolutional networks built from an
//! ordered stack of layers, a single output (loss) layer and one flattened
//! parameter vector that optimizers update through the
//! [`ObjectiveFunction`](optimizers::ObjectiveFunction) contract.
//!
//! # Modules
//!
//! - `tensor`: Shapes and column/slice-per-example batches (`Matrix`, `Cube`)
//! - `layers`: Layer trait and implementations (Linear, Convolution, Pooling, etc.)
//! - `stack`: Layer-stack composition and parameter flattening
//! - `output`: Output layers and performance functions
//! - `init`: Parameter initialization rules
//! - `optimizers`: Objective/optimizer traits, update rules (SGD, Adam, RMSProp)
//! - `network`: The FFN/CNN network container and parameter persistence
//! - `utils`: Shared utilities (RNG, activation functions)
//! - `config`: Training configuration structures
//! - `architecture`: Architecture configuration and stack building
//! - `error`: Error type shared by every module

pub mod architecture;
pub mod config;
pub mod error;
pub mod init;
pub mod layers;
pub mod network;
pub mod optimizers;
pub mod output;
pub mod stack;
pub mod tensor;
pub mod utils;

pub use error::{NetworkError, Result};
pub use network::{Cnn, Ffn, Network, NetworkState, ParameterArchive};
pub use stack::LayerStack;
pub use tensor::{Cube, Matrix, SampleBatch, Shape};
