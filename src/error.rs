//! Error types for network construction, training and persistence.

use crate::tensor::Shape;
use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Errors reported by the layer stack, the network containers and the
/// configuration loaders.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("layer stack must contain at least one layer")]
    EmptyStack,

    #[error("layer {layer} ({name}) cannot accept input of shape {input}: {reason}")]
    LayerShapeMismatch {
        layer: usize,
        name: &'static str,
        input: Shape,
        reason: String,
    },

    #[error("parameter vector has length {actual}, network expects {expected}")]
    ParameterSizeMismatch { expected: usize, actual: usize },

    #[error("predictors hold {predictors} examples but responses hold {responses}")]
    ExampleCountMismatch { predictors: usize, responses: usize },

    #[error("example shape {actual} does not match network input shape {expected}")]
    InputShapeMismatch { expected: Shape, actual: Shape },

    #[error("responses have {actual} rows, network output has {expected} elements")]
    ResponseShapeMismatch { expected: usize, actual: usize },

    #[error("data of length {actual} does not fit shape {shape}")]
    ShapeMismatch { shape: Shape, actual: usize },

    #[error("workspace holds buffers for {actual} layers, stack has {expected}")]
    WorkspaceMismatch { expected: usize, actual: usize },

    #[error("example index {index} out of range for {count} examples")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("gradient requested for example {index} without a preceding evaluate of it")]
    GradientBeforeEvaluate { index: usize },

    #[error("no training data bound to the network")]
    NoTrainingData,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
