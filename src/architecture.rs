//! Architecture configuration structures
//!
//! This module describes layer stacks in JSON so architectures can be changed
//! without touching code. [`build_stack`] turns a parsed description into a
//! shape-checked [`LayerStack`].

use crate::error::{NetworkError, Result};
use crate::layers::{
    ActivationFunction, ActivationLayer, BiasLayer, ConvolutionLayer, DropoutLayer, LayerKind,
    LinearLayer, PoolingKind, PoolingLayer, SoftmaxLayer,
};
use crate::stack::LayerStack;
use crate::tensor::Shape;
use crate::utils::rng::SimpleRng;
use serde::Deserialize;
use std::fs;

/// Shape of one input example.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct InputConfig {
    pub rows: usize,
    #[serde(default = "one")]
    pub cols: usize,
    #[serde(default = "one")]
    pub slices: usize,
}

fn one() -> usize {
    1
}

impl InputConfig {
    pub fn shape(&self) -> Shape {
        Shape::new(self.rows, self.cols, self.slices)
    }
}

/// Configuration for a single layer.
///
/// Different layer types require different fields:
///
/// - **linear**: `input_size`, `output_size`
/// - **bias**: `size`
/// - **bias2d**: `maps`
/// - **convolution**: `in_maps`, `out_maps`, `kernel_size` (or `kernel_rows` and
///   `kernel_cols`), optional `stride` (default 1) and `padding` (default 0)
/// - **pooling**: `kernel_size`, optional `pooling` ("mean" or "max", default "mean")
/// - **activation**: `activation` ("identity", "logistic"/"sigmoid", "tanh", "relu")
/// - **softmax**: no fields
/// - **dropout**: `drop_rate` in [0.0, 1.0)
///
/// # Examples
///
/// ```json
/// {
///   "layer_type": "convolution",
///   "in_maps": 1,
///   "out_maps": 8,
///   "kernel_size": 5
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayerConfig {
    /// Layer family
    pub layer_type: String,

    pub input_size: Option<usize>,
    pub output_size: Option<usize>,

    /// Number of biases for a per-unit bias layer
    pub size: Option<usize>,
    /// Number of feature maps for a per-map bias layer
    pub maps: Option<usize>,

    pub in_maps: Option<usize>,
    pub out_maps: Option<usize>,
    /// Square kernel side, for convolution and pooling
    pub kernel_size: Option<usize>,
    pub kernel_rows: Option<usize>,
    pub kernel_cols: Option<usize>,
    pub stride: Option<usize>,
    pub padding: Option<usize>,

    /// Pooling reduction: "mean" or "max"
    pub pooling: Option<String>,

    /// Activation function name
    pub activation: Option<String>,

    pub drop_rate: Option<f64>,
}

/// Configuration for an entire layer stack.
///
/// # Example
///
/// ```json
/// {
///   "input": { "rows": 28, "cols": 28 },
///   "layers": [
///     { "layer_type": "convolution", "in_maps": 1, "out_maps": 8, "kernel_size": 5 },
///     { "layer_type": "bias2d", "maps": 8 },
///     { "layer_type": "activation", "activation": "relu" },
///     { "layer_type": "pooling", "kernel_size": 2, "pooling": "max" },
///     { "layer_type": "linear", "input_size": 1152, "output_size": 10 },
///     { "layer_type": "bias", "size": 10 },
///     { "layer_type": "softmax" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ArchitectureConfig {
    pub input: InputConfig,
    /// Layers, applied in the order they appear
    pub layers: Vec<LayerConfig>,
}

/// Loads and validates an architecture configuration from a JSON file.
///
/// # Examples
///
/// ```no_run
/// use layer_stack_nets::architecture::load_architecture;
///
/// let arch = load_architecture("config/architectures/cnn_small.json").unwrap();
/// assert!(!arch.layers.is_empty());
/// ```
pub fn load_architecture(path: &str) -> Result<ArchitectureConfig> {
    let contents = fs::read_to_string(path)?;
    parse_architecture(&contents)
}

/// Parses and validates an architecture configuration from a JSON string.
pub fn parse_architecture(contents: &str) -> Result<ArchitectureConfig> {
    let config: ArchitectureConfig = serde_json::from_str(contents)?;
    validate_architecture(&config)?;
    Ok(config)
}

fn invalid(index: usize, message: impl std::fmt::Display) -> NetworkError {
    NetworkError::InvalidConfig(format!("Layer {}: {}", index, message))
}

fn require(value: Option<usize>, index: usize, layer: &str, field: &str) -> Result<usize> {
    value.ok_or_else(|| invalid(index, format!("{} layer requires '{}'", layer, field)))
}

fn require_positive(value: Option<usize>, index: usize, layer: &str, field: &str) -> Result<usize> {
    let value = require(value, index, layer, field)?;
    if value == 0 {
        return Err(invalid(index, format!("{} must be greater than 0", field)));
    }
    Ok(value)
}

fn kernel_dims(layer: &LayerConfig, index: usize) -> Result<(usize, usize)> {
    match (layer.kernel_rows, layer.kernel_cols, layer.kernel_size) {
        (Some(rows), Some(cols), _) => {
            if rows == 0 || cols == 0 {
                return Err(invalid(index, "kernel dimensions must be greater than 0"));
            }
            Ok((rows, cols))
        }
        (None, None, size) => {
            let size = require_positive(size, index, "convolution", "kernel_size")?;
            Ok((size, size))
        }
        _ => Err(invalid(
            index,
            "convolution layer needs both 'kernel_rows' and 'kernel_cols'",
        )),
    }
}

fn pooling_kind(layer: &LayerConfig, index: usize) -> Result<PoolingKind> {
    match layer.pooling.as_deref().map(str::to_lowercase).as_deref() {
        None | Some("mean") => Ok(PoolingKind::Mean),
        Some("max") => Ok(PoolingKind::Max),
        Some(other) => Err(invalid(index, format!("unknown pooling '{}'", other))),
    }
}

fn activation_function(layer: &LayerConfig, index: usize) -> Result<ActivationFunction> {
    let name = layer
        .activation
        .as_deref()
        .ok_or_else(|| invalid(index, "activation layer requires 'activation'"))?;
    ActivationFunction::from_name(name)
        .ok_or_else(|| invalid(index, format!("unknown activation '{}'", name)))
}

/// Validates every layer's fields. Connections between layers are checked when
/// the stack is built.
fn validate_architecture(config: &ArchitectureConfig) -> Result<()> {
    if config.layers.is_empty() {
        return Err(NetworkError::InvalidConfig(
            "Architecture must have at least one layer".to_string(),
        ));
    }
    if config.input.shape().is_empty() {
        return Err(NetworkError::InvalidConfig(
            "input dimensions must be greater than 0".to_string(),
        ));
    }

    for (index, layer) in config.layers.iter().enumerate() {
        validate_layer(layer, index)?;
    }
    Ok(())
}

fn validate_layer(layer: &LayerConfig, index: usize) -> Result<()> {
    match layer.layer_type.to_lowercase().as_str() {
        "linear" => {
            require_positive(layer.input_size, index, "linear", "input_size")?;
            require_positive(layer.output_size, index, "linear", "output_size")?;
        }
        "bias" => {
            require(layer.size, index, "bias", "size")?;
        }
        "bias2d" => {
            require(layer.maps, index, "bias2d", "maps")?;
        }
        "convolution" => {
            require_positive(layer.in_maps, index, "convolution", "in_maps")?;
            require_positive(layer.out_maps, index, "convolution", "out_maps")?;
            kernel_dims(layer, index)?;
            if layer.stride == Some(0) {
                return Err(invalid(index, "stride must be greater than 0"));
            }
        }
        "pooling" => {
            require_positive(layer.kernel_size, index, "pooling", "kernel_size")?;
            pooling_kind(layer, index)?;
        }
        "activation" => {
            activation_function(layer, index)?;
        }
        "softmax" => {}
        "dropout" => {
            let rate = layer
                .drop_rate
                .ok_or_else(|| invalid(index, "dropout layer requires 'drop_rate'"))?;
            if !(0.0..1.0).contains(&rate) {
                return Err(invalid(index, "drop_rate must be in range [0.0, 1.0)"));
            }
        }
        other => return Err(invalid(index, format!("Unknown layer type: {}", other))),
    }
    Ok(())
}

fn build_layer(layer: &LayerConfig, index: usize, rng: &mut SimpleRng) -> Result<LayerKind> {
    validate_layer(layer, index)?;

    let kind = match layer.layer_type.to_lowercase().as_str() {
        "linear" => {
            let input = require(layer.input_size, index, "linear", "input_size")?;
            let output = require(layer.output_size, index, "linear", "output_size")?;
            LinearLayer::new(input, output, rng).into()
        }
        "bias" => BiasLayer::per_unit(require(layer.size, index, "bias", "size")?).into(),
        "bias2d" => BiasLayer::per_map(require(layer.maps, index, "bias2d", "maps")?).into(),
        "convolution" => {
            let in_maps = require(layer.in_maps, index, "convolution", "in_maps")?;
            let out_maps = require(layer.out_maps, index, "convolution", "out_maps")?;
            let (kernel_rows, kernel_cols) = kernel_dims(layer, index)?;
            ConvolutionLayer::new(in_maps, out_maps, kernel_rows, kernel_cols, rng)
                .with_stride(layer.stride.unwrap_or(1))
                .with_padding(layer.padding.unwrap_or(0))
                .into()
        }
        "pooling" => {
            let kernel = require(layer.kernel_size, index, "pooling", "kernel_size")?;
            PoolingLayer::new(kernel, pooling_kind(layer, index)?).into()
        }
        "activation" => ActivationLayer::new(activation_function(layer, index)?).into(),
        "softmax" => SoftmaxLayer::new().into(),
        "dropout" => DropoutLayer::new(layer.drop_rate.unwrap_or(0.0)).into(),
        other => return Err(invalid(index, format!("Unknown layer type: {}", other))),
    };
    Ok(kind)
}

/// Builds a [`LayerStack`] from a parsed architecture.
///
/// Weighted layers draw their initial weights from `rng`. Layers that do not
/// connect (for example a linear layer whose `input_size` differs from the
/// previous layer's output) are reported as
/// [`NetworkError::LayerShapeMismatch`].
pub fn build_stack(config: &ArchitectureConfig, rng: &mut SimpleRng) -> Result<LayerStack> {
    validate_architecture(config)?;
    let layers = config
        .layers
        .iter()
        .enumerate()
        .map(|(index, layer)| build_layer(layer, index, rng))
        .collect::<Result<Vec<_>>>()?;
    LayerStack::new(config.input.shape(), layers)
}
