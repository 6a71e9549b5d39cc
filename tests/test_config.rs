//! Tests for training and architecture configuration files
//!
//! This file covers:
//! - Loading optimizer configs and the defaults of optional fields
//! - Rejecting unknown optimizers, out-of-range values and malformed JSON
//! - Building layer stacks from architecture files
//! - Reporting missing per-layer fields and unknown layer types
//! - Training a network assembled entirely from configuration

use layer_stack_nets::architecture::{build_stack, load_architecture, parse_architecture};
use layer_stack_nets::config::{load_config, parse_config};
use layer_stack_nets::init::LayerInitialization;
use layer_stack_nets::layers::{Layer, LayerKind, PoolingKind};
use layer_stack_nets::output::{CrossEntropyError, OneHotLayer};
use layer_stack_nets::utils::SimpleRng;
use layer_stack_nets::{Cnn, Cube, Matrix, NetworkError, Shape};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file.flush().unwrap();
    file
}

const CNN_ARCHITECTURE: &str = r#"{
    "input": { "rows": 28, "cols": 28 },
    "layers": [
        { "layer_type": "convolution", "in_maps": 1, "out_maps": 8, "kernel_size": 5 },
        { "layer_type": "bias2d", "maps": 8 },
        { "layer_type": "activation", "activation": "identity" },
        { "layer_type": "pooling", "kernel_size": 2 },
        { "layer_type": "convolution", "in_maps": 8, "out_maps": 12, "kernel_size": 5 },
        { "layer_type": "bias2d", "maps": 12 },
        { "layer_type": "activation", "activation": "identity" },
        { "layer_type": "pooling", "kernel_size": 2, "pooling": "max" },
        { "layer_type": "linear", "input_size": 192, "output_size": 10 },
        { "layer_type": "bias", "size": 10 },
        { "layer_type": "softmax" }
    ]
}"#;

#[test]
fn test_load_rmsprop_config() {
    let file = write_temp(
        r#"{
            "optimizer": "rmsprop",
            "learning_rate": 0.01,
            "alpha": 0.88,
            "epsilon": 1e-8,
            "max_iterations": 8000,
            "tolerance": 1e-8,
            "shuffle": true
        }"#,
    );

    let config = load_config(file.path().to_str().unwrap()).unwrap();
    assert_eq!(config.optimizer, "rmsprop");
    assert_eq!(config.learning_rate, 0.01);
    assert_eq!(config.alpha, Some(0.88));
    assert_eq!(config.max_iterations, Some(8000));
    assert_eq!(config.seed, None);
    assert!(config.build_optimizer().is_ok());
}

#[test]
fn test_minimal_config_uses_defaults() {
    let config = parse_config(r#"{ "optimizer": "sgd", "learning_rate": 0.1 }"#).unwrap();
    assert_eq!(config.max_iterations, None);
    assert_eq!(config.shuffle, None);
    assert!(config.build_optimizer().is_ok());
}

#[test]
fn test_invalid_optimizer_rejected() {
    let result = parse_config(r#"{ "optimizer": "lbfgs", "learning_rate": 0.1 }"#);
    match result {
        Err(NetworkError::InvalidConfig(message)) => assert!(message.contains("lbfgs")),
        other => panic!("expected InvalidConfig, got {:?}", other.map(|c| c.optimizer)),
    }
}

#[test]
fn test_invalid_values_rejected() {
    let negative = parse_config(r#"{ "optimizer": "sgd", "learning_rate": -0.1 }"#);
    assert!(matches!(negative, Err(NetworkError::InvalidConfig(_))));

    let alpha = parse_config(r#"{ "optimizer": "rmsprop", "learning_rate": 0.01, "alpha": 1.0 }"#);
    assert!(matches!(alpha, Err(NetworkError::InvalidConfig(_))));

    let beta = parse_config(r#"{ "optimizer": "adam", "learning_rate": 0.01, "beta2": -0.5 }"#);
    assert!(matches!(beta, Err(NetworkError::InvalidConfig(_))));

    let tolerance = parse_config(r#"{ "optimizer": "adam", "learning_rate": 0.01, "tolerance": -1.0 }"#);
    assert!(matches!(tolerance, Err(NetworkError::InvalidConfig(_))));
}

#[test]
fn test_malformed_and_missing_files() {
    let malformed = parse_config(r#"{ "optimizer": "sgd", "#);
    assert!(matches!(malformed, Err(NetworkError::Serialization(_))));

    let missing_field = parse_config(r#"{ "optimizer": "sgd" }"#);
    assert!(matches!(missing_field, Err(NetworkError::Serialization(_))));

    let missing = load_config("/nonexistent/training.json");
    assert!(matches!(missing, Err(NetworkError::Io(_))));
}

#[test]
fn test_build_cnn_from_architecture() {
    let file = write_temp(CNN_ARCHITECTURE);
    let config = load_architecture(file.path().to_str().unwrap()).unwrap();
    assert_eq!(config.layers.len(), 11);
    assert_eq!(config.input.shape(), Shape::new(28, 28, 1));

    let mut rng = SimpleRng::new(42);
    let stack = build_stack(&config, &mut rng).unwrap();
    assert_eq!(stack.network_size(), 200 + 8 + 2400 + 12 + 1920 + 10);
    assert_eq!(stack.output_shape(), Shape::vector(10));

    match stack.layer(7) {
        LayerKind::Pooling(layer) => assert_eq!(layer.kind(), PoolingKind::Max),
        other => panic!("expected pooling, got {}", other.name()),
    }
    match stack.layer(3) {
        LayerKind::Pooling(layer) => assert_eq!(layer.kind(), PoolingKind::Mean),
        other => panic!("expected pooling, got {}", other.name()),
    }
}

#[test]
fn test_configured_network_trains() {
    let architecture = parse_architecture(
        r#"{
            "input": { "rows": 4, "cols": 4 },
            "layers": [
                { "layer_type": "convolution", "in_maps": 1, "out_maps": 2, "kernel_rows": 3, "kernel_cols": 3, "padding": 1 },
                { "layer_type": "bias2d", "maps": 2 },
                { "layer_type": "activation", "activation": "tanh" },
                { "layer_type": "pooling", "kernel_size": 2 },
                { "layer_type": "linear", "input_size": 8, "output_size": 2 },
                { "layer_type": "bias", "size": 2 },
                { "layer_type": "softmax" }
            ]
        }"#,
    )
    .unwrap();
    let training = parse_config(
        r#"{ "optimizer": "adam", "learning_rate": 0.01, "max_iterations": 400, "tolerance": 0.0, "seed": 3 }"#,
    )
    .unwrap();

    let mut rng = SimpleRng::new(5);
    let stack = build_stack(&architecture, &mut rng).unwrap();
    let mut network = Cnn::new(stack, OneHotLayer::new(CrossEntropyError), LayerInitialization).unwrap();

    let mut data = vec![0.0; 32];
    data[..8].fill(1.0);
    data[24..].fill(1.0);
    let inputs = Cube::from_vec(4, 4, 2, data).unwrap();
    let targets = Matrix::from_columns(&[&[1.0, 0.0][..], &[0.0, 1.0][..]]).unwrap();

    let mut frozen = parse_config(r#"{ "optimizer": "sgd", "learning_rate": 0.0, "max_iterations": 1 }"#)
        .unwrap()
        .build_optimizer()
        .unwrap();
    let initial = network
        .train_with(inputs.clone(), targets.clone(), frozen.as_mut())
        .unwrap();

    let mut optimizer = training.build_optimizer().unwrap();
    let trained = network.retrain(optimizer.as_mut()).unwrap();
    assert!(trained < initial, "{} !< {}", trained, initial);
}

#[test]
fn test_unknown_layer_type_rejected() {
    let result = parse_architecture(
        r#"{ "input": { "rows": 4 }, "layers": [ { "layer_type": "lstm", "size": 4 } ] }"#,
    );
    match result {
        Err(NetworkError::InvalidConfig(message)) => assert!(message.contains("lstm")),
        other => panic!("expected InvalidConfig, got {:?}", other.map(|c| c.layers.len())),
    }
}

#[test]
fn test_missing_fields_rejected() {
    let cases = [
        r#"{ "layer_type": "linear", "input_size": 4 }"#,
        r#"{ "layer_type": "bias" }"#,
        r#"{ "layer_type": "convolution", "in_maps": 1, "out_maps": 2 }"#,
        r#"{ "layer_type": "convolution", "in_maps": 1, "out_maps": 2, "kernel_rows": 3 }"#,
        r#"{ "layer_type": "pooling" }"#,
        r#"{ "layer_type": "activation" }"#,
        r#"{ "layer_type": "activation", "activation": "swish" }"#,
        r#"{ "layer_type": "dropout" }"#,
        r#"{ "layer_type": "dropout", "drop_rate": 1.0 }"#,
        r#"{ "layer_type": "pooling", "kernel_size": 2, "pooling": "median" }"#,
    ];
    for layer in cases {
        let json = format!(r#"{{ "input": {{ "rows": 4 }}, "layers": [ {} ] }}"#, layer);
        let result = parse_architecture(&json);
        assert!(
            matches!(result, Err(NetworkError::InvalidConfig(_))),
            "accepted {}",
            layer
        );
    }

    let empty = parse_architecture(r#"{ "input": { "rows": 4 }, "layers": [] }"#);
    assert!(matches!(empty, Err(NetworkError::InvalidConfig(_))));
}

#[test]
fn test_layer_connection_mismatch_reported_by_stack() {
    let config = parse_architecture(
        r#"{
            "input": { "rows": 16 },
            "layers": [
                { "layer_type": "linear", "input_size": 16, "output_size": 8 },
                { "layer_type": "dropout", "drop_rate": 0.2 },
                { "layer_type": "linear", "input_size": 10, "output_size": 2 }
            ]
        }"#,
    )
    .unwrap();

    let mut rng = SimpleRng::new(1);
    let result = build_stack(&config, &mut rng);
    assert!(matches!(
        result,
        Err(NetworkError::LayerShapeMismatch { layer: 2, .. })
    ));
}
