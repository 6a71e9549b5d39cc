//! Finite-difference checks of the gradients produced by backward propagation
//!
//! Each test binds a small batch without moving the parameters, then compares
//! the analytic gradient of every example's loss against central differences.

use layer_stack_nets::init::{LayerInitialization, RandomInitialization};
use layer_stack_nets::layers::{
    ActivationFunction, ActivationLayer, BiasLayer, ConvolutionLayer, LayerKind, LinearLayer,
    PoolingLayer, SoftmaxLayer,
};
use layer_stack_nets::optimizers::{ObjectiveFunction, StochasticOptimizer, SGD};
use layer_stack_nets::output::{
    CrossEntropyError, MeanSquaredError, OneHotLayer, OutputLayer, RegressionLayer,
};
use layer_stack_nets::utils::SimpleRng;
use layer_stack_nets::{Cnn, Cube, Ffn, LayerStack, Matrix, Network, SampleBatch, Shape};

const STEP: f64 = 1e-6;
const TOLERANCE: f64 = 1e-5;

fn random_values(count: usize, seed: u64) -> Vec<f64> {
    let mut rng = SimpleRng::new(seed);
    (0..count).map(|_| rng.gen_range_f64(-1.0, 1.0)).collect()
}

/// Probability columns that sum to one, for cross-entropy targets.
fn one_hot_targets(classes: usize, examples: usize) -> Matrix {
    let mut targets = Matrix::zeros(classes, examples);
    for example in 0..examples {
        targets.col_mut(example)[example % classes] = 1.0;
    }
    targets
}

fn bind<B: SampleBatch, O: OutputLayer>(network: &mut Network<'_, B, O>, inputs: B, targets: Matrix) {
    let mut frozen = StochasticOptimizer::new(SGD::new(0.0), 1, 0.0, false);
    network.train_with(inputs, targets, &mut frozen).unwrap();
}

fn check_gradients<B: SampleBatch, O: OutputLayer>(network: &mut Network<'_, B, O>) {
    let parameters = network.parameters().to_vec();
    let mut analytic = vec![0.0; parameters.len()];
    let mut probe = parameters.clone();

    for example in 0..network.num_functions() {
        network.evaluate(&parameters, example, true).unwrap();
        network.gradient(&parameters, example, &mut analytic).unwrap();

        for j in 0..parameters.len() {
            probe[j] = parameters[j] + STEP;
            let plus = network.evaluate(&probe, example, true).unwrap();
            probe[j] = parameters[j] - STEP;
            let minus = network.evaluate(&probe, example, true).unwrap();
            probe[j] = parameters[j];

            let numeric = (plus - minus) / (2.0 * STEP);
            let scale = analytic[j].abs().max(numeric.abs()).max(1.0);
            assert!(
                (analytic[j] - numeric).abs() / scale < TOLERANCE,
                "example {}, parameter {}: analytic {} vs numeric {}",
                example,
                j,
                analytic[j],
                numeric
            );
        }
    }
}

fn dense_layers(rng: &mut SimpleRng, activation: ActivationFunction) -> Vec<LayerKind> {
    vec![
        LinearLayer::new(6, 5, rng).into(),
        BiasLayer::per_unit(5).into(),
        ActivationLayer::new(activation).into(),
        LinearLayer::new(5, 3, rng).into(),
        BiasLayer::per_unit(3).into(),
        SoftmaxLayer::new().into(),
    ]
}

#[test]
fn test_ffn_logistic_cross_entropy_gradients() {
    let mut rng = SimpleRng::new(1);
    let stack = LayerStack::new(Shape::vector(6), dense_layers(&mut rng, ActivationFunction::Logistic)).unwrap();
    let mut network = Ffn::new(
        stack,
        OneHotLayer::new(CrossEntropyError),
        RandomInitialization::with_seed(-0.5, 0.5, 1),
    )
    .unwrap();

    let inputs = Matrix::from_vec(6, 4, random_values(24, 2)).unwrap();
    bind(&mut network, inputs, one_hot_targets(3, 4));
    check_gradients(&mut network);
}

#[test]
fn test_ffn_tanh_mean_squared_gradients() {
    let mut rng = SimpleRng::new(3);
    let stack = LayerStack::new(Shape::vector(6), dense_layers(&mut rng, ActivationFunction::Tanh)).unwrap();
    let mut network = Ffn::new(stack, RegressionLayer::new(MeanSquaredError), LayerInitialization).unwrap();

    let inputs = Matrix::from_vec(6, 3, random_values(18, 4)).unwrap();
    let targets = Matrix::from_vec(3, 3, random_values(9, 5)).unwrap();
    bind(&mut network, inputs, targets);
    check_gradients(&mut network);
}

#[test]
fn test_cnn_convolution_mean_pooling_gradients() {
    let mut rng = SimpleRng::new(6);
    let stack = LayerStack::new(
        Shape::new(6, 6, 1),
        vec![
            ConvolutionLayer::new(1, 2, 3, 3, &mut rng).with_padding(1).into(),
            BiasLayer::per_map(2).into(),
            ActivationLayer::new(ActivationFunction::Tanh).into(),
            PoolingLayer::mean(2).into(),
            LinearLayer::new(18, 3, &mut rng).into(),
            BiasLayer::per_unit(3).into(),
            SoftmaxLayer::new().into(),
        ],
    )
    .unwrap();
    let mut network = Cnn::new(
        stack,
        RegressionLayer::new(MeanSquaredError),
        RandomInitialization::with_seed(-0.5, 0.5, 6),
    )
    .unwrap();

    let inputs = Cube::from_vec(6, 6, 2, random_values(72, 7)).unwrap();
    bind(&mut network, inputs, one_hot_targets(3, 2));
    check_gradients(&mut network);
}

#[test]
fn test_cnn_strided_convolution_max_pooling_gradients() {
    let mut rng = SimpleRng::new(8);
    let stack = LayerStack::new(
        Shape::new(7, 7, 1),
        vec![
            ConvolutionLayer::new(1, 3, 3, 3, &mut rng).with_stride(2).into(),
            BiasLayer::per_map(3).into(),
            ActivationLayer::new(ActivationFunction::Logistic).into(),
            PoolingLayer::max(2).into(),
            LinearLayer::new(3, 2, &mut rng).into(),
            BiasLayer::per_unit(2).into(),
            SoftmaxLayer::new().into(),
        ],
    )
    .unwrap();
    let mut network = Cnn::new(
        stack,
        OneHotLayer::new(CrossEntropyError),
        RandomInitialization::with_seed(-1.0, 1.0, 8),
    )
    .unwrap();

    let inputs = Cube::from_vec(7, 7, 2, random_values(98, 9)).unwrap();
    bind(&mut network, inputs, one_hot_targets(2, 2));
    check_gradients(&mut network);
}

#[test]
fn test_two_convolutions_gradients() {
    let mut rng = SimpleRng::new(10);
    let stack = LayerStack::new(
        Shape::new(8, 8, 1),
        vec![
            ConvolutionLayer::new(1, 2, 3, 3, &mut rng).into(),
            BiasLayer::per_map(2).into(),
            ActivationLayer::new(ActivationFunction::Identity).into(),
            PoolingLayer::mean(2).into(),
            ConvolutionLayer::new(2, 3, 2, 2, &mut rng).into(),
            BiasLayer::per_map(3).into(),
            LinearLayer::new(12, 2, &mut rng).into(),
            BiasLayer::per_unit(2).into(),
            SoftmaxLayer::new().into(),
        ],
    )
    .unwrap();
    let mut network = Cnn::new(
        stack,
        OneHotLayer::new(MeanSquaredError),
        RandomInitialization::with_seed(-0.5, 0.5, 10),
    )
    .unwrap();

    let inputs = Cube::from_vec(8, 8, 2, random_values(128, 11)).unwrap();
    bind(&mut network, inputs, one_hot_targets(2, 2));
    check_gradients(&mut network);
}
