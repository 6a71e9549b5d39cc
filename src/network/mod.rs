//! Network containers.
//!
//! [`Network`] couples a [`LayerStack`] with an [`OutputLayer`] and the
//! flattened parameter vector, and exposes the result to optimizers as an
//! [`ObjectiveFunction`]. Feed-forward and convolutional networks share this
//! one implementation and differ only in how a batch stores its examples:
//! [`Ffn`] takes a [`Matrix`] (one column per example), [`Cnn`] a [`Cube`]
//! (one slice per example).

mod persist;

pub use persist::ParameterArchive;

use std::ops::{Deref, DerefMut};
use std::time::Instant;

use log::{debug, info};

use crate::error::{NetworkError, Result};
use crate::init::InitializationRule;
use crate::layers::PassContext;
use crate::optimizers::{ObjectiveFunction, Optimizer, RMSProp, StochasticOptimizer};
use crate::output::OutputLayer;
use crate::stack::{LayerStack, Workspace};
use crate::tensor::{Cube, Matrix, SampleBatch};
use crate::utils::SimpleRng;

/// Feed-forward network over column-per-example matrices.
pub type Ffn<'a, O> = Network<'a, Matrix, O>;

/// Convolutional network over slice-per-example cubes.
pub type Cnn<'a, O> = Network<'a, Cube, O>;

/// Lifecycle of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkState {
    /// Layers and parameters are initialized; no optimization has finished.
    Built,
    /// At least one call to `train`/`train_with`/`retrain` has completed.
    Trained,
}

/// Whether a network owns its layers or works on the caller's.
#[derive(Debug)]
enum StackHandle<'a> {
    Owned(LayerStack),
    Borrowed(&'a mut LayerStack),
}

impl Deref for StackHandle<'_> {
    type Target = LayerStack;

    fn deref(&self) -> &LayerStack {
        match self {
            StackHandle::Owned(stack) => stack,
            StackHandle::Borrowed(stack) => &**stack,
        }
    }
}

impl DerefMut for StackHandle<'_> {
    fn deref_mut(&mut self) -> &mut LayerStack {
        match self {
            StackHandle::Owned(stack) => stack,
            StackHandle::Borrowed(stack) => &mut **stack,
        }
    }
}

/// Optimizer used by [`Network::train`]: RMSProp steps over single examples,
/// at most 100000 steps, stopping once a pass improves by less than `1e-5`.
pub fn default_optimizer() -> StochasticOptimizer<RMSProp> {
    StochasticOptimizer::new(RMSProp::default(), 100_000, 1e-5, true)
}

/// A layer stack, an output layer and the parameter vector they are trained
/// through.
///
/// # Example
///
/// ```ignore
/// use layer_stack_nets::init::RandomInitialization;
/// use layer_stack_nets::network::Ffn;
/// use layer_stack_nets::output::{CrossEntropyError, OneHotLayer};
///
/// let mut network = Ffn::new(
///     stack,
///     OneHotLayer::new(CrossEntropyError),
///     RandomInitialization::default(),
/// )?;
/// network.train(inputs, targets)?;
/// let predictions = network.predict(&test_inputs)?;
/// ```
pub struct Network<'a, B, O> {
    stack: StackHandle<'a>,
    output: O,
    parameter: Vec<f64>,
    workspace: Workspace,
    error: Vec<f64>,
    predictors: Option<B>,
    responses: Option<Matrix>,
    deterministic: bool,
    rng: SimpleRng,
    last_evaluated: Option<usize>,
    state: NetworkState,
}

impl<B: SampleBatch, O: OutputLayer> Network<'static, B, O> {
    /// Builds a network that owns `stack`.
    pub fn new<I: InitializationRule>(stack: LayerStack, output: O, init: I) -> Result<Self> {
        Self::build(StackHandle::Owned(stack), output, init)
    }

    /// Builds a network over an independent deep copy of `stack`.
    pub fn from_template<I: InitializationRule>(stack: &LayerStack, output: O, init: I) -> Result<Self> {
        Self::build(StackHandle::Owned(stack.clone()), output, init)
    }
}

impl<'a, B: SampleBatch, O: OutputLayer> Network<'a, B, O> {
    /// Builds a network that trains the caller's `stack` in place. The caller
    /// keeps the stack, with its updated weights, once the network is dropped.
    pub fn borrowing<I: InitializationRule>(stack: &'a mut LayerStack, output: O, init: I) -> Result<Self> {
        Self::build(StackHandle::Borrowed(stack), output, init)
    }

    fn build<I: InitializationRule>(mut stack: StackHandle<'a>, output: O, mut init: I) -> Result<Self> {
        let size = stack.network_size();
        let mut parameter = vec![0.0; size];
        stack.gather_weights(&mut parameter)?;
        init.initialize(&mut parameter, size, 1);
        if parameter.len() != size {
            return Err(NetworkError::ParameterSizeMismatch {
                expected: size,
                actual: parameter.len(),
            });
        }
        stack.network_weights(&parameter)?;

        debug!(
            "built network: {} layers, {} parameters, input {}, output {}",
            stack.len(),
            size,
            stack.input_shape(),
            stack.output_shape()
        );

        let workspace = stack.workspace();
        Ok(Self {
            stack,
            output,
            parameter,
            workspace,
            error: Vec::new(),
            predictors: None,
            responses: None,
            deterministic: false,
            rng: SimpleRng::new(42),
            last_evaluated: None,
            state: NetworkState::Built,
        })
    }

    /// Deep-copies this network, including any bound batch, into one that
    /// owns its layers.
    pub fn to_owned_network(&self) -> Network<'static, B, O>
    where
        B: Clone,
        O: Clone,
    {
        let stack: &LayerStack = &self.stack;
        Network {
            stack: StackHandle::Owned(stack.clone()),
            output: self.output.clone(),
            parameter: self.parameter.clone(),
            workspace: stack.workspace(),
            error: Vec::new(),
            predictors: self.predictors.clone(),
            responses: self.responses.clone(),
            deterministic: self.deterministic,
            rng: self.rng.clone(),
            last_evaluated: None,
            state: self.state,
        }
    }

    pub fn stack(&self) -> &LayerStack {
        &self.stack
    }

    pub fn output_layer(&self) -> &O {
        &self.output
    }

    pub fn parameters(&self) -> &[f64] {
        &self.parameter
    }

    /// Replaces the parameter vector and redistributes it into the layers.
    pub fn set_parameters(&mut self, parameters: Vec<f64>) -> Result<()> {
        self.stack.network_weights(&parameters)?;
        self.parameter = parameters;
        self.last_evaluated = None;
        Ok(())
    }

    pub fn network_size(&self) -> usize {
        self.parameter.len()
    }

    pub fn state(&self) -> NetworkState {
        self.state
    }

    /// Mode of the most recent forward pass.
    pub fn is_deterministic(&self) -> bool {
        self.deterministic
    }

    /// Reseeds the random source used by stochastic layers during training.
    pub fn set_seed(&mut self, seed: u64) {
        self.rng = SimpleRng::new(seed);
    }

    /// Binds a batch and optimizes with [`default_optimizer`].
    pub fn train(&mut self, predictors: B, responses: Matrix) -> Result<f64> {
        let mut optimizer = default_optimizer();
        self.train_with(predictors, responses, &mut optimizer)
    }

    /// Binds a batch and optimizes with `optimizer`, starting from the current
    /// parameters. On error the previous batch and parameters stay in place.
    pub fn train_with(
        &mut self,
        predictors: B,
        responses: Matrix,
        optimizer: &mut dyn Optimizer,
    ) -> Result<f64> {
        let (previous_predictors, previous_responses) = self.bind(predictors, responses)?;
        match self.optimize(optimizer) {
            Ok(objective) => Ok(objective),
            Err(err) => {
                self.predictors = previous_predictors;
                self.responses = previous_responses;
                Err(err)
            }
        }
    }

    /// Optimizes again over the batch bound by the last `train` call.
    pub fn retrain(&mut self, optimizer: &mut dyn Optimizer) -> Result<f64> {
        if self.predictors.is_none() {
            return Err(NetworkError::NoTrainingData);
        }
        self.optimize(optimizer)
    }

    /// Validates and binds a batch, returning the one it replaces.
    fn bind(&mut self, predictors: B, responses: Matrix) -> Result<(Option<B>, Option<Matrix>)> {
        if predictors.num_examples() == 0 {
            return Err(NetworkError::NoTrainingData);
        }
        if predictors.num_examples() != responses.cols() {
            return Err(NetworkError::ExampleCountMismatch {
                predictors: predictors.num_examples(),
                responses: responses.cols(),
            });
        }
        self.check_input(&predictors)?;
        let expected = self.stack.output_shape().len();
        if responses.rows() != expected {
            return Err(NetworkError::ResponseShapeMismatch {
                expected,
                actual: responses.rows(),
            });
        }

        self.last_evaluated = None;
        Ok((
            self.predictors.replace(predictors),
            self.responses.replace(responses),
        ))
    }

    fn check_input(&self, predictors: &B) -> Result<()> {
        let expected = self.stack.input_shape();
        let actual = predictors.example_shape();
        if actual != expected {
            return Err(NetworkError::InputShapeMismatch { expected, actual });
        }
        Ok(())
    }

    fn optimize(&mut self, optimizer: &mut dyn Optimizer) -> Result<f64> {
        let start = Instant::now();
        let mut iterate = self.parameter.clone();

        let objective = match optimizer.optimize(self, &mut iterate) {
            Ok(objective) => objective,
            Err(err) => {
                self.stack.network_weights(&self.parameter)?;
                self.last_evaluated = None;
                return Err(err);
            }
        };

        self.stack.network_weights(&iterate)?;
        self.parameter = iterate;
        self.state = NetworkState::Trained;

        info!(
            "optimization finished in {:.3}s; final objective {}",
            start.elapsed().as_secs_f64(),
            objective
        );
        Ok(objective)
    }

    /// Forwards every example in inference mode and returns one prediction
    /// column per example, in input order.
    pub fn predict(&mut self, predictors: &B) -> Result<Matrix> {
        self.check_input(predictors)?;
        self.stack.network_weights(&self.parameter)?;
        self.deterministic = true;
        self.last_evaluated = None;

        let count = predictors.num_examples();
        let mut results = Matrix::zeros(self.stack.output_shape().len(), count);
        for index in 0..count {
            self.stack.reset_parameter(&mut self.workspace);
            let mut ctx = PassContext::new(true, &mut self.rng);
            self.stack
                .forward(predictors.example(index), &mut self.workspace, &mut ctx)?;
            self.output
                .output_prediction(self.workspace.output(), results.col_mut(index));
        }
        Ok(results)
    }
}

impl<B: SampleBatch, O: OutputLayer> ObjectiveFunction for Network<'_, B, O> {
    fn num_functions(&self) -> usize {
        self.predictors.as_ref().map_or(0, SampleBatch::num_examples)
    }

    fn evaluate(&mut self, parameters: &[f64], index: usize, deterministic: bool) -> Result<f64> {
        let count = self.num_functions();
        let (predictors, responses) = match (&self.predictors, &self.responses) {
            (Some(predictors), Some(responses)) => (predictors, responses),
            _ => return Err(NetworkError::NoTrainingData),
        };
        if index >= count {
            return Err(NetworkError::IndexOutOfRange { index, count });
        }

        self.deterministic = deterministic;
        self.stack.network_weights(parameters)?;
        self.stack.reset_parameter(&mut self.workspace);

        let mut ctx = PassContext::new(deterministic, &mut self.rng);
        self.stack
            .forward(predictors.example(index), &mut self.workspace, &mut ctx)?;
        let loss = self.output.output_error(
            responses.col(index),
            self.workspace.output(),
            &mut self.error,
        );

        self.last_evaluated = Some(index);
        Ok(loss)
    }

    fn gradient(&mut self, _parameters: &[f64], index: usize, gradient: &mut [f64]) -> Result<()> {
        if self.last_evaluated != Some(index) {
            return Err(NetworkError::GradientBeforeEvaluate { index });
        }

        self.stack.backward(&self.error, &mut self.workspace)?;
        self.stack
            .update_gradients(&self.error, &self.workspace, gradient)
    }
}
