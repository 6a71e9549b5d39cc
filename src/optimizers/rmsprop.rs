//! RMSProp update rule.

use crate::optimizers::UpdateRule;

/// Scales each step by a running root-mean-square of recent gradients.
///
/// ```text
/// s_t = α * s_{t-1} + (1 - α) * gradient²
/// parameter = parameter - η * gradient / (√s_t + ε)
/// ```
#[derive(Debug, Clone)]
pub struct RMSProp {
    learning_rate: f64,
    alpha: f64,
    epsilon: f64,
    mean_squared_gradient: Vec<f64>,
}

impl RMSProp {
    pub fn new(learning_rate: f64, alpha: f64, epsilon: f64) -> Self {
        Self {
            learning_rate,
            alpha,
            epsilon,
            mean_squared_gradient: Vec::new(),
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl Default for RMSProp {
    fn default() -> Self {
        Self::new(0.01, 0.99, 1e-8)
    }
}

impl UpdateRule for RMSProp {
    fn update(&mut self, parameters: &mut [f64], gradients: &[f64]) {
        assert_eq!(
            parameters.len(),
            gradients.len(),
            "Parameters and gradients must have the same length"
        );

        if self.mean_squared_gradient.len() != parameters.len() {
            self.mean_squared_gradient.resize(parameters.len(), 0.0);
        }

        for ((param, &grad), msg) in parameters
            .iter_mut()
            .zip(gradients)
            .zip(self.mean_squared_gradient.iter_mut())
        {
            *msg = self.alpha * *msg + (1.0 - self.alpha) * grad * grad;
            *param -= self.learning_rate * grad / (msg.sqrt() + self.epsilon);
        }
    }

    fn reset(&mut self) {
        self.mean_squared_gradient.clear();
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.learning_rate = lr;
    }
}
