//! Adam update rule.

use crate::optimizers::UpdateRule;

/// Per-parameter step sizes from bias-corrected running moments of the
/// gradient (Kingma & Ba, 2014).
///
/// ```text
/// m_t = β1 * m_{t-1} + (1 - β1) * g
/// v_t = β2 * v_{t-1} + (1 - β2) * g²
/// w   = w - η * (m_t / (1 - β1^t)) / (√(v_t / (1 - β2^t)) + ε)
/// ```
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    first_moment: Vec<f64>,
    second_moment: Vec<f64>,
    steps: i32,
}

impl Adam {
    pub fn new(learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            first_moment: Vec::new(),
            second_moment: Vec::new(),
            steps: 0,
        }
    }

    /// Updates applied since construction or the last `reset`.
    pub fn steps(&self) -> usize {
        self.steps as usize
    }
}

impl Default for Adam {
    fn default() -> Self {
        Self::new(0.001, 0.9, 0.999, 1e-8)
    }
}

impl UpdateRule for Adam {
    fn update(&mut self, parameters: &mut [f64], gradients: &[f64]) {
        assert_eq!(
            parameters.len(),
            gradients.len(),
            "Parameters and gradients must have the same length"
        );

        // Moments start at zero and follow the parameter count.
        if self.first_moment.len() != parameters.len() {
            self.first_moment.resize(parameters.len(), 0.0);
            self.second_moment.resize(parameters.len(), 0.0);
        }

        self.steps += 1;
        let correction1 = 1.0 - self.beta1.powi(self.steps);
        let correction2 = 1.0 - self.beta2.powi(self.steps);
        let (beta1, beta2) = (self.beta1, self.beta2);

        for (((w, &g), m), v) in parameters
            .iter_mut()
            .zip(gradients)
            .zip(self.first_moment.iter_mut())
            .zip(self.second_moment.iter_mut())
        {
            *m = beta1 * *m + (1.0 - beta1) * g;
            *v = beta2 * *v + (1.0 - beta2) * g * g;
            *w -= self.learning_rate * (*m / correction1) / ((*v / correction2).sqrt() + self.epsilon);
        }
    }

    fn reset(&mut self) {
        self.first_moment.clear();
        self.second_moment.clear();
        self.steps = 0;
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.learning_rate = lr;
    }
}
