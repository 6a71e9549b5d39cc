//! Plain gradient descent.

use crate::optimizers::UpdateRule;

/// Steps every parameter against its gradient by a fixed learning rate:
///
/// `w = w - η * ∂L/∂w`
///
/// Keeps no state, so `reset` is a no-op and each step depends only on the
/// current gradient.
#[derive(Debug, Clone)]
pub struct SGD {
    learning_rate: f64,
}

impl SGD {
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }
}

impl UpdateRule for SGD {
    /// # Panics
    ///
    /// Panics if `parameters` and `gradients` differ in length.
    fn update(&mut self, parameters: &mut [f64], gradients: &[f64]) {
        assert_eq!(
            parameters.len(),
            gradients.len(),
            "Parameters and gradients must have the same length"
        );

        let step = self.learning_rate;
        parameters
            .iter_mut()
            .zip(gradients)
            .for_each(|(w, g)| *w -= step * g);
    }

    fn reset(&mut self) {}

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.learning_rate = lr;
    }
}
