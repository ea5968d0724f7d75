//! Stochastic Gradient Descent (SGD) optimizer implementation
//!
//! This module provides a vanilla SGD optimizer that performs the basic
//! gradient descent update: `parameter = parameter - learning_rate * gradient`

use crate::error::Result;
use crate::layers::Parameter;
use crate::matrix::Matrix;
use crate::optimizers::{check_gradient, Optimizer};

/// Stochastic Gradient Descent optimizer.
///
/// Implements the basic gradient descent update rule without momentum or
/// adaptive learning rates:
///
/// `w = w - η * ∇L/∂w`
///
/// where w is the parameter, η (eta) is the learning rate, and ∇L/∂w is the gradient.
///
/// # Example
///
/// ```
/// use rust_vision_transformer::layers::Initializer;
/// use rust_vision_transformer::matrix::Matrix;
/// use rust_vision_transformer::optimizers::{Optimizer, SGD};
///
/// let mut init = Initializer::new(0);
/// let mut weights = init.ones(1, 3);
/// let gradients = Matrix::from_vec(1, 3, vec![1.0, 2.0, 3.0]).unwrap();
///
/// let mut optimizer = SGD::new(0.1);
/// optimizer.update(&mut weights, &gradients).unwrap();
/// assert!((weights.value()[(0, 2)] - 0.7).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct SGD {
    learning_rate: f64,
}

impl SGD {
    /// Creates a new SGD optimizer with the specified learning rate.
    ///
    /// # Typical Values
    ///
    /// Common learning rates range from 0.001 to 0.1:
    /// - 0.01: Good starting point for the head of a small ViT
    /// - 0.001: More conservative, useful for fine-tuning
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }
}

impl Optimizer for SGD {
    fn update(&mut self, parameter: &mut Parameter, gradient: &Matrix) -> Result<()> {
        check_gradient(parameter, gradient)?;
        parameter
            .value_mut()
            .sub_scaled_inplace(gradient, self.learning_rate)
    }

    fn reset(&mut self) {
        // Vanilla SGD has no state to reset
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.learning_rate = lr;
    }
}
