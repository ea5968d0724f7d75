//! Optimizer abstractions for parameter updates
//!
//! This module provides the Optimizer trait and the two update rules used to
//! train the classification head: plain SGD and Adam.
//!
//! # Overview
//!
//! Optimizers turn a gradient into a parameter change. The basic rule is
//! `weight = weight - learning_rate * gradient`; Adam adds per-weight momentum
//! and adaptive step sizes. Optimizers act on a [`Parameter`] rather than a raw
//! buffer, so stateful optimizers can key their state by the parameter's
//! [`ParamHandle`](crate::layers::ParamHandle).
//!
//! # Available Optimizers
//!
//! - SGD: Vanilla stochastic gradient descent
//! - Adam: Adaptive moment estimation with bias correction
//!
//! # Example
//!
//! ```
//! use rust_vision_transformer::layers::Initializer;
//! use rust_vision_transformer::matrix::Matrix;
//! use rust_vision_transformer::optimizers::{Adam, Optimizer};
//!
//! let mut init = Initializer::new(0);
//! let mut weights = init.ones(2, 2);
//! let mut optimizer = Adam::new(0.001, 0.9, 0.999, 1e-8);
//!
//! optimizer.update(&mut weights, &Matrix::filled(2, 2, 0.5)).unwrap();
//! assert!(weights.value()[(0, 0)] < 1.0);
//! ```

pub mod adam;
pub mod sgd;

pub use adam::Adam;
pub use sgd::SGD;

use crate::config::{OptimizerKind, TrainingConfig};
use crate::error::{Result, VitError};
use crate::layers::Parameter;
use crate::matrix::Matrix;

/// Core trait for optimizers.
///
/// All optimizer types (SGD, Adam) implement this trait to provide a uniform
/// interface for parameter updates during training.
///
/// # State Management
///
/// Some optimizers (like Adam) maintain internal state across updates:
/// - Momentum estimates, one per parameter handle
/// - Adaptive learning rate statistics, one per parameter handle
/// - A global time step counter
///
/// The optimizer manages this state internally, so callers only need to
/// provide parameters and gradients.
pub trait Optimizer {
    /// Update a parameter in place from its gradient.
    ///
    /// # Arguments
    ///
    /// * `parameter` - Parameter to update; its handle identifies any optimizer state
    /// * `gradient` - Gradient of the loss with respect to the parameter
    ///
    /// # Errors
    ///
    /// Returns a shape error if `gradient` does not match the parameter's shape.
    /// The parameter is left untouched in that case.
    fn update(&mut self, parameter: &mut Parameter, gradient: &Matrix) -> Result<()>;

    /// Reset optimizer state.
    ///
    /// Clears accumulated moments and the time step. For vanilla SGD this is
    /// a no-op.
    fn reset(&mut self);

    /// Current base learning rate.
    fn learning_rate(&self) -> f64;

    /// Set the base learning rate, e.g. from a scheduler.
    fn set_learning_rate(&mut self, lr: f64);
}

/// Build the optimizer named by a training configuration.
pub fn from_config(config: &TrainingConfig) -> Box<dyn Optimizer> {
    match config.optimizer {
        OptimizerKind::Sgd => Box::new(SGD::new(config.learning_rate)),
        OptimizerKind::Adam => Box::new(Adam::new(
            config.learning_rate,
            config.beta1,
            config.beta2,
            config.epsilon,
        )),
    }
}

/// Shape check shared by the update rules.
fn check_gradient(parameter: &Parameter, gradient: &Matrix) -> Result<()> {
    if parameter.shape() != gradient.shape() {
        return Err(VitError::Shape {
            op: "optimizer_update",
            left: parameter.shape(),
            right: gradient.shape(),
        });
    }
    Ok(())
}
