//! Adam (Adaptive Moment Estimation) optimizer implementation
//!
//! This module provides the Adam optimizer, which combines momentum and
//! adaptive learning rates with bias correction for improved convergence.

use std::collections::HashMap;

use crate::error::Result;
use crate::layers::{ParamHandle, Parameter};
use crate::matrix::Matrix;
use crate::optimizers::{check_gradient, Optimizer};

/// First and second moment estimates for one parameter.
#[derive(Debug, Clone)]
struct Moments {
    m: Matrix,
    v: Matrix,
}

/// Adam (Adaptive Moment Estimation) optimizer.
///
/// Adam maintains two moving averages for each weight:
///
/// 1. First moment (mean) of gradients (momentum)
/// 2. Second moment (uncentered variance) of gradients (adaptive learning rate)
///
/// The update rule is:
///
/// ```text
/// m_t = β1 * m_{t-1} + (1 - β1) * gradient
/// v_t = β2 * v_{t-1} + (1 - β2) * gradient²
/// m_hat = m_t / (1 - β1^t)
/// v_hat = v_t / (1 - β2^t)
/// parameter = parameter - α * m_hat / (√v_hat + ε)
/// ```
///
/// # State
///
/// Moments are stored per [`ParamHandle`] and created lazily (zero-filled) the
/// first time a handle is updated, so one optimizer serves any number of
/// parameters. The time step `t` is global: it advances by one on every
/// [`Optimizer::update`] call, whichever parameter is updated.
///
/// A stream of zero gradients leaves the parameter exactly unchanged, since
/// `m` stays zero.
///
/// # Reference
///
/// Kingma, D. P., & Ba, J. (2014). Adam: A method for stochastic optimization.
/// arXiv preprint arXiv:1412.6980.
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    state: HashMap<ParamHandle, Moments>,
    /// Time step counter for bias correction
    t: u64,
}

impl Adam {
    /// Creates a new Adam optimizer with the specified hyperparameters.
    ///
    /// # Typical Values
    ///
    /// The original Adam paper recommends:
    /// - learning_rate: 0.001
    /// - beta1: 0.9
    /// - beta2: 0.999
    /// - epsilon: 1e-8
    pub fn new(learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            state: HashMap::new(),
            t: 0,
        }
    }

    /// Number of updates performed since construction or the last reset.
    pub fn time_step(&self) -> u64 {
        self.t
    }

    /// Number of parameters with moment estimates.
    pub fn state_count(&self) -> usize {
        self.state.len()
    }

    pub fn has_state(&self, handle: ParamHandle) -> bool {
        self.state.contains_key(&handle)
    }
}

impl Optimizer for Adam {
    fn update(&mut self, parameter: &mut Parameter, gradient: &Matrix) -> Result<()> {
        check_gradient(parameter, gradient)?;

        let (rows, cols) = parameter.shape();
        let moments = self.state.entry(parameter.handle()).or_insert_with(|| Moments {
            m: Matrix::zeros(rows, cols),
            v: Matrix::zeros(rows, cols),
        });

        self.t += 1;
        let exponent = i32::try_from(self.t).unwrap_or(i32::MAX);
        let bias_correction1 = 1.0 - self.beta1.powi(exponent);
        let bias_correction2 = 1.0 - self.beta2.powi(exponent);

        let weights = parameter.value_mut().as_mut_slice();
        let m = moments.m.as_mut_slice();
        let v = moments.v.as_mut_slice();
        for (i, &g) in gradient.as_slice().iter().enumerate() {
            m[i] = self.beta1 * m[i] + (1.0 - self.beta1) * g;
            v[i] = self.beta2 * v[i] + (1.0 - self.beta2) * g * g;

            let m_hat = m[i] / bias_correction1;
            let v_hat = v[i] / bias_correction2;
            weights[i] -= self.learning_rate * m_hat / (v_hat.sqrt() + self.epsilon);
        }

        Ok(())
    }

    fn reset(&mut self) {
        self.state.clear();
        self.t = 0;
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.learning_rate = lr;
    }
}
