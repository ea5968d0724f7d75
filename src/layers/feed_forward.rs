//! Position-wise feed-forward block: `GELU(x·W1 + b1)·W2 + b2`.

use crate::error::Result;
use crate::layers::{scoped, DenseLayer, Initializer, Layer, Parameter};
use crate::matrix::{Device, Matrix};
use crate::utils::gelu;

#[derive(Debug)]
pub struct FeedForward {
    fc1: DenseLayer,
    fc2: DenseLayer,
}

impl FeedForward {
    /// `dim → hidden_dim → dim`; output width equals input width.
    pub fn new(dim: usize, hidden_dim: usize, init: &mut Initializer) -> Self {
        Self {
            fc1: DenseLayer::new(dim, hidden_dim, init),
            fc2: DenseLayer::new(hidden_dim, dim, init),
        }
    }

    pub fn dim(&self) -> usize {
        self.fc1.input_size()
    }

    pub fn hidden_dim(&self) -> usize {
        self.fc1.output_size()
    }
}

impl Layer for FeedForward {
    fn forward(&self, input: &Matrix, device: Device) -> Result<Matrix> {
        let hidden = gelu(&self.fc1.forward(input, device)?);
        self.fc2.forward(&hidden, device)
    }

    fn parameters(&self) -> Vec<(String, &Parameter)> {
        let mut params = scoped("fc1", self.fc1.parameters());
        params.extend(scoped("fc2", self.fc2.parameters()));
        params
    }

    fn parameters_mut(&mut self) -> Vec<(String, &mut Parameter)> {
        let mut params = scoped("fc1", self.fc1.parameters_mut());
        params.extend(scoped("fc2", self.fc2.parameters_mut()));
        params
    }
}
