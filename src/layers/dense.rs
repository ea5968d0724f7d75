//! Dense (fully connected) layer implementation
//!
//! This module provides a DenseLayer (also known as Linear or Fully Connected layer)
//! that performs the transformation: output = input × weights + biases

use crate::error::Result;
use crate::layers::{Initializer, Layer, Parameter};
use crate::matrix::{Device, Matrix};

/// Dense (fully connected) layer with weights and biases.
///
/// Performs the linear transformation: y = xW + b
/// where x is the input (rows × input_size),
/// W is the weight matrix (input_size × output_size),
/// and b is the bias row vector (1 × output_size) added to every row.
///
/// # Example
///
/// ```ignore
/// use rust_vision_transformer::layers::{DenseLayer, Initializer};
///
/// let mut init = Initializer::new(42);
/// let layer = DenseLayer::new(64, 128, &mut init);
/// assert_eq!(layer.input_size(), 64);
/// assert_eq!(layer.output_size(), 128);
/// ```
#[derive(Debug)]
pub struct DenseLayer {
    input_size: usize,
    output_size: usize,
    weights: Parameter,
    biases: Parameter,
}

impl DenseLayer {
    /// Create a new DenseLayer with fan-in scaled initialization.
    ///
    /// Weights are sampled uniformly from [-limit, limit] where
    /// limit = sqrt(2 / input_size). Biases are initialized to zero.
    ///
    /// # Arguments
    ///
    /// * `input_size` - Number of input features
    /// * `output_size` - Number of output features
    /// * `init` - Seeded initializer issuing the parameter handles
    pub fn new(input_size: usize, output_size: usize, init: &mut Initializer) -> Self {
        let limit = (2.0 / input_size.max(1) as f64).sqrt();
        let weights = init.uniform(input_size, output_size, limit);
        let biases = init.zeros(1, output_size);

        Self {
            input_size,
            output_size,
            weights,
            biases,
        }
    }

    /// Get the input size of the layer.
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// Get the output size of the layer.
    pub fn output_size(&self) -> usize {
        self.output_size
    }

    pub fn weights(&self) -> &Parameter {
        &self.weights
    }

    pub fn biases(&self) -> &Parameter {
        &self.biases
    }
}

impl Layer for DenseLayer {
    fn forward(&self, input: &Matrix, device: Device) -> Result<Matrix> {
        device
            .matmul(input, self.weights.value())?
            .add_row_vector(self.biases.value())
    }

    fn parameters(&self) -> Vec<(String, &Parameter)> {
        vec![
            ("weight".to_string(), &self.weights),
            ("bias".to_string(), &self.biases),
        ]
    }

    fn parameters_mut(&mut self) -> Vec<(String, &mut Parameter)> {
        vec![
            ("weight".to_string(), &mut self.weights),
            ("bias".to_string(), &mut self.biases),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_layer_creation() {
        let mut init = Initializer::new(42);
        let layer = DenseLayer::new(10, 5, &mut init);

        assert_eq!(layer.input_size(), 10);
        assert_eq!(layer.output_size(), 5);
        assert_eq!(layer.weights().shape(), (10, 5));
        assert_eq!(layer.biases().shape(), (1, 5));
    }

    #[test]
    fn test_dense_layer_parameter_count() {
        let mut init = Initializer::new(42);
        let layer = DenseLayer::new(64, 128, &mut init);

        assert_eq!(layer.parameter_count(), 64 * 128 + 128);
    }

    #[test]
    fn test_fan_in_initialization() {
        let mut init = Initializer::new(42);
        let layer = DenseLayer::new(50, 20, &mut init);
        let limit = (2.0f64 / 50.0).sqrt();

        for &weight in layer.weights().value().as_slice() {
            assert!(weight >= -limit && weight <= limit);
        }
        assert!(layer.biases().value().as_slice().iter().all(|&b| b == 0.0));
    }

    #[test]
    fn test_forward_adds_bias_to_every_row() {
        let mut init = Initializer::new(3);
        let mut layer = DenseLayer::new(2, 2, &mut init);
        layer
            .weights
            .assign(&Matrix::from_vec(2, 2, vec![1.0, 0.0, 0.0, 1.0]).unwrap())
            .unwrap();
        layer
            .biases
            .assign(&Matrix::from_vec(1, 2, vec![0.5, -0.5]).unwrap())
            .unwrap();

        let input = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let output = layer.forward(&input, Device::Cpu).unwrap();
        assert_eq!(output.as_slice(), &[1.5, 1.5, 3.5, 3.5]);
    }

    #[test]
    fn test_forward_rejects_wrong_width() {
        let mut init = Initializer::new(3);
        let layer = DenseLayer::new(4, 2, &mut init);
        assert!(layer.forward(&Matrix::zeros(1, 3), Device::Cpu).is_err());
    }
}
