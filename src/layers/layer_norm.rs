//! Layer normalization over the embedding dimension
//!
//! Each row (token) is normalized independently:
//!
//! 1. mean μ and population variance σ² of the row
//! 2. x_norm = (x - μ) / sqrt(σ² + ε)
//! 3. y = γ * x_norm + β, with per-column γ (init 1) and β (init 0)
//!
//! Unlike batch normalization there are no running statistics, so training and
//! inference behave identically. A constant row normalizes to zero and maps to β.

use crate::error::{Result, VitError};
use crate::layers::{Initializer, Layer, Parameter};
use crate::matrix::{Device, Matrix};

/// Default ε added to the variance.
pub const LAYER_NORM_EPSILON: f64 = 1e-5;

#[derive(Debug)]
pub struct LayerNorm {
    dim: usize,
    epsilon: f64,
    gamma: Parameter,
    beta: Parameter,
}

impl LayerNorm {
    pub fn new(dim: usize, init: &mut Initializer) -> Self {
        Self {
            dim,
            epsilon: LAYER_NORM_EPSILON,
            gamma: init.ones(1, dim),
            beta: init.zeros(1, dim),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn gamma(&self) -> &Parameter {
        &self.gamma
    }

    pub fn beta(&self) -> &Parameter {
        &self.beta
    }

    pub fn beta_mut(&mut self) -> &mut Parameter {
        &mut self.beta
    }
}

impl Layer for LayerNorm {
    fn forward(&self, input: &Matrix, _device: Device) -> Result<Matrix> {
        if input.cols() != self.dim {
            return Err(VitError::Shape {
                op: "layer_norm",
                left: input.shape(),
                right: self.gamma.shape(),
            });
        }

        let gamma = self.gamma.value().as_slice();
        let beta = self.beta.value().as_slice();
        let n = self.dim as f64;
        let mut output = input.clone();

        for i in 0..output.rows() {
            let row = output.row_mut(i);
            let mean = row.iter().sum::<f64>() / n;
            let var = row.iter().map(|&x| (x - mean) * (x - mean)).sum::<f64>() / n;
            let inv_std = 1.0 / (var + self.epsilon).sqrt();
            for ((x, &g), &b) in row.iter_mut().zip(gamma).zip(beta) {
                *x = (*x - mean) * inv_std * g + b;
            }
        }

        Ok(output)
    }

    fn parameters(&self) -> Vec<(String, &Parameter)> {
        vec![
            ("gamma".to_string(), &self.gamma),
            ("beta".to_string(), &self.beta),
        ]
    }

    fn parameters_mut(&mut self) -> Vec<(String, &mut Parameter)> {
        vec![
            ("gamma".to_string(), &mut self.gamma),
            ("beta".to_string(), &mut self.beta),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_mean_unit_variance() {
        let mut init = Initializer::new(1);
        let norm = LayerNorm::new(4, &mut init);
        let input = Matrix::from_vec(2, 4, vec![1.0, 2.0, 3.0, 4.0, -3.0, 0.0, 3.0, 6.0]).unwrap();
        let output = norm.forward(&input, Device::Cpu).unwrap();

        for i in 0..2 {
            let row = output.row(i);
            let mean = row.iter().sum::<f64>() / 4.0;
            let var = row.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / 4.0;
            assert!(mean.abs() < 1e-12);
            assert!((var - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_constant_row_maps_to_beta() {
        let mut init = Initializer::new(1);
        let mut norm = LayerNorm::new(3, &mut init);
        norm.beta_mut()
            .assign(&Matrix::from_vec(1, 3, vec![0.1, 0.2, 0.3]).unwrap())
            .unwrap();

        let output = norm.forward(&Matrix::filled(1, 3, 7.0), Device::Cpu).unwrap();
        assert_eq!(output.as_slice(), &[0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_rejects_wrong_width() {
        let mut init = Initializer::new(1);
        let norm = LayerNorm::new(3, &mut init);
        assert!(norm.forward(&Matrix::zeros(2, 4), Device::Cpu).is_err());
    }
}
