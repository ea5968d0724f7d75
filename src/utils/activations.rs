//! Activation functions for the transformer
//!
//! This module provides the stateless numeric transforms used by the model:
//! - Softmax (row-wise, used by attention and the loss)
//! - GELU (used between the two feed-forward projections)

use crate::matrix::Matrix;
use std::f64::consts::PI;

/// Softmax applied row-wise, in place.
///
/// Converts each row to a probability distribution. Uses the max-subtraction
/// trick for numerical stability to avoid overflow with large values.
///
/// # Arguments
/// * `data` - Flat array containing row-major matrix data
/// * `rows` - Number of rows in the matrix
/// * `cols` - Number of columns in the matrix
pub fn softmax_rows_inplace(data: &mut [f64], rows: usize, cols: usize) {
    if cols == 0 {
        return;
    }
    assert_eq!(data.len(), rows * cols, "data length mismatch in softmax_rows_inplace");

    for row in data.chunks_exact_mut(cols).take(rows) {
        let max_value = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let mut sum = 0.0;
        for value in row.iter_mut() {
            *value = (*value - max_value).exp();
            sum += *value;
        }

        let inv_sum = 1.0 / sum;
        for value in row.iter_mut() {
            *value *= inv_sum;
        }
    }
}

/// Row-wise softmax returning a new matrix.
pub fn softmax(x: &Matrix) -> Matrix {
    let (rows, cols) = x.shape();
    let mut out = x.clone();
    softmax_rows_inplace(out.as_mut_slice(), rows, cols);
    out
}

/// GELU of a single value, tanh approximation:
/// `0.5 * x * (1 + tanh(sqrt(2/π) * (x + 0.044715 * x³)))`.
pub fn gelu_scalar(x: f64) -> f64 {
    let inner = (2.0 / PI).sqrt() * (x + 0.044715 * x * x * x);
    0.5 * x * (1.0 + inner.tanh())
}

/// Elementwise GELU.
pub fn gelu(x: &Matrix) -> Matrix {
    x.map(gelu_scalar)
}
