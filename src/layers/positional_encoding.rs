//! Learned positional encoding
//!
//! Holds a `[max_seq_len, embed_dim]` table, initialized uniformly in ±0.02,
//! and adds row `i` of the table to token `i` of the sequence.

use crate::error::{Result, VitError};
use crate::layers::{Initializer, Layer, Parameter};
use crate::matrix::{Device, Matrix};

const INIT_RANGE: f64 = 0.02;

#[derive(Debug)]
pub struct PositionalEncoding {
    max_seq_len: usize,
    embed_dim: usize,
    table: Parameter,
}

impl PositionalEncoding {
    pub fn new(max_seq_len: usize, embed_dim: usize, init: &mut Initializer) -> Self {
        Self {
            max_seq_len,
            embed_dim,
            table: init.uniform(max_seq_len, embed_dim, INIT_RANGE),
        }
    }

    pub fn max_seq_len(&self) -> usize {
        self.max_seq_len
    }

    pub fn embed_dim(&self) -> usize {
        self.embed_dim
    }

    pub fn table(&self) -> &Parameter {
        &self.table
    }
}

impl Layer for PositionalEncoding {
    /// Sequences longer than the table are a shape error; every position
    /// receives its own embedding.
    fn forward(&self, sequence: &Matrix, _device: Device) -> Result<Matrix> {
        if sequence.rows() > self.max_seq_len || sequence.cols() != self.embed_dim {
            return Err(VitError::Shape {
                op: "positional_encoding",
                left: sequence.shape(),
                right: self.table.shape(),
            });
        }

        let mut output = sequence.clone();
        for i in 0..output.rows() {
            for (x, &p) in output.row_mut(i).iter_mut().zip(self.table.value().row(i)) {
                *x += p;
            }
        }
        Ok(output)
    }

    fn parameters(&self) -> Vec<(String, &Parameter)> {
        vec![("table".to_string(), &self.table)]
    }

    fn parameters_mut(&mut self) -> Vec<(String, &mut Parameter)> {
        vec![("table".to_string(), &mut self.table)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adds_table_rows() {
        let mut init = Initializer::new(11);
        let pos = PositionalEncoding::new(5, 3, &mut init);
        let output = pos.forward(&Matrix::zeros(3, 3), Device::Cpu).unwrap();

        for i in 0..3 {
            assert_eq!(output.row(i), pos.table().value().row(i));
        }
    }

    #[test]
    fn test_small_initial_range() {
        let mut init = Initializer::new(11);
        let pos = PositionalEncoding::new(10, 8, &mut init);
        assert!(pos
            .table()
            .value()
            .as_slice()
            .iter()
            .all(|v| v.abs() <= INIT_RANGE));
    }

    #[test]
    fn test_rejects_sequence_longer_than_table() {
        let mut init = Initializer::new(11);
        let pos = PositionalEncoding::new(2, 3, &mut init);
        assert!(pos.forward(&Matrix::zeros(3, 3), Device::Cpu).is_err());
    }
}
