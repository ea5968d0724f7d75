//! Dense row-major matrix
//!
//! [`Matrix`] is the single numeric container of the crate: images, token
//! sequences, weights and optimizer moments are all matrices of `f64`.
//!
//! # Semantics
//!
//! - `Clone` is a deep copy of the buffer.
//! - Binary operations (`matmul`, `add`, `transpose`, ...) build a new matrix and
//!   never alias their inputs. Shape disagreements are reported as
//!   [`VitError::Shape`] instead of panicking.
//! - `(row, col)` indexing panics when out of range; use [`Matrix::get`] for a
//!   checked read.
//! - The only broadcasting is [`Matrix::add_row_vector`], used for bias addition.

pub mod backend;

pub use backend::{CpuBackend, Device, MatrixBackend};

use crate::error::{Result, VitError};
use crate::utils::SeededRng;
use std::ops::{Index, IndexMut};

/// Rectangular table of `f64` values stored in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// All-zero matrix of the given shape.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    /// Matrix with every entry set to `value`.
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Wrap a row-major buffer. Fails if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(VitError::SizeMismatch {
                what: "matrix buffer",
                got: data.len(),
                expected: rows * cols,
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Build a matrix from equally long rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.len() != cols {
                return Err(VitError::SizeMismatch {
                    what: "matrix row",
                    got: row.len(),
                    expected: cols,
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// Uniform random fill in `[low, high)`.
    pub fn random(rows: usize, cols: usize, low: f64, high: f64, rng: &mut SeededRng) -> Self {
        let data = (0..rows * cols)
            .map(|_| rng.gen_range_f64(low, high))
            .collect();
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major view of the buffer.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Checked read of a single entry.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    /// Borrow one row as a slice.
    pub fn row(&self, row: usize) -> &[f64] {
        assert!(row < self.rows, "row {} out of range for {} rows", row, self.rows);
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        assert!(row < self.rows, "row {} out of range for {} rows", row, self.rows);
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Copy one row out as a `1 x cols` matrix.
    pub fn row_matrix(&self, row: usize) -> Matrix {
        Matrix {
            rows: 1,
            cols: self.cols,
            data: self.row(row).to_vec(),
        }
    }

    /// Copy the contiguous row range `[start, start + count)` into a new matrix.
    pub fn row_block(&self, start: usize, count: usize) -> Result<Matrix> {
        if start + count > self.rows {
            return Err(VitError::Shape {
                op: "row_block",
                left: self.shape(),
                right: (start + count, self.cols),
            });
        }
        Ok(Matrix {
            rows: count,
            cols: self.cols,
            data: self.data[start * self.cols..(start + count) * self.cols].to_vec(),
        })
    }

    fn ensure_same_shape(&self, other: &Matrix, op: &'static str) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(VitError::Shape {
                op,
                left: self.shape(),
                right: other.shape(),
            });
        }
        Ok(())
    }

    /// Dense product `self · other`, triple loop in i-k-j order.
    pub fn matmul(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(VitError::Shape {
                op: "matmul",
                left: self.shape(),
                right: other.shape(),
            });
        }

        let mut out = Matrix::zeros(self.rows, other.cols);
        let n = other.cols;
        for i in 0..self.rows {
            let out_row = &mut out.data[i * n..(i + 1) * n];
            for k in 0..self.cols {
                let a = self.data[i * self.cols + k];
                let b_row = &other.data[k * n..(k + 1) * n];
                for (o, &b) in out_row.iter_mut().zip(b_row) {
                    *o += a * b;
                }
            }
        }
        Ok(out)
    }

    /// New matrix with rows and columns swapped.
    pub fn transpose(&self) -> Matrix {
        let mut out = Matrix::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out.data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        out
    }

    /// Elementwise sum.
    pub fn add(&self, other: &Matrix) -> Result<Matrix> {
        self.zip_with(other, "add", |a, b| a + b)
    }

    /// Elementwise difference.
    pub fn sub(&self, other: &Matrix) -> Result<Matrix> {
        self.zip_with(other, "sub", |a, b| a - b)
    }

    /// Elementwise (Hadamard) product.
    pub fn hadamard(&self, other: &Matrix) -> Result<Matrix> {
        self.zip_with(other, "hadamard", |a, b| a * b)
    }

    fn zip_with(
        &self,
        other: &Matrix,
        op: &'static str,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Matrix> {
        self.ensure_same_shape(other, op)?;
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    /// Multiply every entry by `factor`.
    pub fn scale(&self, factor: f64) -> Matrix {
        self.map(|x| x * factor)
    }

    /// Apply `f` to every entry.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Matrix {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    /// In-place elementwise sum.
    pub fn add_inplace(&mut self, other: &Matrix) -> Result<()> {
        self.ensure_same_shape(other, "add_inplace")?;
        for (a, &b) in self.data.iter_mut().zip(&other.data) {
            *a += b;
        }
        Ok(())
    }

    pub fn scale_inplace(&mut self, factor: f64) {
        for value in &mut self.data {
            *value *= factor;
        }
    }

    /// `self -= factor * other`, in place.
    pub fn sub_scaled_inplace(&mut self, other: &Matrix, factor: f64) -> Result<()> {
        self.ensure_same_shape(other, "sub_scaled_inplace")?;
        for (a, &b) in self.data.iter_mut().zip(&other.data) {
            *a -= factor * b;
        }
        Ok(())
    }

    /// Overwrite the contents with `other` without reallocating.
    pub fn copy_from(&mut self, other: &Matrix) -> Result<()> {
        self.ensure_same_shape(other, "copy_from")?;
        self.data.copy_from_slice(&other.data);
        Ok(())
    }

    /// Add a `1 x cols` vector to every row.
    pub fn add_row_vector(&self, bias: &Matrix) -> Result<Matrix> {
        if bias.rows != 1 || bias.cols != self.cols {
            return Err(VitError::Shape {
                op: "add_row_vector",
                left: self.shape(),
                right: bias.shape(),
            });
        }
        let mut out = self.clone();
        for row in out.data.chunks_exact_mut(self.cols.max(1)) {
            for (value, &b) in row.iter_mut().zip(&bias.data) {
                *value += b;
            }
        }
        Ok(out)
    }

    /// Sum over rows, giving a `1 x cols` matrix.
    pub fn sum_rows(&self) -> Matrix {
        let mut out = Matrix::zeros(1, self.cols);
        for row in self.data.chunks_exact(self.cols.max(1)) {
            for (acc, &value) in out.data.iter_mut().zip(row) {
                *acc += value;
            }
        }
        out
    }

    /// Copy columns `[start, start + width)` into a new `rows x width` matrix.
    pub fn column_block(&self, start: usize, width: usize) -> Result<Matrix> {
        if start + width > self.cols {
            return Err(VitError::Shape {
                op: "column_block",
                left: self.shape(),
                right: (self.rows, start + width),
            });
        }
        let mut out = Matrix::zeros(self.rows, width);
        for i in 0..self.rows {
            let src = &self.data[i * self.cols + start..i * self.cols + start + width];
            out.data[i * width..(i + 1) * width].copy_from_slice(src);
        }
        Ok(out)
    }

    /// Write `block` into columns starting at `start`.
    pub fn set_column_block(&mut self, start: usize, block: &Matrix) -> Result<()> {
        if block.rows != self.rows || start + block.cols > self.cols {
            return Err(VitError::Shape {
                op: "set_column_block",
                left: self.shape(),
                right: block.shape(),
            });
        }
        let width = block.cols;
        for i in 0..self.rows {
            let dst = &mut self.data[i * self.cols + start..i * self.cols + start + width];
            dst.copy_from_slice(&block.data[i * width..(i + 1) * width]);
        }
        Ok(())
    }

    /// Index of the largest entry of each row; the first index wins on ties.
    pub fn argmax_rows(&self) -> Vec<usize> {
        (0..self.rows)
            .map(|i| {
                let row = self.row(i);
                let mut best = 0;
                for (j, &value) in row.iter().enumerate().skip(1) {
                    if value > row[best] {
                        best = j;
                    }
                }
                best
            })
            .collect()
    }

    /// Sum of all entries.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        assert!(
            row < self.rows && col < self.cols,
            "index ({}, {}) out of range for {}x{} matrix",
            row,
            col,
            self.rows,
            self.cols
        );
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        assert!(
            row < self.rows && col < self.cols,
            "index ({}, {}) out of range for {}x{} matrix",
            row,
            col,
            self.rows,
            self.cols
        );
        &mut self.data[row * self.cols + col]
    }
}
