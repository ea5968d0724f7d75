//! Multi-head self-attention
//!
//! Bidirectional (encoder-style) scaled dot-product attention over one token
//! sequence at a time. There is no causal mask: every token attends to every
//! other token, which is what an image classifier wants.
//!
//! # Computation
//!
//! For an input `X` of shape `[seq_len, embed_dim]`:
//!
//! 1. `Q = X·W_q`, `K = X·W_k`, `V = X·W_v`
//! 2. split each into `num_heads` contiguous column blocks of `head_dim`
//! 3. per head: `A_h = softmax(Q_h·K_hᵀ / √head_dim)` (row-wise), `O_h = A_h·V_h`
//! 4. concatenate the `O_h` back by column position
//! 5. project: `output = concat·W_o`
//!
//! Every row of every `A_h` sums to 1, so each output token is a convex
//! combination of value rows before the final projection.

use crate::error::{Result, VitError};
use crate::layers::{Initializer, Layer, Parameter};
use crate::matrix::{Device, Matrix};
use crate::utils::softmax;

/// Multi-head self-attention with four `embed_dim × embed_dim` projections.
///
/// # Example
///
/// ```
/// use rust_vision_transformer::layers::{Initializer, Layer, MultiHeadAttention};
/// use rust_vision_transformer::matrix::{Device, Matrix};
///
/// let mut init = Initializer::new(7);
/// let attention = MultiHeadAttention::new(8, 2, &mut init).unwrap();
/// let tokens = Matrix::filled(5, 8, 0.1);
/// let output = attention.forward(&tokens, Device::Cpu).unwrap();
/// assert_eq!(output.shape(), (5, 8));
/// ```
#[derive(Debug)]
pub struct MultiHeadAttention {
    embed_dim: usize,
    num_heads: usize,
    head_dim: usize,
    w_q: Parameter,
    w_k: Parameter,
    w_v: Parameter,
    w_o: Parameter,
}

impl MultiHeadAttention {
    /// Creates the attention layer.
    ///
    /// Projection weights are sampled uniformly in ±sqrt(2 / embed_dim).
    ///
    /// # Errors
    ///
    /// [`VitError::Config`] when `num_heads` is zero or does not divide `embed_dim`.
    pub fn new(embed_dim: usize, num_heads: usize, init: &mut Initializer) -> Result<Self> {
        if num_heads == 0 || embed_dim % num_heads != 0 {
            return Err(VitError::Config(format!(
                "embed_dim ({embed_dim}) must be divisible by num_heads ({num_heads})"
            )));
        }

        let limit = (2.0 / embed_dim as f64).sqrt();
        Ok(Self {
            embed_dim,
            num_heads,
            head_dim: embed_dim / num_heads,
            w_q: init.uniform(embed_dim, embed_dim, limit),
            w_k: init.uniform(embed_dim, embed_dim, limit),
            w_v: init.uniform(embed_dim, embed_dim, limit),
            w_o: init.uniform(embed_dim, embed_dim, limit),
        })
    }

    pub fn embed_dim(&self) -> usize {
        self.embed_dim
    }

    pub fn num_heads(&self) -> usize {
        self.num_heads
    }

    pub fn head_dim(&self) -> usize {
        self.head_dim
    }

    /// Attention for one head.
    ///
    /// `q`, `k`, `v` are `[seq_len, head_dim]`. Returns the head output
    /// `[seq_len, head_dim]` and the attention weights `[seq_len, seq_len]`.
    pub fn scaled_dot_product_attention(
        &self,
        q: &Matrix,
        k: &Matrix,
        v: &Matrix,
        device: Device,
    ) -> Result<(Matrix, Matrix)> {
        let scale = 1.0 / (self.head_dim as f64).sqrt();
        let scores = device.matmul_transposed(q, k)?.scale(scale);
        let weights = softmax(&scores);
        let output = device.matmul(&weights, v)?;
        Ok((output, weights))
    }

    fn check_input(&self, input: &Matrix) -> Result<()> {
        if input.cols() != self.embed_dim {
            return Err(VitError::Shape {
                op: "multi_head_attention",
                left: input.shape(),
                right: self.w_q.shape(),
            });
        }
        Ok(())
    }

    /// Runs the heads and returns the merged (pre-`W_o`) output together with
    /// each head's attention weights.
    fn attend(&self, input: &Matrix, device: Device) -> Result<(Matrix, Vec<Matrix>)> {
        self.check_input(input)?;

        let q = device.matmul(input, self.w_q.value())?;
        let k = device.matmul(input, self.w_k.value())?;
        let v = device.matmul(input, self.w_v.value())?;

        let mut merged = Matrix::zeros(input.rows(), self.embed_dim);
        let mut all_weights = Vec::with_capacity(self.num_heads);
        for h in 0..self.num_heads {
            let start = h * self.head_dim;
            let q_h = q.column_block(start, self.head_dim)?;
            let k_h = k.column_block(start, self.head_dim)?;
            let v_h = v.column_block(start, self.head_dim)?;

            let (head_out, weights) = self.scaled_dot_product_attention(&q_h, &k_h, &v_h, device)?;
            merged.set_column_block(start, &head_out)?;
            all_weights.push(weights);
        }

        Ok((merged, all_weights))
    }

    /// Per-head attention weight matrices `[seq_len, seq_len]` for `input`.
    pub fn attention_weights(&self, input: &Matrix, device: Device) -> Result<Vec<Matrix>> {
        self.attend(input, device).map(|(_, weights)| weights)
    }
}

impl Layer for MultiHeadAttention {
    fn forward(&self, input: &Matrix, device: Device) -> Result<Matrix> {
        let (merged, _) = self.attend(input, device)?;
        device.matmul(&merged, self.w_o.value())
    }

    fn parameters(&self) -> Vec<(String, &Parameter)> {
        vec![
            ("w_q".to_string(), &self.w_q),
            ("w_k".to_string(), &self.w_k),
            ("w_v".to_string(), &self.w_v),
            ("w_o".to_string(), &self.w_o),
        ]
    }

    fn parameters_mut(&mut self) -> Vec<(String, &mut Parameter)> {
        vec![
            ("w_q".to_string(), &mut self.w_q),
            ("w_k".to_string(), &mut self.w_k),
            ("w_v".to_string(), &mut self.w_v),
            ("w_o".to_string(), &mut self.w_o),
        ]
    }
}
