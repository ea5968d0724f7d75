//! Pre-norm transformer encoder block
//!
//! ```text
//! x1  = x  + Attention(LayerNorm1(x))
//! out = x1 + FeedForward(LayerNorm2(x1))
//! ```
//!
//! Normalization happens before each sub-layer and the residual adds the
//! un-normalized stream, which keeps deep stacks stable. The order is fixed.

use crate::error::Result;
use crate::layers::{
    scoped, FeedForward, Initializer, Layer, LayerNorm, MultiHeadAttention, Parameter,
};
use crate::matrix::{Device, Matrix};

#[derive(Debug)]
pub struct TransformerBlock {
    norm1: LayerNorm,
    attention: MultiHeadAttention,
    norm2: LayerNorm,
    feed_forward: FeedForward,
}

impl TransformerBlock {
    /// # Errors
    ///
    /// Propagates the attention configuration error when `num_heads` does not
    /// divide `embed_dim`.
    pub fn new(
        embed_dim: usize,
        num_heads: usize,
        mlp_dim: usize,
        init: &mut Initializer,
    ) -> Result<Self> {
        let norm1 = LayerNorm::new(embed_dim, init);
        let attention = MultiHeadAttention::new(embed_dim, num_heads, init)?;
        let norm2 = LayerNorm::new(embed_dim, init);
        let feed_forward = FeedForward::new(embed_dim, mlp_dim, init);

        Ok(Self {
            norm1,
            attention,
            norm2,
            feed_forward,
        })
    }

    pub fn attention(&self) -> &MultiHeadAttention {
        &self.attention
    }

    pub fn feed_forward(&self) -> &FeedForward {
        &self.feed_forward
    }
}

impl Layer for TransformerBlock {
    fn forward(&self, input: &Matrix, device: Device) -> Result<Matrix> {
        let normed = self.norm1.forward(input, device)?;
        let mut x1 = self.attention.forward(&normed, device)?;
        x1.add_inplace(input)?;

        let normed = self.norm2.forward(&x1, device)?;
        let mut output = self.feed_forward.forward(&normed, device)?;
        output.add_inplace(&x1)?;
        Ok(output)
    }

    fn parameters(&self) -> Vec<(String, &Parameter)> {
        let mut params = scoped("norm1", self.norm1.parameters());
        params.extend(scoped("attention", self.attention.parameters()));
        params.extend(scoped("norm2", self.norm2.parameters()));
        params.extend(scoped("feed_forward", self.feed_forward.parameters()));
        params
    }

    fn parameters_mut(&mut self) -> Vec<(String, &mut Parameter)> {
        let mut params = scoped("norm1", self.norm1.parameters_mut());
        params.extend(scoped("attention", self.attention.parameters_mut()));
        params.extend(scoped("norm2", self.norm2.parameters_mut()));
        params.extend(scoped("feed_forward", self.feed_forward.parameters_mut()));
        params
    }
}
