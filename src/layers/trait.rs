//! Layer trait definition for the transformer building blocks
//!
//! This module defines the core Layer trait that every block implements: a
//! forward pass over a token matrix and named access to its trainable parameters.

use crate::error::Result;
use crate::layers::Parameter;
use crate::matrix::{Device, Matrix};

/// Core trait for model layers.
///
/// All layers (patch embedding, attention, feed-forward, normalization, ...)
/// implement this trait to provide a uniform interface for inference and for
/// walking parameters (optimizers, checkpoints, parameter counts).
///
/// # Example
///
/// ```ignore
/// let output = block.forward(&tokens, Device::Cpu)?;
/// for (name, param) in block.parameters() {
///     println!("{name}: {:?}", param.shape());
/// }
/// ```
pub trait Layer {
    /// Forward propagation through the layer.
    ///
    /// Every matrix product goes through `device`. Returns a shape error if
    /// `input` does not match the layer's expected dimensions.
    fn forward(&self, input: &Matrix, device: Device) -> Result<Matrix>;

    /// Trainable parameters with dotted names relative to this layer
    /// (e.g. `attention.w_q`), in a stable order.
    fn parameters(&self) -> Vec<(String, &Parameter)>;

    /// Mutable counterpart of [`Layer::parameters`], same names and order.
    fn parameters_mut(&mut self) -> Vec<(String, &mut Parameter)>;

    /// Get the number of trainable scalars in the layer.
    fn parameter_count(&self) -> usize {
        self.parameters().iter().map(|(_, p)| p.len()).sum()
    }
}

/// Prefix every name with `scope.`.
pub(crate) fn scoped<P>(scope: &str, params: Vec<(String, P)>) -> Vec<(String, P)> {
    params
        .into_iter()
        .map(|(name, p)| (format!("{scope}.{name}"), p))
        .collect()
}
