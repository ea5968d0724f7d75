//! Layer abstractions for the Vision Transformer
//!
//! This module provides the Layer trait, the parameter/initializer plumbing,
//! and the building blocks stacked by [`crate::vit::VisionTransformer`].

mod r#trait;
pub mod attention;
pub mod dense;
pub mod feed_forward;
pub mod layer_norm;
pub mod parameter;
pub mod patch_embedding;
pub mod positional_encoding;
pub mod transformer_block;

// Re-export the Layer trait for convenience
pub use r#trait::Layer;
pub(crate) use r#trait::scoped;
pub use attention::MultiHeadAttention;
pub use dense::DenseLayer;
pub use feed_forward::FeedForward;
pub use layer_norm::{LayerNorm, LAYER_NORM_EPSILON};
pub use parameter::{Initializer, ParamHandle, Parameter};
pub use patch_embedding::PatchEmbedding;
pub use positional_encoding::PositionalEncoding;
pub use transformer_block::TransformerBlock;
