//! Architecture configuration for the Vision Transformer
//!
//! This module provides the [`ViTConfig`] structure that defines a model's shape
//! and can be loaded from a JSON file, so architectures can be changed without
//! touching code.
//!
//! # Example
//!
//! ```json
//! {
//!   "img_size": 28,
//!   "patch_size": 7,
//!   "embed_dim": 64,
//!   "num_heads": 4,
//!   "mlp_dim": 128,
//!   "num_layers": 2,
//!   "num_classes": 10
//! }
//! ```
//!
//! `dropout` (0.1), `use_accelerator` (false) and `seed` (42) are optional.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VitError};

fn default_dropout() -> f64 {
    0.1
}

fn default_seed() -> u64 {
    42
}

/// Hyperparameters of a [`VisionTransformer`](crate::vit::VisionTransformer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViTConfig {
    /// Side length of the square input images, in pixels
    pub img_size: usize,
    /// Side length of the square patches; must divide `img_size`
    pub patch_size: usize,
    /// Token width
    pub embed_dim: usize,
    /// Attention heads per block; must divide `embed_dim`
    pub num_heads: usize,
    /// Hidden width of each feed-forward block
    pub mlp_dim: usize,
    /// Number of transformer blocks
    pub num_layers: usize,
    pub num_classes: usize,

    /// Dropout rate, range [0.0, 1.0). Stored with the model but not applied.
    #[serde(default = "default_dropout")]
    pub dropout: f64,

    /// Route matmuls through the BLAS backend when it is compiled in.
    #[serde(default)]
    pub use_accelerator: bool,

    /// Seed for weight initialization.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for ViTConfig {
    /// A 28×28 configuration with 7×7 patches, sized for MNIST-style digits.
    fn default() -> Self {
        Self {
            img_size: 28,
            patch_size: 7,
            embed_dim: 128,
            num_heads: 8,
            mlp_dim: 512,
            num_layers: 4,
            num_classes: 10,
            dropout: default_dropout(),
            use_accelerator: false,
            seed: default_seed(),
        }
    }
}

impl ViTConfig {
    /// Patches per image, `(img_size / patch_size)²`.
    pub fn num_patches(&self) -> usize {
        let per_side = self.img_size / self.patch_size.max(1);
        per_side * per_side
    }

    /// Sequence length including the CLS token.
    pub fn seq_len(&self) -> usize {
        self.num_patches() + 1
    }

    /// Pixels per flattened image.
    pub fn input_dim(&self) -> usize {
        self.img_size * self.img_size
    }

    /// Checks every structural constraint the model relies on.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("img_size", self.img_size),
            ("patch_size", self.patch_size),
            ("embed_dim", self.embed_dim),
            ("num_heads", self.num_heads),
            ("mlp_dim", self.mlp_dim),
            ("num_layers", self.num_layers),
            ("num_classes", self.num_classes),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(VitError::Config(format!("{name} must be positive")));
            }
        }

        if self.img_size % self.patch_size != 0 {
            return Err(VitError::Config(format!(
                "patch_size ({}) must divide img_size ({})",
                self.patch_size, self.img_size
            )));
        }

        if self.embed_dim % self.num_heads != 0 {
            return Err(VitError::Config(format!(
                "embed_dim ({}) must be divisible by num_heads ({})",
                self.embed_dim, self.num_heads
            )));
        }

        if !(0.0..1.0).contains(&self.dropout) {
            return Err(VitError::Config(format!(
                "dropout must be in [0.0, 1.0), got {}",
                self.dropout
            )));
        }

        Ok(())
    }
}

/// Loads an architecture configuration from a JSON file.
///
/// Reads the file at `path`, deserializes it and validates the result.
///
/// # Examples
///
/// ```no_run
/// use rust_vision_transformer::architecture::load_architecture;
///
/// let arch = load_architecture("config/vit_mnist.json").unwrap();
/// assert_eq!(arch.img_size % arch.patch_size, 0);
/// ```
pub fn load_architecture(path: impl AsRef<Path>) -> Result<ViTConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| VitError::io(path, e))?;
    let config: ViTConfig = serde_json::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ViTConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.num_patches(), 16);
        assert_eq!(config.seq_len(), 17);
    }

    #[test]
    fn test_optional_fields_take_defaults() {
        let json = r#"{"img_size": 8, "patch_size": 4, "embed_dim": 8,
            "num_heads": 2, "mlp_dim": 16, "num_layers": 1, "num_classes": 3}"#;
        let config: ViTConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.dropout, 0.1);
        assert!(!config.use_accelerator);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_rejects_indivisible_patch() {
        let config = ViTConfig {
            patch_size: 5,
            ..ViTConfig::default()
        };
        assert!(matches!(config.validate(), Err(VitError::Config(_))));
    }

    #[test]
    fn test_rejects_indivisible_heads() {
        let config = ViTConfig {
            num_heads: 3,
            ..ViTConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_layers() {
        let config = ViTConfig {
            num_layers: 0,
            ..ViTConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
