//! Patch embedding: square images to a sequence of projected patch tokens
//!
//! An image of `img_size × img_size` pixels (flattened row-major) is cut into
//! non-overlapping `patch_size × patch_size` tiles, visited in row-major tile
//! order (top-left to bottom-right). Each tile is flattened row-major to a
//! vector of `patch_size²` values and projected to `embed_dim`:
//!
//! ```text
//! tokens = patches · Wᵀ + b      W: embed_dim × patch_size²,  b: 1 × embed_dim
//! ```
//!
//! The image side must be a multiple of `patch_size`; remainder pixels are
//! rejected with a shape error rather than silently dropped.

use crate::error::{Result, VitError};
use crate::layers::{Initializer, Layer, Parameter};
use crate::matrix::{Device, Matrix};

#[derive(Debug)]
pub struct PatchEmbedding {
    patch_size: usize,
    embed_dim: usize,
    weight: Parameter,
    bias: Parameter,
}

impl PatchEmbedding {
    /// Projection weights are uniform in ±sqrt(2 / (patch_size² + embed_dim)),
    /// bias starts at zero.
    pub fn new(patch_size: usize, embed_dim: usize, init: &mut Initializer) -> Self {
        let patch_dim = patch_size * patch_size;
        let limit = (2.0 / (patch_dim + embed_dim).max(1) as f64).sqrt();
        Self {
            patch_size,
            embed_dim,
            weight: init.uniform(embed_dim, patch_dim, limit),
            bias: init.zeros(1, embed_dim),
        }
    }

    pub fn patch_size(&self) -> usize {
        self.patch_size
    }

    pub fn embed_dim(&self) -> usize {
        self.embed_dim
    }

    /// Length of a flattened patch.
    pub fn patch_dim(&self) -> usize {
        self.patch_size * self.patch_size
    }

    /// Patches per image for an `img_size × img_size` input.
    pub fn num_patches(&self, img_size: usize) -> usize {
        let per_side = img_size / self.patch_size;
        per_side * per_side
    }

    pub fn weight(&self) -> &Parameter {
        &self.weight
    }

    /// Side length of the square images in `images`, checked against the patch size.
    fn image_side(&self, images: &Matrix) -> Result<usize> {
        let pixels = images.cols();
        let side = (pixels as f64).sqrt().round() as usize;
        if side * side != pixels || self.patch_size == 0 || side % self.patch_size != 0 {
            return Err(VitError::Shape {
                op: "patch_embedding",
                left: images.shape(),
                right: (self.patch_size, self.patch_size),
            });
        }
        Ok(side)
    }

    /// Cut every image into flattened tiles: `[batch * num_patches, patch_size²]`.
    ///
    /// Rows for image `b` occupy `b * num_patches .. (b + 1) * num_patches`.
    pub fn extract_patches(&self, images: &Matrix) -> Result<Matrix> {
        let side = self.image_side(images)?;
        let p = self.patch_size;
        let per_side = side / p;
        let num_patches = per_side * per_side;
        let mut patches = Matrix::zeros(images.rows() * num_patches, p * p);

        for b in 0..images.rows() {
            let image = images.row(b);
            for tile_row in 0..per_side {
                for tile_col in 0..per_side {
                    let patch = patches.row_mut(b * num_patches + tile_row * per_side + tile_col);
                    for pi in 0..p {
                        let src = (tile_row * p + pi) * side + tile_col * p;
                        patch[pi * p..(pi + 1) * p].copy_from_slice(&image[src..src + p]);
                    }
                }
            }
        }

        Ok(patches)
    }
}

impl Layer for PatchEmbedding {
    /// `[batch, img_size²]` images to `[batch * num_patches, embed_dim]` tokens.
    fn forward(&self, images: &Matrix, device: Device) -> Result<Matrix> {
        let patches = self.extract_patches(images)?;
        device
            .matmul_transposed(&patches, self.weight.value())?
            .add_row_vector(self.bias.value())
    }

    fn parameters(&self) -> Vec<(String, &Parameter)> {
        vec![
            ("weight".to_string(), &self.weight),
            ("bias".to_string(), &self.bias),
        ]
    }

    fn parameters_mut(&mut self) -> Vec<(String, &mut Parameter)> {
        vec![
            ("weight".to_string(), &mut self.weight),
            ("bias".to_string(), &mut self.bias),
        ]
    }
}
