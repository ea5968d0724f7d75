//! Vision Transformer classifier
//!
//! ```text
//! images [batch, img²]
//!   -> PatchEmbedding          [batch * num_patches, embed]
//!   -> per image: [CLS; patches]  [num_patches + 1, embed]
//!   -> PositionalEncoding
//!   -> TransformerBlock × num_layers
//!   -> CLS row                 [batch, embed]
//!   -> head: features · Wᵀ + b [batch, num_classes]
//! ```
//!
//! # Training limitation
//!
//! Gradients are computed for the classification head only. The patch
//! embedding, positional table, CLS token and transformer blocks keep their
//! initial values, so training fits a linear classifier on top of fixed
//! random transformer features. Every head update is followed by a fixed
//! multiplicative weight decay of [`HEAD_WEIGHT_DECAY`] on the head weight.

use std::fs;
use std::path::Path;

use crate::architecture::{load_architecture, ViTConfig};
use crate::data::persistence::{load_matrix, save_matrix};
use crate::error::{Result, VitError};
use crate::layers::{
    scoped, Initializer, Layer, Parameter, PatchEmbedding, PositionalEncoding, TransformerBlock,
};
use crate::loss::{cross_entropy_gradient, cross_entropy_loss};
use crate::matrix::{Device, Matrix};
use crate::optimizers::{Optimizer, SGD};

/// Multiplier applied to the head weight after every update.
pub const HEAD_WEIGHT_DECAY: f64 = 0.9999;

const CONFIG_FILE: &str = "config.json";

/// Gradients of the batch loss with respect to the head, with the logits and
/// loss they were computed from.
#[derive(Debug, Clone)]
pub struct HeadGradients {
    /// `[num_classes, embed_dim]`
    pub weight: Matrix,
    /// `[1, num_classes]`
    pub bias: Matrix,
    /// `[batch, num_classes]`, before the update
    pub logits: Matrix,
    pub loss: f64,
}

#[derive(Debug)]
pub struct VisionTransformer {
    config: ViTConfig,
    device: Device,
    patch_embedding: PatchEmbedding,
    positional_encoding: PositionalEncoding,
    blocks: Vec<TransformerBlock>,
    cls_token: Parameter,
    head_weight: Parameter,
    head_bias: Parameter,
}

impl VisionTransformer {
    /// Build a model with weights drawn from `config.seed`.
    ///
    /// # Errors
    ///
    /// [`VitError::Config`] when the configuration fails validation.
    pub fn new(config: ViTConfig) -> Result<Self> {
        let mut init = Initializer::new(config.seed);
        Self::with_initializer(config, &mut init)
    }

    /// Build a model drawing weights and parameter handles from `init`.
    pub fn with_initializer(config: ViTConfig, init: &mut Initializer) -> Result<Self> {
        config.validate()?;

        let embed_dim = config.embed_dim;
        let patch_embedding = PatchEmbedding::new(config.patch_size, embed_dim, init);
        let positional_encoding = PositionalEncoding::new(config.seq_len(), embed_dim, init);
        let blocks = (0..config.num_layers)
            .map(|_| TransformerBlock::new(embed_dim, config.num_heads, config.mlp_dim, init))
            .collect::<Result<Vec<_>>>()?;

        let limit = (2.0 / embed_dim as f64).sqrt();
        let cls_token = init.uniform(1, embed_dim, limit);
        let head_weight = init.uniform(config.num_classes, embed_dim, limit);
        let head_bias = init.zeros(1, config.num_classes);

        let device = Device::select(config.use_accelerator);

        let model = Self {
            config,
            device,
            patch_embedding,
            positional_encoding,
            blocks,
            cls_token,
            head_weight,
            head_bias,
        };

        log::debug!(
            "built vision transformer: {} patches/image, {} blocks, {} parameters on {}",
            model.config.num_patches(),
            model.blocks.len(),
            model.parameter_count(),
            model.device.name()
        );
        Ok(model)
    }

    pub fn config(&self) -> &ViTConfig {
        &self.config
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn num_classes(&self) -> usize {
        self.config.num_classes
    }

    pub fn blocks(&self) -> &[TransformerBlock] {
        &self.blocks
    }

    fn check_images(&self, images: &Matrix) -> Result<()> {
        if images.rows() == 0 {
            return Err(VitError::EmptyBatch);
        }
        if images.cols() != self.config.input_dim() {
            return Err(VitError::Shape {
                op: "vision_transformer",
                left: images.shape(),
                right: (images.rows(), self.config.input_dim()),
            });
        }
        Ok(())
    }

    /// Final CLS representation for each image: `[batch, embed_dim]`.
    pub fn cls_features(&self, images: &Matrix) -> Result<Matrix> {
        self.check_images(images)?;

        let num_patches = self.config.num_patches();
        let embed_dim = self.config.embed_dim;
        let tokens = self.patch_embedding.forward(images, self.device)?;

        let mut features = Matrix::zeros(images.rows(), embed_dim);
        for b in 0..images.rows() {
            let mut sequence = Matrix::zeros(num_patches + 1, embed_dim);
            sequence.row_mut(0).copy_from_slice(self.cls_token.value().row(0));
            for p in 0..num_patches {
                sequence
                    .row_mut(p + 1)
                    .copy_from_slice(tokens.row(b * num_patches + p));
            }

            let mut x = self.positional_encoding.forward(&sequence, self.device)?;
            for block in &self.blocks {
                x = block.forward(&x, self.device)?;
            }
            features.row_mut(b).copy_from_slice(x.row(0));
        }

        Ok(features)
    }

    fn head(&self, features: &Matrix) -> Result<Matrix> {
        self.device
            .matmul_transposed(features, self.head_weight.value())?
            .add_row_vector(self.head_bias.value())
    }

    /// Class logits `[batch, num_classes]`, without softmax.
    ///
    /// `training` selects the dropout mode. Dropout is configured but not
    /// applied, so both modes return the same logits.
    pub fn forward(&self, images: &Matrix, _training: bool) -> Result<Matrix> {
        let features = self.cls_features(images)?;
        self.head(&features)
    }

    /// Row-wise argmax of `logits`; ties resolve to the lowest class index.
    pub fn get_predictions(&self, logits: &Matrix) -> Vec<usize> {
        logits.argmax_rows()
    }

    /// Loss and analytic head gradients for one labelled batch.
    ///
    /// `weight = gradᵀ · features` and `bias = column sums of grad`, where
    /// `grad` is the batch-averaged cross-entropy gradient at the logits.
    pub fn head_gradients(&self, images: &Matrix, labels: &[usize]) -> Result<HeadGradients> {
        let features = self.cls_features(images)?;
        let logits = self.head(&features)?;

        let loss = cross_entropy_loss(&logits, labels)?;
        let grad = cross_entropy_gradient(&logits, labels)?;

        Ok(HeadGradients {
            weight: self.device.matmul(&grad.transpose(), &features)?,
            bias: grad.sum_rows(),
            logits,
            loss,
        })
    }

    /// Apply `grads` to the head through `optimizer`, then decay the head weight.
    pub fn apply_head_update(
        &mut self,
        optimizer: &mut dyn Optimizer,
        grads: &HeadGradients,
    ) -> Result<()> {
        optimizer.update(&mut self.head_weight, &grads.weight)?;
        optimizer.update(&mut self.head_bias, &grads.bias)?;
        self.head_weight.value_mut().scale_inplace(HEAD_WEIGHT_DECAY);
        Ok(())
    }

    /// One plain gradient step on the head at learning rate `lr`.
    ///
    /// Returns the batch loss measured before the update.
    pub fn backward_and_update(
        &mut self,
        images: &Matrix,
        labels: &[usize],
        lr: f64,
    ) -> Result<f64> {
        let grads = self.head_gradients(images, labels)?;
        let mut sgd = SGD::new(lr);
        self.apply_head_update(&mut sgd, &grads)?;
        Ok(grads.loss)
    }

    /// Every trainable parameter with its dotted name, in construction order.
    pub fn parameters(&self) -> Vec<(String, &Parameter)> {
        let mut params = scoped("patch_embedding", self.patch_embedding.parameters());
        params.extend(scoped("positional_encoding", self.positional_encoding.parameters()));
        for (i, block) in self.blocks.iter().enumerate() {
            params.extend(scoped(&format!("blocks.{i}"), block.parameters()));
        }
        params.push(("cls_token".to_string(), &self.cls_token));
        params.push(("head.weight".to_string(), &self.head_weight));
        params.push(("head.bias".to_string(), &self.head_bias));
        params
    }

    pub fn parameters_mut(&mut self) -> Vec<(String, &mut Parameter)> {
        let mut params = scoped("patch_embedding", self.patch_embedding.parameters_mut());
        params.extend(scoped(
            "positional_encoding",
            self.positional_encoding.parameters_mut(),
        ));
        for (i, block) in self.blocks.iter_mut().enumerate() {
            params.extend(scoped(&format!("blocks.{i}"), block.parameters_mut()));
        }
        params.push(("cls_token".to_string(), &mut self.cls_token));
        params.push(("head.weight".to_string(), &mut self.head_weight));
        params.push(("head.bias".to_string(), &mut self.head_bias));
        params
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters().iter().map(|(_, p)| p.len()).sum()
    }

    /// Write `config.json` plus one `<name>.txt` matrix file per parameter into `dir`.
    pub fn save_checkpoint(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| VitError::io(dir, e))?;

        let config_path = dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(&self.config)?;
        fs::write(&config_path, json).map_err(|e| VitError::io(&config_path, e))?;

        let params = self.parameters();
        for (name, param) in &params {
            save_matrix(param.value(), dir.join(format!("{name}.txt")))?;
        }

        log::info!("saved checkpoint with {} tensors to {}", params.len(), dir.display());
        Ok(())
    }

    /// Overwrite this model's parameters from a checkpoint directory.
    ///
    /// Every parameter file must exist and match the current shape; handles
    /// (and therefore optimizer state) are kept. On error the model is left
    /// untouched.
    pub fn load_checkpoint(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        let mut loaded = Vec::new();
        for (name, param) in self.parameters() {
            let values = load_matrix(dir.join(format!("{name}.txt")))?;
            if values.shape() != param.shape() {
                return Err(VitError::Shape {
                    op: "load_checkpoint",
                    left: param.shape(),
                    right: values.shape(),
                });
            }
            loaded.push(values);
        }

        // Nothing is overwritten until every file has been read and checked.
        for ((_, param), values) in self.parameters_mut().into_iter().zip(&loaded) {
            param.assign(values)?;
        }
        log::info!("loaded checkpoint from {}", dir.display());
        Ok(())
    }

    /// Rebuild a model from the `config.json` in `dir` and load its weights.
    pub fn from_checkpoint(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let config = load_architecture(dir.join(CONFIG_FILE))?;
        let mut model = Self::new(config)?;
        model.load_checkpoint(dir)?;
        Ok(model)
    }
}
