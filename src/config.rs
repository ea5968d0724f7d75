//! Configuration structures for training
//!
//! This module provides [`TrainingConfig`], parsed from JSON, covering the
//! optimizer, the warmup + cosine learning rate schedule, augmentation and
//! evaluation settings. Every field has a default, so `{}` is a valid file.
//!
//! # Example
//!
//! ```json
//! {
//!   "epochs": 3,
//!   "batch_size": 32,
//!   "batches_per_epoch": 50,
//!   "learning_rate": 0.001,
//!   "warmup_steps": 100,
//!   "optimizer": "adam",
//!   "noise_level": 0.02
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VitError};

/// Update rule applied to the classification head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Sgd,
    #[default]
    Adam,
}

/// Training-loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    /// Cap on batches per epoch; `None` walks the whole training set.
    pub batches_per_epoch: Option<usize>,
    /// Peak learning rate reached at the end of warmup
    pub learning_rate: f64,
    /// Linear warmup length in steps (0 disables warmup)
    pub warmup_steps: usize,
    /// "sgd" or "adam"
    pub optimizer: OptimizerKind,
    /// Adam first-moment decay
    pub beta1: f64,
    /// Adam second-moment decay
    pub beta2: f64,
    /// Adam denominator guard
    pub epsilon: f64,
    /// Std of the Gaussian noise added to training batches (0 disables it)
    pub noise_level: f64,
    /// Map pixels from [0, 1] to [-1, 1] before training and evaluation
    pub normalize: bool,
    /// Test samples used for per-epoch validation (0 disables it)
    pub eval_samples: usize,
    /// Log a batch line every `log_every` batches
    pub log_every: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 3,
            batch_size: 32,
            batches_per_epoch: Some(50),
            learning_rate: 0.001,
            warmup_steps: 100,
            optimizer: OptimizerKind::Adam,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            noise_level: 0.02,
            normalize: true,
            eval_samples: 50,
            log_every: 10,
        }
    }
}

impl TrainingConfig {
    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(VitError::Config("epochs must be positive".into()));
        }
        if self.batch_size == 0 {
            return Err(VitError::Config("batch_size must be positive".into()));
        }
        if self.batches_per_epoch == Some(0) {
            return Err(VitError::Config("batches_per_epoch must be positive".into()));
        }
        if self.learning_rate <= 0.0 {
            return Err(VitError::Config("learning_rate must be positive".into()));
        }
        if !(0.0..1.0).contains(&self.beta1) || !(0.0..1.0).contains(&self.beta2) {
            return Err(VitError::Config("beta1 and beta2 must be in [0.0, 1.0)".into()));
        }
        if self.epsilon <= 0.0 {
            return Err(VitError::Config("epsilon must be positive".into()));
        }
        if self.noise_level < 0.0 {
            return Err(VitError::Config("noise_level must be non-negative".into()));
        }
        if self.log_every == 0 {
            return Err(VitError::Config("log_every must be positive".into()));
        }
        Ok(())
    }
}

/// Loads a training configuration from a JSON file.
///
/// Reads the file at `path`, deserializes it and validates the result.
///
/// # Examples
///
/// ```no_run
/// use rust_vision_transformer::config::load_config;
///
/// let cfg = load_config("config/training.json").unwrap();
/// assert!(cfg.batch_size > 0);
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<TrainingConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| VitError::io(path, e))?;
    let config: TrainingConfig = serde_json::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}
