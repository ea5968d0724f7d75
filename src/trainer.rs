//! Mini-batch training loop
//!
//! Each epoch shuffles the training indices, walks them in batches of
//! `batch_size` (capped at `batches_per_epoch`), augments every batch with
//! Gaussian noise, optionally normalizes it to [-1, 1], and updates the
//! classification head through the configured optimizer. The learning rate
//! follows a warmup + cosine schedule over all steps of the run.

use crate::config::TrainingConfig;
use crate::data::{add_noise, normalize, Dataset};
use crate::error::{Result, VitError};
use crate::loss::{accuracy, cross_entropy_loss};
use crate::matrix::Matrix;
use crate::optimizers::{self, Optimizer};
use crate::utils::{LRScheduler, SeededRng, WarmupCosine};
use crate::vit::VisionTransformer;

const NORMALIZE_MEAN: f64 = 0.5;
const NORMALIZE_STD: f64 = 0.5;

/// Loss and accuracy over an evaluation set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss: f64,
    pub accuracy: f64,
    pub samples: usize,
}

/// Averages over one epoch's training batches.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochReport {
    /// 1-based epoch number
    pub epoch: usize,
    pub train_loss: f64,
    pub train_accuracy: f64,
    /// Learning rate used for the epoch's last batch
    pub learning_rate: f64,
    pub validation: Option<Evaluation>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    pub epochs: Vec<EpochReport>,
}

impl TrainingReport {
    pub fn last(&self) -> Option<&EpochReport> {
        self.epochs.last()
    }
}

pub struct Trainer {
    config: TrainingConfig,
    optimizer: Box<dyn Optimizer>,
    rng: SeededRng,
}

impl Trainer {
    /// # Errors
    ///
    /// [`VitError::Config`] when `config` fails validation.
    pub fn new(config: TrainingConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let optimizer = optimizers::from_config(&config);
        Ok(Self {
            config,
            optimizer,
            rng: SeededRng::new(seed),
        })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn optimizer(&self) -> &dyn Optimizer {
        self.optimizer.as_ref()
    }

    /// Batches run per epoch for a training set of `samples` rows.
    pub fn batches_per_epoch(&self, samples: usize) -> usize {
        let full_pass = samples.div_ceil(self.config.batch_size);
        match self.config.batches_per_epoch {
            Some(cap) => cap.min(full_pass),
            None => full_pass,
        }
    }

    fn prepare(&self, images: &Matrix) -> Matrix {
        if self.config.normalize {
            normalize(images, NORMALIZE_MEAN, NORMALIZE_STD)
        } else {
            images.clone()
        }
    }

    /// Train `model` on `train`, validating on `validation` after every epoch.
    pub fn fit(
        &mut self,
        model: &mut VisionTransformer,
        train: &Dataset,
        validation: Option<&Dataset>,
    ) -> Result<TrainingReport> {
        if train.is_empty() {
            return Err(VitError::EmptyBatch);
        }

        let batches = self.batches_per_epoch(train.len());
        let total_steps = self.config.epochs * batches;
        let mut scheduler =
            WarmupCosine::new(self.config.learning_rate, self.config.warmup_steps, total_steps);
        self.optimizer.reset();

        log::info!(
            "training {} epochs x {} batches of {} ({} samples), optimizer {:?}",
            self.config.epochs,
            batches,
            self.config.batch_size,
            train.len(),
            self.config.optimizer
        );

        let mut indices: Vec<usize> = (0..train.len()).collect();
        let mut report = TrainingReport::default();

        for epoch in 1..=self.config.epochs {
            self.rng.shuffle_usize(&mut indices);

            let mut total_loss = 0.0;
            let mut total_accuracy = 0.0;
            let mut lr = scheduler.get_lr();

            for (batch, chunk) in indices.chunks(self.config.batch_size).take(batches).enumerate() {
                let (images, labels) = train.batch(chunk)?;
                let images = add_noise(&images, self.config.noise_level, &mut self.rng);
                let images = self.prepare(&images);

                let grads = model.head_gradients(&images, &labels)?;
                let batch_accuracy = accuracy(&model.get_predictions(&grads.logits), &labels)?;

                lr = scheduler.next_lr();
                self.optimizer.set_learning_rate(lr);
                model.apply_head_update(self.optimizer.as_mut(), &grads)?;

                total_loss += grads.loss;
                total_accuracy += batch_accuracy;

                if batch % self.config.log_every == 0 {
                    log::debug!(
                        "epoch {epoch} batch {batch}/{batches}: loss {:.4}, acc {:.2}%, lr {lr:.6}",
                        grads.loss,
                        batch_accuracy * 100.0
                    );
                }
            }

            let validation = match validation {
                Some(data) if self.config.eval_samples > 0 => {
                    Some(self.evaluate(model, data, self.config.eval_samples)?)
                }
                _ => None,
            };

            let epoch_report = EpochReport {
                epoch,
                train_loss: total_loss / batches as f64,
                train_accuracy: total_accuracy / batches as f64,
                learning_rate: lr,
                validation,
            };
            match &epoch_report.validation {
                Some(eval) => log::info!(
                    "epoch {epoch}/{}: loss {:.4}, acc {:.2}% | validation loss {:.4}, acc {:.2}%",
                    self.config.epochs,
                    epoch_report.train_loss,
                    epoch_report.train_accuracy * 100.0,
                    eval.loss,
                    eval.accuracy * 100.0
                ),
                None => log::info!(
                    "epoch {epoch}/{}: loss {:.4}, acc {:.2}%",
                    self.config.epochs,
                    epoch_report.train_loss,
                    epoch_report.train_accuracy * 100.0
                ),
            }
            report.epochs.push(epoch_report);
        }

        Ok(report)
    }

    /// Loss and accuracy of `model` on the first `samples` rows of `data`,
    /// run in chunks of `batch_size`.
    pub fn evaluate(
        &self,
        model: &VisionTransformer,
        data: &Dataset,
        samples: usize,
    ) -> Result<Evaluation> {
        let (images, labels) = data.head(samples)?;
        if labels.is_empty() {
            return Err(VitError::EmptyBatch);
        }
        let images = self.prepare(&images);

        let mut weighted_loss = 0.0;
        let mut predictions = Vec::with_capacity(labels.len());
        for start in (0..labels.len()).step_by(self.config.batch_size) {
            let count = self.config.batch_size.min(labels.len() - start);
            let chunk = images.row_block(start, count)?;
            let chunk_labels = &labels[start..start + count];

            let logits = model.forward(&chunk, false)?;
            weighted_loss += cross_entropy_loss(&logits, chunk_labels)? * count as f64;
            predictions.extend(model.get_predictions(&logits));
        }

        Ok(Evaluation {
            loss: weighted_loss / labels.len() as f64,
            accuracy: accuracy(&predictions, &labels)?,
            samples: labels.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batches_per_epoch() {
        let config = TrainingConfig {
            batch_size: 10,
            batches_per_epoch: Some(3),
            ..TrainingConfig::default()
        };
        let trainer = Trainer::new(config, 0).unwrap();
        assert_eq!(trainer.batches_per_epoch(100), 3);
        assert_eq!(trainer.batches_per_epoch(15), 2);
    }

    #[test]
    fn test_full_pass_without_cap() {
        let config = TrainingConfig {
            batch_size: 4,
            batches_per_epoch: None,
            ..TrainingConfig::default()
        };
        let trainer = Trainer::new(config, 0).unwrap();
        assert_eq!(trainer.batches_per_epoch(9), 3);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = TrainingConfig {
            batch_size: 0,
            ..TrainingConfig::default()
        };
        assert!(Trainer::new(config, 0).is_err());
    }
}
