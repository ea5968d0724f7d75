//! Learning rate scheduler trait and the warmup + cosine schedule
//!
//! This module defines the LRScheduler trait for adjusting learning rates during training.
//! Schedules are stepped once per optimizer step (not per epoch).

use std::f64::consts::PI;

/// Core trait for learning rate schedulers.
///
/// Schedulers adjust the learning rate based on how many steps have been taken.
///
/// # Example
///
/// ```ignore
/// let mut scheduler = WarmupCosine::new(1e-3, 100, 1000);
///
/// for batch in batches {
///     let lr = scheduler.next_lr();
///     // ... update parameters with lr ...
/// }
/// ```
pub trait LRScheduler {
    /// Get the current learning rate.
    ///
    /// Returns the rate computed by the most recent `step`, or the initial value
    /// before the first step.
    fn get_lr(&self) -> f64;

    /// Advance the scheduler by one step and recompute the learning rate.
    fn step(&mut self);

    /// Reset the scheduler to its initial state.
    fn reset(&mut self);

    /// Advance one step and return the learning rate to use for it.
    fn next_lr(&mut self) -> f64 {
        self.step();
        self.get_lr()
    }
}

/// Linear warmup followed by cosine decay to zero.
///
/// For step `k` (1-based, counted by `step`):
///
/// ```text
/// k <= warmup:  lr = base_lr * k / warmup
/// k >  warmup:  progress = min(1, (k - warmup) / (total - warmup))
///               lr = base_lr * 0.5 * (1 + cos(π * progress))
/// ```
///
/// The rate rises strictly during warmup, never increases afterwards and stays
/// at zero once `k >= total`. A `warmup` of zero skips the ramp; a `total` that
/// does not exceed `warmup` makes every post-warmup step zero.
///
/// # Example
///
/// ```
/// use rust_vision_transformer::utils::lr_scheduler::{LRScheduler, WarmupCosine};
///
/// let mut scheduler = WarmupCosine::new(0.1, 2, 4);
/// assert!((scheduler.next_lr() - 0.05).abs() < 1e-12);
/// assert!((scheduler.next_lr() - 0.1).abs() < 1e-12);
/// assert!((scheduler.next_lr() - 0.05).abs() < 1e-12);
/// assert!(scheduler.next_lr().abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct WarmupCosine {
    base_lr: f64,
    warmup_steps: usize,
    total_steps: usize,
    current_step: usize,
    current_lr: f64,
}

impl WarmupCosine {
    /// Creates a new schedule. `get_lr` reports `base_lr` until the first step.
    pub fn new(base_lr: f64, warmup_steps: usize, total_steps: usize) -> Self {
        Self {
            base_lr,
            warmup_steps,
            total_steps,
            current_step: 0,
            current_lr: base_lr,
        }
    }

    pub fn base_lr(&self) -> f64 {
        self.base_lr
    }

    pub fn warmup_steps(&self) -> usize {
        self.warmup_steps
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Number of steps taken so far.
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    fn lr_at(&self, step: usize) -> f64 {
        if step <= self.warmup_steps && self.warmup_steps > 0 {
            return self.base_lr * step as f64 / self.warmup_steps as f64;
        }
        if self.total_steps <= self.warmup_steps {
            return 0.0;
        }
        let decay_steps = (self.total_steps - self.warmup_steps) as f64;
        let progress = ((step - self.warmup_steps) as f64 / decay_steps).min(1.0);
        self.base_lr * 0.5 * (1.0 + (PI * progress).cos())
    }
}

impl LRScheduler for WarmupCosine {
    fn get_lr(&self) -> f64 {
        self.current_lr
    }

    fn step(&mut self) {
        self.current_step += 1;
        self.current_lr = self.lr_at(self.current_step);
    }

    fn reset(&mut self) {
        self.current_step = 0;
        self.current_lr = self.base_lr;
    }
}
