//! Shared utilities for the model and the training loop
//!
//! This module provides the seeded random source, activation functions and
//! learning rate schedules used across layers and training.

pub mod activations;
pub mod lr_scheduler;
pub mod rng;

pub use activations::{gelu, gelu_scalar, softmax, softmax_rows_inplace};
pub use lr_scheduler::{LRScheduler, WarmupCosine};
pub use rng::SeededRng;
