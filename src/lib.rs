//! Rust Vision Transformer Library
//!
//! This library provides a Vision Transformer image classifier together with
//! the dense-matrix engine, layers, loss, optimizers and training loop it
//! needs.
//!
//! # Modules
//!
//! - `matrix`: Dense f64 matrix and the CPU/BLAS matmul backends
//! - `layers`: Layer trait and the transformer building blocks
//! - `vit`: The full Vision Transformer model and its checkpoints
//! - `loss`: Softmax cross-entropy loss, its gradient, accuracy
//! - `optimizers`: Optimizer trait and implementations (SGD, Adam)
//! - `utils`: Shared utilities (RNG, activation functions, LR schedule)
//! - `data`: IDX dataset loading, augmentation, text persistence
//! - `trainer`: Epoch/batch training loop and evaluation
//! - `config`: Training configuration structures
//! - `architecture`: Model architecture configuration
//! - `error`: Crate-wide error type

pub mod architecture;
pub mod config;
pub mod data;
pub mod error;
pub mod layers;
pub mod loss;
pub mod matrix;
pub mod optimizers;
pub mod trainer;
pub mod utils;
pub mod vit;

pub use architecture::ViTConfig;
pub use config::TrainingConfig;
pub use error::{Result, VitError};
pub use matrix::{Device, Matrix};
pub use vit::VisionTransformer;
