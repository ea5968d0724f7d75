//! Data ingestion and storage
//!
//! - [`dataset`]: IDX (MNIST-format) image/label loading and batch gathering
//! - [`augmentation`]: Gaussian pixel noise and mean/std normalization
//! - [`persistence`]: plain-text matrix and vector files, used for checkpoints

pub mod augmentation;
pub mod dataset;
pub mod persistence;

pub use augmentation::{add_noise, normalize};
pub use dataset::{load_idx_images, load_idx_labels, Dataset, IDX_IMAGE_MAGIC, IDX_LABEL_MAGIC};
pub use persistence::{load_matrix, load_vector, save_matrix, save_vector};
