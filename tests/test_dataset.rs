//! Tests for IDX dataset loading and augmentation
//!
//! This file tests:
//! - Loading image/label files written to disk
//! - Sample limits, batching and head selection
//! - Malformed headers and truncated payloads
//! - Noise and normalization

use approx::assert_relative_eq;
use rust_vision_transformer::data::{
    add_noise, load_idx_images, load_idx_labels, normalize, Dataset, IDX_IMAGE_MAGIC,
    IDX_LABEL_MAGIC,
};
use rust_vision_transformer::error::VitError;
use rust_vision_transformer::utils::SeededRng;
use rust_vision_transformer::Matrix;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_idx(header: &[u32], payload: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for field in header {
        file.write_all(&field.to_be_bytes()).unwrap();
    }
    file.write_all(payload).unwrap();
    file.flush().unwrap();
    file
}

/// Three 2x2 images with pixel values 0..12 and labels 7, 1, 4.
fn sample_files() -> (NamedTempFile, NamedTempFile) {
    let pixels: Vec<u8> = (0u8..12).map(|p| p * 20).collect();
    let images = write_idx(&[IDX_IMAGE_MAGIC, 3, 2, 2], &pixels);
    let labels = write_idx(&[IDX_LABEL_MAGIC, 3], &[7, 1, 4]);
    (images, labels)
}

// ============================================================================
// Loading Tests
// ============================================================================

mod loading_tests {
    use super::*;

    #[test]
    fn test_load_dataset() {
        let (images, labels) = sample_files();
        let data = Dataset::load(images.path(), labels.path(), None).unwrap();

        assert_eq!(data.len(), 3);
        assert_eq!(data.input_dim(), 4);
        assert_eq!(data.labels(), &[7, 1, 4]);
        assert_relative_eq!(data.images().row(1)[0], 80.0 / 255.0);
    }

    #[test]
    fn test_limit_caps_samples() {
        let (images, labels) = sample_files();
        let data = Dataset::load(images.path(), labels.path(), Some(2)).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.labels(), &[7, 1]);

        let all = load_idx_labels(labels.path(), Some(100)).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_pixels_in_unit_range() {
        let (images, _labels) = sample_files();
        let m = load_idx_images(images.path(), None).unwrap();
        assert!(m.as_slice().iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_swapped_files_fail_on_magic() {
        let (images, labels) = sample_files();
        let result = Dataset::load(labels.path(), images.path(), None);
        assert!(matches!(result, Err(VitError::Format { .. })));
    }

    #[test]
    fn test_truncated_payload() {
        let file = write_idx(&[IDX_IMAGE_MAGIC, 5, 2, 2], &[0; 8]);
        assert!(matches!(
            load_idx_images(file.path(), None),
            Err(VitError::Format { .. })
        ));
    }

    #[test]
    fn test_oversized_header_is_rejected() {
        let file = write_idx(&[IDX_IMAGE_MAGIC, u32::MAX, u32::MAX, u32::MAX], &[]);
        assert!(matches!(
            load_idx_images(file.path(), None),
            Err(VitError::Format { .. })
        ));

        let labels = write_idx(&[IDX_LABEL_MAGIC, u32::MAX], &[1, 2]);
        assert!(matches!(
            load_idx_labels(labels.path(), None),
            Err(VitError::Format { .. })
        ));
    }

    #[test]
    fn test_truncated_header() {
        let file = write_idx(&[IDX_LABEL_MAGIC], &[]);
        assert!(matches!(
            load_idx_labels(file.path(), None),
            Err(VitError::Format { .. })
        ));
    }

    #[test]
    fn test_label_count_mismatch() {
        let pixels = [0u8; 8];
        let images = write_idx(&[IDX_IMAGE_MAGIC, 2, 2, 2], &pixels);
        let labels = write_idx(&[IDX_LABEL_MAGIC, 3], &[0, 1, 2]);
        let result = Dataset::load(images.path(), labels.path(), None);
        assert!(matches!(result, Err(VitError::SizeMismatch { .. })));
    }
}

// ============================================================================
// Batching Tests
// ============================================================================

mod batching_tests {
    use super::*;

    #[test]
    fn test_batch_gathers_rows() {
        let (images, labels) = sample_files();
        let data = Dataset::load(images.path(), labels.path(), None).unwrap();

        let (batch, batch_labels) = data.batch(&[2, 0]).unwrap();
        assert_eq!(batch.shape(), (2, 4));
        assert_eq!(batch_labels, vec![4, 7]);
        assert_eq!(batch.row(0), data.images().row(2));
    }

    #[test]
    fn test_batch_index_out_of_range() {
        let (images, labels) = sample_files();
        let data = Dataset::load(images.path(), labels.path(), None).unwrap();
        assert!(data.batch(&[0, 3]).is_err());
    }

    #[test]
    fn test_head_clamps_count() {
        let (images, labels) = sample_files();
        let data = Dataset::load(images.path(), labels.path(), None).unwrap();
        let (head, head_labels) = data.head(10).unwrap();
        assert_eq!(head.rows(), 3);
        assert_eq!(head_labels.len(), 3);
    }
}

// ============================================================================
// Augmentation Tests
// ============================================================================

mod augmentation_tests {
    use super::*;

    #[test]
    fn test_noise_stays_in_unit_range() {
        let mut rng = SeededRng::new(3);
        let images = Matrix::random(4, 16, 0.0, 1.0, &mut rng);
        let noisy = add_noise(&images, 0.5, &mut rng);
        assert_eq!(noisy.shape(), images.shape());
        assert!(noisy.as_slice().iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert_ne!(noisy, images);
    }

    #[test]
    fn test_zero_noise_is_identity() {
        let mut rng = SeededRng::new(3);
        let images = Matrix::random(2, 5, 0.0, 1.0, &mut rng);
        assert_eq!(add_noise(&images, 0.0, &mut rng), images);
    }

    #[test]
    fn test_normalize_maps_to_symmetric_range() {
        let images = Matrix::from_vec(1, 3, vec![0.0, 0.5, 1.0]).unwrap();
        let normalized = normalize(&images, 0.5, 0.5);
        assert_eq!(normalized.as_slice(), &[-1.0, 0.0, 1.0]);
    }
}
