//! Tests for the transformer building blocks
//!
//! This file tests:
//! - DenseLayer forward math and parameter layout
//! - LayerNorm statistics and the constant-row edge case
//! - PatchEmbedding patch extraction and output shapes
//! - PositionalEncoding bounds
//! - FeedForward and TransformerBlock shape preservation

use approx::assert_relative_eq;
use rust_vision_transformer::error::VitError;
use rust_vision_transformer::layers::{
    DenseLayer, FeedForward, Initializer, Layer, LayerNorm, PatchEmbedding, PositionalEncoding,
    TransformerBlock,
};
use rust_vision_transformer::matrix::{Device, Matrix};

// ============================================================================
// DenseLayer Tests
// ============================================================================

mod dense_tests {
    use super::*;

    #[test]
    fn test_forward_with_known_weights() {
        let mut init = Initializer::new(0);
        let mut layer = DenseLayer::new(2, 2, &mut init);
        {
            let mut params = layer.parameters_mut();
            params[0].1.assign(&Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap()).unwrap();
            params[1].1.assign(&Matrix::from_vec(1, 2, vec![0.5, -0.5]).unwrap()).unwrap();
        }

        let input = Matrix::from_vec(1, 2, vec![1.0, 1.0]).unwrap();
        let output = layer.forward(&input, Device::Cpu).unwrap();
        assert_eq!(output.as_slice(), &[4.5, 5.5]);
    }

    #[test]
    fn test_initialization_bounds() {
        let mut init = Initializer::new(0);
        let layer = DenseLayer::new(8, 4, &mut init);
        let limit = (2.0_f64 / 8.0).sqrt();
        assert!(layer.weights().value().as_slice().iter().all(|w| w.abs() <= limit));
        assert!(layer.biases().value().as_slice().iter().all(|&b| b == 0.0));
        assert_eq!(layer.parameter_count(), 8 * 4 + 4);
    }

    #[test]
    fn test_rejects_wrong_width() {
        let mut init = Initializer::new(0);
        let layer = DenseLayer::new(3, 2, &mut init);
        assert!(layer.forward(&Matrix::zeros(1, 4), Device::Cpu).is_err());
    }
}

// ============================================================================
// LayerNorm Tests
// ============================================================================

mod layer_norm_tests {
    use super::*;

    #[test]
    fn test_rows_are_standardized() {
        let mut init = Initializer::new(0);
        let norm = LayerNorm::new(4, &mut init);
        let input = Matrix::from_vec(2, 4, vec![1.0, 2.0, 3.0, 4.0, -5.0, 0.0, 5.0, 10.0]).unwrap();
        let output = norm.forward(&input, Device::Cpu).unwrap();

        for i in 0..2 {
            let row = output.row(i);
            let mean = row.iter().sum::<f64>() / 4.0;
            let var = row.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / 4.0;
            assert_relative_eq!(mean, 0.0, epsilon = 1e-12);
            assert_relative_eq!(var, 1.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_constant_row_maps_to_beta() {
        let mut init = Initializer::new(0);
        let mut norm = LayerNorm::new(3, &mut init);
        norm.beta_mut()
            .assign(&Matrix::from_vec(1, 3, vec![0.1, 0.2, 0.3]).unwrap())
            .unwrap();

        let output = norm.forward(&Matrix::filled(2, 3, 9.0), Device::Cpu).unwrap();
        assert_eq!(output.row(0), &[0.1, 0.2, 0.3]);
        assert_eq!(output.row(1), &[0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_shape_mismatch() {
        let mut init = Initializer::new(0);
        let norm = LayerNorm::new(3, &mut init);
        assert!(matches!(
            norm.forward(&Matrix::zeros(2, 4), Device::Cpu),
            Err(VitError::Shape { op: "layer_norm", .. })
        ));
    }
}

// ============================================================================
// PatchEmbedding Tests
// ============================================================================

mod patch_embedding_tests {
    use super::*;

    #[test]
    fn test_8x8_image_with_4x4_patches() {
        let mut init = Initializer::new(0);
        let embed = PatchEmbedding::new(4, 6, &mut init);
        let images = Matrix::from_vec(1, 64, (0..64).map(|x| x as f64).collect()).unwrap();

        let patches = embed.extract_patches(&images).unwrap();
        assert_eq!(patches.shape(), (4, 16));
        assert_eq!(embed.num_patches(8), 4);
        // top-right patch starts at column 4 of row 0
        assert_eq!(&patches.row(1)[..4], &[4.0, 5.0, 6.0, 7.0]);
        // bottom-left patch starts at row 4
        assert_eq!(patches.row(2)[0], 32.0);
    }

    #[test]
    fn test_forward_shape_for_batch() {
        let mut init = Initializer::new(0);
        let embed = PatchEmbedding::new(4, 6, &mut init);
        let output = embed.forward(&Matrix::filled(3, 64, 0.5), Device::Cpu).unwrap();
        assert_eq!(output.shape(), (3 * 4, 6));
    }

    #[test]
    fn test_zero_image_gives_bias() {
        let mut init = Initializer::new(0);
        let embed = PatchEmbedding::new(2, 3, &mut init);
        let output = embed.forward(&Matrix::zeros(1, 16), Device::Cpu).unwrap();
        assert!(output.as_slice().iter().all(|&v| v == 0.0));
    }
}

// ============================================================================
// PositionalEncoding Tests
// ============================================================================

mod positional_encoding_tests {
    use super::*;

    #[test]
    fn test_shorter_sequence_uses_leading_rows() {
        let mut init = Initializer::new(0);
        let pos = PositionalEncoding::new(10, 4, &mut init);
        let output = pos.forward(&Matrix::filled(3, 4, 1.0), Device::Cpu).unwrap();
        assert_eq!(output.shape(), (3, 4));
        assert_relative_eq!(output[(2, 3)], 1.0 + pos.table().value()[(2, 3)]);
    }

    #[test]
    fn test_wrong_width_rejected() {
        let mut init = Initializer::new(0);
        let pos = PositionalEncoding::new(10, 4, &mut init);
        assert!(pos.forward(&Matrix::zeros(3, 5), Device::Cpu).is_err());
    }
}

// ============================================================================
// FeedForward And TransformerBlock Tests
// ============================================================================

mod block_tests {
    use super::*;

    #[test]
    fn test_feed_forward_preserves_shape() {
        let mut init = Initializer::new(1);
        let ff = FeedForward::new(8, 32, &mut init);
        let output = ff.forward(&Matrix::filled(5, 8, -0.2), Device::Cpu).unwrap();
        assert_eq!(output.shape(), (5, 8));
    }

    #[test]
    fn test_transformer_block_preserves_shape() {
        let mut init = Initializer::new(1);
        let block = TransformerBlock::new(8, 2, 16, &mut init).unwrap();
        let input = Matrix::random(17, 8, -1.0, 1.0, init.rng_mut());
        let output = block.forward(&input, Device::Cpu).unwrap();
        assert_eq!(output.shape(), (17, 8));
        assert!(output.as_slice().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_transformer_block_parameter_names() {
        let mut init = Initializer::new(1);
        let block = TransformerBlock::new(4, 1, 8, &mut init).unwrap();
        let names: Vec<String> = block.parameters().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names.first().map(String::as_str), Some("norm1.gamma"));
        assert!(names.contains(&"attention.w_q".to_string()));
        assert_eq!(names.last().map(String::as_str), Some("feed_forward.fc2.bias"));
    }

    #[test]
    fn test_handles_are_unique_across_block() {
        let mut init = Initializer::new(1);
        let block = TransformerBlock::new(4, 2, 8, &mut init).unwrap();
        let mut handles: Vec<usize> = block
            .parameters()
            .iter()
            .map(|(_, p)| p.handle().index())
            .collect();
        let count = handles.len();
        handles.dedup();
        assert_eq!(handles.len(), count);
        assert_eq!(init.issued(), count);
    }
}
