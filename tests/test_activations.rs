//! Tests for softmax and GELU
//!
//! This file tests:
//! - Row-wise softmax normalization and numerical stability
//! - GELU reference values and shape preservation

use approx::assert_relative_eq;
use rust_vision_transformer::matrix::Matrix;
use rust_vision_transformer::utils::{gelu, gelu_scalar, softmax, softmax_rows_inplace};

// ============================================================================
// Softmax Tests
// ============================================================================

mod softmax_tests {
    use super::*;

    #[test]
    fn test_rows_sum_to_one() {
        let x = Matrix::from_vec(3, 4, vec![
            1.0, 2.0, 3.0, 4.0,
            -1.0, 0.0, 1.0, 2.0,
            0.5, 0.5, 0.5, 0.5,
        ])
        .unwrap();
        let p = softmax(&x);
        for i in 0..3 {
            let sum: f64 = p.row(i).iter().sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
            assert!(p.row(i).iter().all(|&v| v > 0.0 && v <= 1.0));
        }
    }

    #[test]
    fn test_uniform_row() {
        let p = softmax(&Matrix::filled(1, 4, 7.0));
        for &v in p.as_slice() {
            assert_relative_eq!(v, 0.25, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_large_values_are_stable() {
        let x = Matrix::from_vec(1, 3, vec![1000.0, 1001.0, 1002.0]).unwrap();
        let p = softmax(&x);
        assert!(p.as_slice().iter().all(|v| v.is_finite()));
        assert!(p[(0, 2)] > p[(0, 1)] && p[(0, 1)] > p[(0, 0)]);
    }

    #[test]
    fn test_shift_invariance() {
        let a = Matrix::from_vec(1, 3, vec![0.1, 0.2, 0.3]).unwrap();
        let b = a.map(|v| v + 50.0);
        let (pa, pb) = (softmax(&a), softmax(&b));
        for j in 0..3 {
            assert_relative_eq!(pa[(0, j)], pb[(0, j)], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_inplace_on_slice() {
        let mut data = vec![0.0, 0.0, 1.0, 1.0];
        softmax_rows_inplace(&mut data, 2, 2);
        assert_eq!(data, vec![0.5, 0.5, 0.5, 0.5]);
    }
}

// ============================================================================
// GELU Tests
// ============================================================================

mod gelu_tests {
    use super::*;

    #[test]
    fn test_reference_values() {
        assert_eq!(gelu_scalar(0.0), 0.0);
        assert_relative_eq!(gelu_scalar(1.0), 0.841192, epsilon = 1e-5);
        assert_relative_eq!(gelu_scalar(-1.0), -0.158808, epsilon = 1e-5);
    }

    #[test]
    fn test_asymptotes() {
        assert_relative_eq!(gelu_scalar(10.0), 10.0, epsilon = 1e-9);
        assert!(gelu_scalar(-10.0).abs() < 1e-9);
    }

    #[test]
    fn test_shape_preserved() {
        let x = Matrix::filled(3, 5, 0.3);
        let y = gelu(&x);
        assert_eq!(y.shape(), (3, 5));
        assert_relative_eq!(y[(2, 4)], gelu_scalar(0.3));
    }
}
