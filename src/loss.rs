//! Softmax cross-entropy loss and classification accuracy
//!
//! Logits are raw head outputs `[batch, num_classes]`; the softmax is applied
//! here, row by row, so callers never normalize before passing them in.

use crate::error::{Result, VitError};
use crate::matrix::Matrix;
use crate::utils::softmax;

/// Lower clamp on the true-class probability before taking the log.
pub const PROBABILITY_FLOOR: f64 = 1e-15;

fn check_labels(logits: &Matrix, labels: &[usize]) -> Result<()> {
    if logits.rows() == 0 {
        return Err(VitError::EmptyBatch);
    }
    if labels.len() != logits.rows() {
        return Err(VitError::SizeMismatch {
            what: "labels",
            got: labels.len(),
            expected: logits.rows(),
        });
    }
    if let Some(&label) = labels.iter().find(|&&label| label >= logits.cols()) {
        return Err(VitError::InvalidLabel {
            label,
            num_classes: logits.cols(),
        });
    }
    Ok(())
}

/// Mean negative log-likelihood of the true classes.
///
/// `-mean(ln(max(softmax(logits)[i, labels[i]], 1e-15)))`, always `>= 0`.
///
/// # Errors
///
/// [`VitError::EmptyBatch`] for zero rows, [`VitError::SizeMismatch`] when the
/// label count differs from the row count, [`VitError::InvalidLabel`] for a
/// label `>= num_classes`.
pub fn cross_entropy_loss(logits: &Matrix, labels: &[usize]) -> Result<f64> {
    check_labels(logits, labels)?;
    let probs = softmax(logits);

    let total: f64 = labels
        .iter()
        .enumerate()
        .map(|(i, &label)| -probs[(i, label)].max(PROBABILITY_FLOOR).ln())
        .sum();
    Ok(total / logits.rows() as f64)
}

/// Gradient of [`cross_entropy_loss`] with respect to the logits.
///
/// `(softmax(logits) - one_hot(labels)) / batch`; each row sums to zero.
pub fn cross_entropy_gradient(logits: &Matrix, labels: &[usize]) -> Result<Matrix> {
    check_labels(logits, labels)?;
    let mut grad = softmax(logits);
    for (i, &label) in labels.iter().enumerate() {
        grad[(i, label)] -= 1.0;
    }
    grad.scale_inplace(1.0 / logits.rows() as f64);
    Ok(grad)
}

/// Fraction of `predictions` equal to `labels`.
pub fn accuracy(predictions: &[usize], labels: &[usize]) -> Result<f64> {
    if labels.is_empty() {
        return Err(VitError::EmptyBatch);
    }
    if predictions.len() != labels.len() {
        return Err(VitError::SizeMismatch {
            what: "predictions",
            got: predictions.len(),
            expected: labels.len(),
        });
    }
    let correct = predictions
        .iter()
        .zip(labels)
        .filter(|(p, l)| p == l)
        .count();
    Ok(correct as f64 / labels.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_uniform_logits_loss_is_ln_classes() {
        let logits = Matrix::zeros(2, 4);
        let loss = cross_entropy_loss(&logits, &[0, 3]).unwrap();
        assert_relative_eq!(loss, 4.0_f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_confident_wrong_prediction_is_clamped() {
        let logits = Matrix::from_vec(1, 2, vec![0.0, 2000.0]).unwrap();
        let loss = cross_entropy_loss(&logits, &[0]).unwrap();
        assert_relative_eq!(loss, -PROBABILITY_FLOOR.ln(), epsilon = 1e-9);
    }

    #[test]
    fn test_gradient_rows_sum_to_zero() {
        let logits = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, -1.0, 0.0, 4.0]).unwrap();
        let grad = cross_entropy_gradient(&logits, &[2, 0]).unwrap();
        for i in 0..2 {
            let sum: f64 = grad.row(i).iter().sum();
            assert!(sum.abs() < 1e-12);
        }
        assert!(grad[(0, 2)] < 0.0);
        assert!(grad[(1, 0)] < 0.0);
    }

    #[test]
    fn test_label_validation() {
        let logits = Matrix::zeros(2, 3);
        assert!(matches!(
            cross_entropy_loss(&logits, &[0, 3]),
            Err(VitError::InvalidLabel { label: 3, num_classes: 3 })
        ));
        assert!(matches!(
            cross_entropy_loss(&logits, &[0]),
            Err(VitError::SizeMismatch { .. })
        ));
        assert!(matches!(
            cross_entropy_gradient(&Matrix::zeros(0, 3), &[]),
            Err(VitError::EmptyBatch)
        ));
    }

    #[test]
    fn test_accuracy() {
        assert_relative_eq!(accuracy(&[1, 2, 3, 4], &[1, 0, 3, 0]).unwrap(), 0.5);
        assert!(accuracy(&[], &[]).is_err());
    }
}
