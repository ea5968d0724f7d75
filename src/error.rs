//! Error type shared by every module of the crate
//!
//! All fallible operations return [`Result`], so failures propagate to the caller
//! with `?` and abort the current forward pass, training step or file operation.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The result type used throughout the crate.
pub type Result<T> = std::result::Result<T, VitError>;

/// Errors produced by the numeric engine, the model and its collaborators.
#[derive(Debug, Error)]
pub enum VitError {
    /// A model or training configuration is invalid (e.g. `embed_dim % num_heads != 0`).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Two matrices have incompatible shapes for `op`.
    #[error("shape mismatch in {op}: left is {}x{}, right is {}x{}", left.0, left.1, right.0, right.1)]
    Shape {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    /// A length invariant was violated (e.g. one label per batch row).
    #[error("size mismatch for {what}: got {got}, expected {expected}")]
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },

    /// A class label outside `0..num_classes`.
    #[error("label {label} out of range for {num_classes} classes")]
    InvalidLabel { label: usize, num_classes: usize },

    /// An operation that averages over the batch received zero rows.
    #[error("batch is empty")]
    EmptyBatch,

    /// A file could not be opened, read or written.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A file was readable but its contents are not in the expected format.
    #[error("malformed {what}: {reason}")]
    Format { what: &'static str, reason: String },

    /// A JSON configuration could not be parsed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl VitError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        VitError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn format(what: &'static str, reason: impl Into<String>) -> Self {
        VitError::Format {
            what,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_error_message() {
        let err = VitError::Shape {
            op: "matmul",
            left: (2, 3),
            right: (4, 5),
        };
        assert_eq!(
            err.to_string(),
            "shape mismatch in matmul: left is 2x3, right is 4x5"
        );
    }

    #[test]
    fn test_io_error_keeps_path() {
        let err = VitError::io("missing.idx", io::Error::from(io::ErrorKind::NotFound));
        assert!(err.to_string().contains("missing.idx"));
    }
}
