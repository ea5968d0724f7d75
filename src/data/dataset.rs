//! IDX dataset loading
//!
//! The IDX format (used by MNIST and Fashion-MNIST) stores big-endian `u32`
//! header fields followed by raw `u8` payload:
//!
//! ```text
//! images: magic=2051, count, rows, cols, count*rows*cols pixels
//! labels: magic=2049, count, count labels
//! ```
//!
//! Pixels are scaled to [0, 1] by dividing by 255.

use std::fs;
use std::path::Path;

use crate::error::{Result, VitError};
use crate::matrix::Matrix;

pub const IDX_IMAGE_MAGIC: u32 = 2051;
pub const IDX_LABEL_MAGIC: u32 = 2049;

// Read a big-endian u32 and advance the byte offset.
fn read_be_u32(data: &[u8], offset: &mut usize, what: &'static str) -> Result<u32> {
    let bytes = data
        .get(*offset..*offset + 4)
        .ok_or_else(|| VitError::format(what, "header is truncated"))?;
    *offset += 4;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn check_magic(found: u32, expected: u32, what: &'static str) -> Result<()> {
    if found != expected {
        return Err(VitError::format(
            what,
            format!("bad magic number {found}, expected {expected}"),
        ));
    }
    Ok(())
}

/// Decode an IDX image file already in memory.
///
/// Returns `[count, rows * cols]` with pixels in [0, 1]. `limit` caps the
/// number of images read.
pub fn parse_idx_images(data: &[u8], limit: Option<usize>) -> Result<Matrix> {
    const WHAT: &str = "IDX image file";
    let mut offset = 0usize;
    check_magic(read_be_u32(data, &mut offset, WHAT)?, IDX_IMAGE_MAGIC, WHAT)?;
    let total_images = read_be_u32(data, &mut offset, WHAT)? as usize;
    let rows = read_be_u32(data, &mut offset, WHAT)? as usize;
    let cols = read_be_u32(data, &mut offset, WHAT)? as usize;

    let count = limit.map_or(total_images, |l| l.min(total_images));
    let (image_size, end) = rows
        .checked_mul(cols)
        .and_then(|size| Some((size, count.checked_mul(size)?.checked_add(offset)?)))
        .ok_or_else(|| VitError::format(WHAT, "header sizes overflow"))?;

    let pixels = data.get(offset..end).ok_or_else(|| {
        VitError::format(
            WHAT,
            format!("payload is truncated ({count} images of {rows}x{cols})"),
        )
    })?;

    let values = pixels.iter().map(|&px| f64::from(px) / 255.0).collect();
    Matrix::from_vec(count, image_size, values)
}

/// Decode an IDX label file already in memory.
pub fn parse_idx_labels(data: &[u8], limit: Option<usize>) -> Result<Vec<usize>> {
    const WHAT: &str = "IDX label file";
    let mut offset = 0usize;
    check_magic(read_be_u32(data, &mut offset, WHAT)?, IDX_LABEL_MAGIC, WHAT)?;
    let total_labels = read_be_u32(data, &mut offset, WHAT)? as usize;
    let count = limit.map_or(total_labels, |l| l.min(total_labels));

    let end = offset
        .checked_add(count)
        .ok_or_else(|| VitError::format(WHAT, "header sizes overflow"))?;
    let labels = data
        .get(offset..end)
        .ok_or_else(|| VitError::format(WHAT, format!("payload is truncated ({count} labels)")))?;
    Ok(labels.iter().map(|&l| usize::from(l)).collect())
}

/// Read IDX images from `path`.
pub fn load_idx_images(path: impl AsRef<Path>, limit: Option<usize>) -> Result<Matrix> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|e| VitError::io(path, e))?;
    parse_idx_images(&data, limit)
}

/// Read IDX labels from `path`.
pub fn load_idx_labels(path: impl AsRef<Path>, limit: Option<usize>) -> Result<Vec<usize>> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|e| VitError::io(path, e))?;
    parse_idx_labels(&data, limit)
}

/// Images paired with their labels, one row per sample.
#[derive(Debug, Clone)]
pub struct Dataset {
    images: Matrix,
    labels: Vec<usize>,
}

impl Dataset {
    /// # Errors
    ///
    /// [`VitError::SizeMismatch`] when the label count differs from the image count.
    pub fn new(images: Matrix, labels: Vec<usize>) -> Result<Self> {
        if images.rows() != labels.len() {
            return Err(VitError::SizeMismatch {
                what: "labels",
                got: labels.len(),
                expected: images.rows(),
            });
        }
        Ok(Self { images, labels })
    }

    /// Load an image file and its label file, keeping at most `limit` samples.
    pub fn load(
        images_path: impl AsRef<Path>,
        labels_path: impl AsRef<Path>,
        limit: Option<usize>,
    ) -> Result<Self> {
        let images = load_idx_images(images_path, limit)?;
        let labels = load_idx_labels(labels_path, limit)?;
        Self::new(images, labels)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn images(&self) -> &Matrix {
        &self.images
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Pixels per sample.
    pub fn input_dim(&self) -> usize {
        self.images.cols()
    }

    /// Copy the samples at `indices` into a contiguous batch.
    ///
    /// # Errors
    ///
    /// [`VitError::SizeMismatch`] if an index is out of range.
    pub fn batch(&self, indices: &[usize]) -> Result<(Matrix, Vec<usize>)> {
        let mut images = Matrix::zeros(indices.len(), self.input_dim());
        let mut labels = Vec::with_capacity(indices.len());
        for (dst, &src) in indices.iter().enumerate() {
            if src >= self.len() {
                return Err(VitError::SizeMismatch {
                    what: "sample index",
                    got: src,
                    expected: self.len(),
                });
            }
            images.row_mut(dst).copy_from_slice(self.images.row(src));
            labels.push(self.labels[src]);
        }
        Ok((images, labels))
    }

    /// The first `count` samples (or all of them if fewer).
    pub fn head(&self, count: usize) -> Result<(Matrix, Vec<usize>)> {
        let count = count.min(self.len());
        let images = self.images.row_block(0, count)?;
        Ok((images, self.labels[..count].to_vec()))
    }

    /// Apply `f` to every pixel in place (e.g. normalization done once up front).
    pub fn map_images(&mut self, f: impl Fn(f64) -> f64) {
        for value in self.images.as_mut_slice() {
            *value = f(*value);
        }
    }
}
