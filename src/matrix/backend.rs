//! Matmul backends
//!
//! Model code never multiplies matrices directly; it asks a [`Device`] to do it.
//! The CPU backend runs [`Matrix::matmul`]. With the `blas` cargo feature an
//! alternate backend copies operands into contiguous buffers and calls `dgemm`.
//! Both honour the same contract: `a.cols == b.rows` or a shape error, and the
//! result is a fresh host matrix.

use super::Matrix;
use crate::error::{Result, VitError};

/// Contract shared by every matmul backend.
///
/// `to_device` / `to_host` move data between host matrices and the backend's own
/// buffer type; `matmul_device` multiplies two device buffers. At most one
/// device operation is in flight at a time.
pub trait MatrixBackend {
    /// Backend-owned storage for an operand or result.
    type Buffer;

    fn name(&self) -> &'static str;

    fn to_device(&self, host: &Matrix) -> Result<Self::Buffer>;

    fn to_host(&self, buffer: &Self::Buffer) -> Result<Matrix>;

    fn matmul_device(&self, a: &Self::Buffer, b: &Self::Buffer) -> Result<Self::Buffer>;

    /// Host-to-host product through the device.
    fn matmul(&self, a: &Matrix, b: &Matrix) -> Result<Matrix> {
        let a = self.to_device(a)?;
        let b = self.to_device(b)?;
        let c = self.matmul_device(&a, &b)?;
        self.to_host(&c)
    }
}

/// Reference backend: host memory and the triple-loop product.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBackend;

impl MatrixBackend for CpuBackend {
    type Buffer = Matrix;

    fn name(&self) -> &'static str {
        "cpu"
    }

    fn to_device(&self, host: &Matrix) -> Result<Matrix> {
        Ok(host.clone())
    }

    fn to_host(&self, buffer: &Matrix) -> Result<Matrix> {
        Ok(buffer.clone())
    }

    fn matmul_device(&self, a: &Matrix, b: &Matrix) -> Result<Matrix> {
        a.matmul(b)
    }

    // Host matrices already are device buffers; skip the copies.
    fn matmul(&self, a: &Matrix, b: &Matrix) -> Result<Matrix> {
        a.matmul(b)
    }
}

#[cfg(feature = "blas")]
pub use blas_backend::{BlasBackend, BlasBuffer};

#[cfg(feature = "blas")]
mod blas_backend {
    extern crate blas_src;

    use super::{Matrix, MatrixBackend};
    use crate::error::{Result, VitError};
    use cblas::{dgemm, Layout, Transpose};

    /// Contiguous row-major operand handed to BLAS.
    #[derive(Debug, Clone)]
    pub struct BlasBuffer {
        rows: usize,
        cols: usize,
        data: Vec<f64>,
    }

    /// `dgemm`-backed product on host BLAS.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct BlasBackend;

    impl MatrixBackend for BlasBackend {
        type Buffer = BlasBuffer;

        fn name(&self) -> &'static str {
            "blas"
        }

        fn to_device(&self, host: &Matrix) -> Result<BlasBuffer> {
            Ok(BlasBuffer {
                rows: host.rows(),
                cols: host.cols(),
                data: host.as_slice().to_vec(),
            })
        }

        fn to_host(&self, buffer: &BlasBuffer) -> Result<Matrix> {
            Matrix::from_vec(buffer.rows, buffer.cols, buffer.data.clone())
        }

        fn matmul_device(&self, a: &BlasBuffer, b: &BlasBuffer) -> Result<BlasBuffer> {
            if a.cols != b.rows {
                return Err(VitError::Shape {
                    op: "matmul",
                    left: (a.rows, a.cols),
                    right: (b.rows, b.cols),
                });
            }
            let (m, n, k) = (a.rows, b.cols, a.cols);
            let mut c = vec![0.0f64; m * n];
            if m > 0 && n > 0 && k > 0 {
                // SAFETY: buffer lengths match the row-major strides passed to dgemm.
                unsafe {
                    dgemm(
                        Layout::RowMajor,
                        Transpose::None,
                        Transpose::None,
                        m as i32,
                        n as i32,
                        k as i32,
                        1.0,
                        &a.data,
                        k as i32,
                        &b.data,
                        n as i32,
                        0.0,
                        &mut c,
                        n as i32,
                    );
                }
            }
            Ok(BlasBuffer {
                rows: m,
                cols: n,
                data: c,
            })
        }
    }
}

/// Backend selected at configuration time and threaded through every forward pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Device {
    #[default]
    Cpu,
    #[cfg(feature = "blas")]
    Blas,
}

impl Device {
    /// Pick the accelerated backend when asked for and compiled in, the CPU otherwise.
    pub fn select(use_accelerator: bool) -> Device {
        if !use_accelerator {
            return Device::Cpu;
        }
        #[cfg(feature = "blas")]
        {
            Device::Blas
        }
        #[cfg(not(feature = "blas"))]
        {
            log::warn!("accelerator requested but the `blas` feature is not enabled; using cpu");
            Device::Cpu
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Device::Cpu => CpuBackend.name(),
            #[cfg(feature = "blas")]
            Device::Blas => BlasBackend.name(),
        }
    }

    pub fn matmul(&self, a: &Matrix, b: &Matrix) -> Result<Matrix> {
        match self {
            Device::Cpu => CpuBackend.matmul(a, b),
            #[cfg(feature = "blas")]
            Device::Blas => BlasBackend.matmul(a, b),
        }
    }

    /// `a · bᵀ` without the caller materialising the transpose.
    pub fn matmul_transposed(&self, a: &Matrix, b: &Matrix) -> Result<Matrix> {
        if a.cols() != b.cols() {
            return Err(VitError::Shape {
                op: "matmul_transposed",
                left: a.shape(),
                right: b.shape(),
            });
        }
        self.matmul(a, &b.transpose())
    }
}
