//! Trainable parameters and their stable identities
//!
//! Optimizer state (Adam moments) is keyed by a parameter's [`ParamHandle`], an
//! integer issued once by the [`Initializer`] when the owning layer is built.
//! The handle never changes while the parameter's values are updated in place,
//! so moving or re-borrowing a layer never disconnects it from its optimizer
//! state. `Parameter` is deliberately not `Clone`: a copy would share the handle.

use crate::error::Result;
use crate::matrix::Matrix;
use crate::utils::SeededRng;

/// Integer identity of a trainable parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamHandle(usize);

impl ParamHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A weight matrix tied to a [`ParamHandle`].
#[derive(Debug)]
pub struct Parameter {
    handle: ParamHandle,
    value: Matrix,
}

impl Parameter {
    pub fn handle(&self) -> ParamHandle {
        self.handle
    }

    pub fn value(&self) -> &Matrix {
        &self.value
    }

    /// Mutable access to the values. The shape must not change.
    pub fn value_mut(&mut self) -> &mut Matrix {
        &mut self.value
    }

    pub fn shape(&self) -> (usize, usize) {
        self.value.shape()
    }

    /// Number of scalar weights.
    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Overwrite the values in place (shape-checked), keeping the handle.
    pub fn assign(&mut self, values: &Matrix) -> Result<()> {
        self.value.copy_from(values)
    }
}

/// Seeded random source plus handle allocator, threaded through model construction.
///
/// Building the same architecture twice from `Initializer::new(seed)` yields
/// bit-identical weights and the same handle numbering.
pub struct Initializer {
    rng: SeededRng,
    next_handle: usize,
}

impl Initializer {
    pub fn new(seed: u64) -> Self {
        Self::from_rng(SeededRng::new(seed))
    }

    pub fn from_rng(rng: SeededRng) -> Self {
        Self {
            rng,
            next_handle: 0,
        }
    }

    pub fn rng_mut(&mut self) -> &mut SeededRng {
        &mut self.rng
    }

    /// Give back the random source, e.g. to keep using it for shuffling.
    pub fn into_rng(self) -> SeededRng {
        self.rng
    }

    /// Number of handles issued so far.
    pub fn issued(&self) -> usize {
        self.next_handle
    }

    /// Wrap `value` in a parameter with a fresh handle.
    pub fn register(&mut self, value: Matrix) -> Parameter {
        let handle = ParamHandle(self.next_handle);
        self.next_handle += 1;
        Parameter { handle, value }
    }

    /// Uniform fill in `[-limit, limit)`.
    pub fn uniform(&mut self, rows: usize, cols: usize, limit: f64) -> Parameter {
        let value = Matrix::random(rows, cols, -limit, limit, &mut self.rng);
        self.register(value)
    }

    pub fn zeros(&mut self, rows: usize, cols: usize) -> Parameter {
        self.register(Matrix::zeros(rows, cols))
    }

    pub fn ones(&mut self, rows: usize, cols: usize) -> Parameter {
        self.register(Matrix::filled(rows, cols, 1.0))
    }
}
