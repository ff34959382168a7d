//! Logical grid shape of a model.

use core::fmt;

use mf_core::{MfError, MfResult};

/// Dimensions of a model's dense grid, outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridShape {
    dims: Vec<usize>,
}

impl GridShape {
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Total number of dense nodes.
    pub fn size(&self) -> usize {
        self.dims.iter().product()
    }

    /// Split a dense index into per-dimension coordinates (row-major).
    pub fn unravel(&self, dense: usize) -> MfResult<Vec<usize>> {
        let size = self.size();
        if dense >= size {
            return Err(MfError::IndexOutOfRange {
                what: "dense node",
                index: dense,
                len: size,
            });
        }
        let mut coords = vec![0; self.dims.len()];
        let mut rem = dense;
        for (slot, &dim) in coords.iter_mut().zip(&self.dims).rev() {
            *slot = rem % dim;
            rem /= dim;
        }
        Ok(coords)
    }

    /// Collapse coordinates into a dense index (row-major).
    pub fn ravel(&self, coords: &[usize]) -> MfResult<usize> {
        if coords.len() != self.dims.len() {
            return Err(MfError::IndexOutOfRange {
                what: "coordinate rank",
                index: coords.len(),
                len: self.dims.len(),
            });
        }
        let mut dense = 0;
        for (&c, &dim) in coords.iter().zip(&self.dims) {
            if c >= dim {
                return Err(MfError::IndexOutOfRange {
                    what: "grid coordinate",
                    index: c,
                    len: dim,
                });
            }
            dense = dense * dim + c;
        }
        Ok(dense)
    }
}

impl fmt::Display for GridShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, ")")
    }
}
