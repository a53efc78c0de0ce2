//! Compressed sparse row matrix.
//!
//! Owns the classic `row_ptr` / `col_idx` / `values` triplet. Doubles as the
//! ingestion source for [`crate::graph::DistributedGraph`], which only needs the
//! symbolic pattern, and as a `MatVec` operator for the solvers.

use crate::core::traits::{Indexing, MatVec};
use crate::error::FcError;
use num_traits::Float;

pub struct CsrMatrix<T> {
    nrows: usize,
    ncols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<T>,
}

impl<T: Copy> CsrMatrix<T> {
    /// Build a CSR matrix from raw row-ptr, col-idx, and values, validating the
    /// compressed-row invariants.
    pub fn from_csr(
        nrows: usize,
        ncols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Result<Self, FcError> {
        if row_ptr.len() != nrows + 1 {
            return Err(FcError::NonAijFormat(format!(
                "row_ptr has length {}, expected {}",
                row_ptr.len(),
                nrows + 1
            )));
        }
        if row_ptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(FcError::NonAijFormat("row_ptr must be non-decreasing".into()));
        }
        if *row_ptr.last().unwrap() != col_idx.len() || col_idx.len() != values.len() {
            return Err(FcError::NonAijFormat(format!(
                "row_ptr ends at {} but {} column indices / {} values given",
                row_ptr.last().unwrap(),
                col_idx.len(),
                values.len()
            )));
        }
        if col_idx.iter().any(|&j| j >= ncols) {
            return Err(FcError::NonAijFormat("column index out of range".into()));
        }
        Ok(Self { nrows, ncols, row_ptr, col_idx, values })
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    pub fn col_idx(&self) -> &[usize] {
        &self.col_idx
    }

    /// Column indices of row `i`.
    pub fn row_cols(&self, i: usize) -> &[usize] {
        &self.col_idx[self.row_ptr[i]..self.row_ptr[i + 1]]
    }
}

impl<T: Float> CsrMatrix<T> {
    /// y = A * x over the stored pattern.
    pub fn spmv(&self, x: &[T], y: &mut [T]) {
        assert_eq!(x.len(), self.ncols);
        assert_eq!(y.len(), self.nrows);
        for i in 0..self.nrows {
            let mut sum = T::zero();
            for k in self.row_ptr[i]..self.row_ptr[i + 1] {
                sum = sum + self.values[k] * x[self.col_idx[k]];
            }
            y[i] = sum;
        }
    }
}

impl<T: Float> MatVec<Vec<T>> for CsrMatrix<T> {
    fn matvec(&self, x: &Vec<T>, y: &mut Vec<T>) {
        self.spmv(x, y);
    }
}

impl<T> Indexing for CsrMatrix<T> {
    fn nrows(&self) -> usize {
        self.nrows
    }
}
