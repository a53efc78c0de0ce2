//! Read-only distributed adjacency view over a sparse matrix pattern.
//!
//! The view mirrors the split-CSR layout of a row-distributed matrix: a "local"
//! block whose column indices address locally owned vertices, and an optional
//! "remote" block whose column indices address a compact ghost numbering. The
//! `ghost_global_id` array translates ghost-local indices back to global ids for
//! routing, and `ranges` records the contiguous ownership span of every rank.
//!
//! Built once per coloring call and never mutated afterwards.

use crate::error::FcError;
use crate::matrix::CsrMatrix;

pub struct DistributedGraph {
    n_local: usize,
    n_global: usize,
    row_start: Vec<usize>,
    local_cols: Vec<usize>,
    remote_row_start: Vec<usize>,
    remote_cols: Vec<usize>,
    ghost_global_id: Vec<usize>,
    ranges: Vec<usize>,
}

impl DistributedGraph {
    /// Build from a split local/remote CSR pattern.
    ///
    /// `ranges` holds the ownership layout (`ranges[r]..ranges[r+1]` owned by rank
    /// `r`); `remote_row_start`/`remote_cols` index into the ghost numbering defined
    /// by `ghost_global_id`. Pass empty remote arrays for a sequential graph.
    pub fn from_split_csr(
        n_local: usize,
        row_start: Vec<usize>,
        local_cols: Vec<usize>,
        remote_row_start: Vec<usize>,
        remote_cols: Vec<usize>,
        ghost_global_id: Vec<usize>,
        ranges: Vec<usize>,
    ) -> Result<Self, FcError> {
        if row_start.len() != n_local + 1 || row_start.windows(2).any(|w| w[0] > w[1]) {
            return Err(FcError::NonAijFormat("local row_start malformed".into()));
        }
        if *row_start.last().unwrap() != local_cols.len() {
            return Err(FcError::NonAijFormat("local row_start does not cover local_cols".into()));
        }
        if local_cols.iter().any(|&j| j >= n_local) {
            return Err(FcError::NonAijFormat("local column index out of range".into()));
        }
        if !remote_row_start.is_empty() {
            if remote_row_start.len() != n_local + 1 || remote_row_start.windows(2).any(|w| w[0] > w[1]) {
                return Err(FcError::NonAijFormat("remote row_start malformed".into()));
            }
            if *remote_row_start.last().unwrap() != remote_cols.len() {
                return Err(FcError::NonAijFormat("remote row_start does not cover remote_cols".into()));
            }
            if remote_cols.iter().any(|&j| j >= ghost_global_id.len()) {
                return Err(FcError::NonAijFormat("ghost column index out of range".into()));
            }
        } else if !remote_cols.is_empty() || !ghost_global_id.is_empty() {
            return Err(FcError::NonAijFormat("remote block given without remote row_start".into()));
        }
        if ranges.len() < 2 || ranges.windows(2).any(|w| w[0] > w[1]) {
            return Err(FcError::NonAijFormat("ownership ranges malformed".into()));
        }
        let n_global = *ranges.last().unwrap();
        if n_global < n_local {
            return Err(FcError::NonAijFormat("global size smaller than local size".into()));
        }
        Ok(Self {
            n_local,
            n_global,
            row_start,
            local_cols,
            remote_row_start,
            remote_cols,
            ghost_global_id,
            ranges,
        })
    }

    /// Sequential adjacency view over a square CSR pattern (no ghosts).
    pub fn from_matrix<T: Copy>(m: &CsrMatrix<T>) -> Result<Self, FcError> {
        use crate::core::traits::Indexing;
        if m.nrows() != m.ncols() {
            return Err(FcError::NonAijFormat(format!(
                "adjacency requires a square pattern, got {}x{}",
                m.nrows(),
                m.ncols()
            )));
        }
        let n = m.nrows();
        Self::from_split_csr(
            n,
            m.row_ptr().to_vec(),
            m.col_idx().to_vec(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            vec![0, n],
        )
    }

    pub fn n_local(&self) -> usize {
        self.n_local
    }

    pub fn n_global(&self) -> usize {
        self.n_global
    }

    pub fn n_ghost(&self) -> usize {
        self.ghost_global_id.len()
    }

    pub fn ranges(&self) -> &[usize] {
        &self.ranges
    }

    pub fn ghost_global_id(&self) -> &[usize] {
        &self.ghost_global_id
    }

    /// Locally owned neighbors of local vertex `i`.
    pub fn local_neighbors(&self, i: usize) -> &[usize] {
        &self.local_cols[self.row_start[i]..self.row_start[i + 1]]
    }

    /// Ghost-numbered neighbors of local vertex `i`; empty when the graph has no
    /// remote block.
    pub fn remote_neighbors(&self, i: usize) -> &[usize] {
        if self.remote_row_start.is_empty() {
            &[]
        } else {
            &self.remote_cols[self.remote_row_start[i]..self.remote_row_start[i + 1]]
        }
    }

    /// Largest number of neighbors (local plus remote) over the local rows.
    pub fn max_degree(&self) -> usize {
        (0..self.n_local)
            .map(|i| self.local_neighbors(i).len() + self.remote_neighbors(i).len())
            .max()
            .unwrap_or(0)
    }
}
