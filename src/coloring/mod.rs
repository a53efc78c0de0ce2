//! Parallel graph coloring engines.
//!
//! Two algorithms over a [`crate::graph::DistributedGraph`]: greedy coloring with
//! conflict correction ([`GreedyColoring`]) and Jones-Plassmann ([`JonesPlassmann`]).
//! Both proceed in rounds of local work plus ghost exchange, with termination driven
//! by a global all-reduced count so every rank executes the same number of
//! collective calls.
//!
//! Parallel ties are broken by vertex weight; callers must supply weights that are
//! globally unique, otherwise the tie-break between equal-weight vertices on
//! different ranks is undefined.

use crate::error::FcError;

pub mod greedy;
pub mod jp;

pub use greedy::GreedyColoring;
pub use jp::JonesPlassmann;

/// A finished color assignment for the locally owned vertices.
///
/// Entries are color ids in `[0, max_colors)`; the value `max_colors` is the
/// "unassigned" sentinel and never appears in a successfully returned assignment.
#[derive(Debug, Clone)]
pub struct ColorAssignment {
    colors: Vec<usize>,
    max_colors: usize,
}

impl ColorAssignment {
    pub(crate) fn from_raw(colors: Vec<usize>, max_colors: usize) -> Self {
        Self { colors, max_colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// The sentinel value marking an unassigned vertex.
    pub fn unassigned(&self) -> usize {
        self.max_colors
    }

    pub fn color(&self, i: usize) -> usize {
        self.colors[i]
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.colors
    }

    /// Largest locally assigned color id, if any vertex is assigned.
    pub fn max_color(&self) -> Option<usize> {
        self.colors.iter().copied().filter(|&c| c != self.max_colors).max()
    }

    /// Number of distinct colors in use locally (`max_color + 1`).
    pub fn n_colors(&self) -> usize {
        self.max_color().map_or(0, |c| c + 1)
    }
}

/// Sparse "lowest unused color" probe.
///
/// `mask[color]` holds the id of the vertex that most recently saw `color` among
/// its neighbors, so the buffer never needs zeroing between vertices; stale stamps
/// from other vertices simply don't match. Doubles in size on overflow and is
/// reused across all vertices of a coloring round.
pub struct ConflictMask {
    mask: Vec<usize>,
}

const UNSTAMPED: usize = usize::MAX;

impl ConflictMask {
    pub fn with_capacity(cap: usize) -> Self {
        Self { mask: vec![UNSTAMPED; cap.max(1)] }
    }

    /// Record that `vertex` has a neighbor colored `color`.
    pub fn stamp(&mut self, color: usize, vertex: usize) {
        if color >= self.mask.len() {
            let mut newlen = self.mask.len() * 2;
            while color >= newlen {
                newlen *= 2;
            }
            self.mask.resize(newlen, UNSTAMPED);
        }
        self.mask[color] = vertex;
    }

    /// Smallest color not stamped for `vertex`.
    pub fn lowest_clear(&self, vertex: usize) -> usize {
        self.mask
            .iter()
            .position(|&s| s != vertex)
            .unwrap_or(self.mask.len())
    }
}

/// Per-vertex lists of colors known to conflict, kept across retry rounds of the
/// distance-2 greedy engine. Index-linked so a push never moves earlier entries.
pub(crate) struct BadColorList {
    head: Vec<usize>,
    color: Vec<usize>,
    next: Vec<usize>,
}

const NONE: usize = usize::MAX;

impl BadColorList {
    pub fn new(n: usize) -> Self {
        Self { head: vec![NONE; n], color: Vec::new(), next: Vec::new() }
    }

    pub fn push(&mut self, vertex: usize, color: usize) {
        let id = self.color.len();
        self.color.push(color);
        self.next.push(self.head[vertex]);
        self.head[vertex] = id;
    }

    pub fn colors(&self, vertex: usize) -> impl Iterator<Item = usize> + '_ {
        let mut cur = self.head[vertex];
        std::iter::from_fn(move || {
            if cur == NONE {
                None
            } else {
                let c = self.color[cur];
                cur = self.next[cur];
                Some(c)
            }
        })
    }
}

/// Globally unique weights from the natural (global index) ordering.
///
/// Suitable as the tie-breaking weight input for either engine when the caller has
/// no better ordering; `global_start` is the first global id owned by this rank.
pub fn natural_weights(n_local: usize, global_start: usize) -> Vec<f64> {
    (0..n_local).map(|i| 1.0 + (global_start + i) as f64).collect()
}

/// Identity visiting order over the local vertices.
pub fn natural_permutation(n_local: usize) -> Vec<usize> {
    (0..n_local).collect()
}

pub(crate) fn check_inputs(n: usize, weights: &[f64], perm: &[usize]) -> Result<(), FcError> {
    if weights.len() != n || perm.len() != n {
        return Err(FcError::InvalidArgument(format!(
            "weights ({}) and permutation ({}) must cover the {} local vertices",
            weights.len(),
            perm.len(),
            n
        )));
    }
    if perm.iter().any(|&i| i >= n) {
        return Err(FcError::InvalidArgument("permutation entry out of range".into()));
    }
    Ok(())
}
