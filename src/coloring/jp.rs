//! Jones-Plassmann coloring.
//!
//! Rounds of: bit-mask minimum-color probe over the `distance`-hop neighborhood,
//! greatest-neighbor-weight sweep, then commit every vertex whose weight dominates
//! its uncommitted neighborhood. Committed vertices drop out by having their weight
//! set negative. An optional serial pre-pass colors the interior vertices (those
//! with no remote vertex within `distance` hops) before the rounds start, which
//! usually collapses the parallel phase to the rank boundaries.

use crate::config::ColoringOptions;
use crate::error::FcError;
use crate::graph::DistributedGraph;
use crate::parallel::{Comm, ExchangeMap};

use super::{check_inputs, ColorAssignment, ConflictMask};

const UNCOLORED: usize = usize::MAX;
const MASK_RADIX: usize = u64::BITS as usize;

pub struct JonesPlassmann {
    options: ColoringOptions,
    local: bool,
}

impl JonesPlassmann {
    pub fn new(options: ColoringOptions) -> Self {
        Self { options, local: true }
    }

    pub fn options(&self) -> &ColoringOptions {
        &self.options
    }

    /// Disable or re-enable the serial interior pre-pass.
    pub fn with_local_prepass(mut self, local: bool) -> Self {
        self.local = local;
        self
    }

    /// Color the locally owned vertices of `graph`.
    ///
    /// `weights` decide commit priority (greater weight commits first) and must be
    /// globally unique; `perm` orders the interior pre-pass. Collective over `comm`.
    pub fn apply<C: Comm>(
        &self,
        graph: &DistributedGraph,
        weights: &[f64],
        perm: &[usize],
        comm: &C,
    ) -> Result<ColorAssignment, FcError> {
        check_inputs(graph.n_local(), weights, perm)?;
        let distance = self.options.distance;
        if distance != 1 && distance != 2 {
            return Err(FcError::UnsupportedDistance(distance));
        }
        let n = graph.n_local();
        let max_colors = self.options.max_colors;
        let sf = ExchangeMap::build(graph.ranges(), graph.ghost_global_id())?;

        let mut weights = weights.to_vec();
        let mut colors = vec![UNCOLORED; n];
        let mut max_color_local = 0usize;
        let mut max_color_global = 0usize;
        let mut committed = 0usize;
        let mut committed_global = 0usize;

        if self.local {
            self.initial_local_color(graph, perm, &mut colors)?;
            for i in 0..n {
                if colors[i] != UNCOLORED {
                    committed += 1;
                    weights[i] = -1.0;
                    if colors[i] > max_color_local {
                        max_color_local = colors[i];
                    }
                }
            }
            max_color_global = comm.all_reduce_max_usize(max_color_local);
            committed_global = comm.all_reduce_sum_usize(committed);
        }

        let n_global = graph.n_global();
        while committed_global < n_global {
            let mincolor = self.min_color(graph, &sf, comm, max_color_global, &colors);
            let maxweights = self.greatest_neighbor_weight(graph, &sf, comm, &weights);
            for i in 0..n {
                if weights[i] >= 0.0 && weights[i] >= maxweights[i] {
                    if mincolor[i] >= max_colors {
                        return Err(FcError::ColorBudgetExceeded(max_colors));
                    }
                    colors[i] = mincolor[i];
                    if mincolor[i] > max_color_local {
                        max_color_local = mincolor[i];
                    }
                    weights[i] = -1.0;
                    committed += 1;
                }
            }
            max_color_global = comm.all_reduce_max_usize(max_color_local);
            let now_global = comm.all_reduce_sum_usize(committed);
            // A round with zero global progress can only repeat forever.
            if now_global == committed_global {
                return Err(FcError::NotConverging);
            }
            committed_global = now_global;
        }

        Ok(ColorAssignment::from_raw(colors, max_colors))
    }

    /// Maximum weight over the `distance`-hop neighborhood (including the vertex
    /// itself) for every local vertex, via repeated one-hop max sweeps with a ghost
    /// broadcast between hops.
    fn greatest_neighbor_weight<C: Comm>(
        &self,
        graph: &DistributedGraph,
        sf: &ExchangeMap,
        comm: &C,
        weights: &[f64],
    ) -> Vec<f64> {
        let n = graph.n_local();
        let distance = self.options.distance;
        let mut maxweights = weights.to_vec();
        let mut dwts = weights.to_vec();
        let mut owts = vec![0.0f64; sf.n_ghost()];
        sf.bcast_owner_to_ghost(comm, &dwts, &mut owts);
        for hop in 0..distance {
            for i in 0..n {
                for &j in graph.local_neighbors(i) {
                    if dwts[j] > maxweights[i] {
                        maxweights[i] = dwts[j];
                    }
                }
                for &g in graph.remote_neighbors(i) {
                    if owts[g] > maxweights[i] {
                        maxweights[i] = owts[g];
                    }
                }
            }
            if hop + 1 < distance {
                dwts.copy_from_slice(&maxweights);
                sf.bcast_owner_to_ghost(comm, &dwts, &mut owts);
            }
        }
        maxweights
    }

    /// Smallest color unused in the `distance`-hop neighborhood of every local
    /// vertex. Colors are windowed into 64-bit masks so each window costs one
    /// bit-or sweep per hop plus a ghost broadcast.
    fn min_color<C: Comm>(
        &self,
        graph: &DistributedGraph,
        sf: &ExchangeMap,
        comm: &C,
        max_color: usize,
        colors: &[usize],
    ) -> Vec<usize> {
        let n = graph.n_local();
        let distance = self.options.distance;
        let mut mincolors = vec![UNCOLORED; n];
        let mut cmask = vec![0u64; n];
        let mut dmask = vec![0u64; n];
        let mut omask = vec![0u64; sf.n_ghost()];

        let rounds = 1 + max_color / MASK_RADIX;
        let mut base = 0usize;
        for _ in 0..rounds {
            for i in 0..n {
                cmask[i] = if colors[i] != UNCOLORED && colors[i] >= base && colors[i] < base + MASK_RADIX {
                    1u64 << (colors[i] - base)
                } else {
                    0
                };
                dmask[i] = cmask[i];
            }
            sf.bcast_owner_to_ghost(comm, &dmask, &mut omask);
            for hop in 0..distance {
                for i in 0..n {
                    for &j in graph.local_neighbors(i) {
                        cmask[i] |= dmask[j];
                    }
                    for &g in graph.remote_neighbors(i) {
                        cmask[i] |= omask[g];
                    }
                }
                dmask.copy_from_slice(&cmask);
                if hop + 1 < distance {
                    sf.bcast_owner_to_ghost(comm, &dmask, &mut omask);
                }
            }
            for i in 0..n {
                if mincolors[i] == UNCOLORED {
                    let mut bits = dmask[i];
                    for b in 0..MASK_RADIX {
                        if bits & 1 == 0 {
                            mincolors[i] = base + b;
                            break;
                        }
                        bits >>= 1;
                    }
                }
            }
            base += MASK_RADIX;
        }
        for m in mincolors.iter_mut() {
            if *m == UNCOLORED {
                *m = max_color + 1;
            }
        }
        mincolors
    }

    /// Greedily color the vertices that cannot see a remote vertex within
    /// `distance` hops. They can never conflict across ranks, so no exchange is
    /// needed and the parallel rounds only have the boundary left to settle.
    fn initial_local_color(
        &self,
        graph: &DistributedGraph,
        perm: &[usize],
        colors: &mut [usize],
    ) -> Result<(), FcError> {
        let n = graph.n_local();
        let distance = self.options.distance;
        let max_colors = self.options.max_colors;
        let mut boundary = vec![false; n];
        let mut seen = vec![UNCOLORED; n];
        let mut stack: Vec<(usize, usize)> = Vec::with_capacity(n);

        if graph.n_ghost() > 0 {
            for i in 0..n {
                if !graph.remote_neighbors(i).is_empty() {
                    boundary[i] = true;
                    continue;
                }
                stack.clear();
                for &j in graph.local_neighbors(i) {
                    seen[j] = i;
                    stack.push((j, 1));
                }
                while let Some((v, dist)) = stack.pop() {
                    if dist >= distance {
                        continue;
                    }
                    if !graph.remote_neighbors(v).is_empty() {
                        boundary[i] = true;
                        break;
                    }
                    for &j in graph.local_neighbors(v) {
                        if seen[j] != i {
                            seen[j] = i;
                            stack.push((j, dist + 1));
                        }
                    }
                }
            }
            seen.fill(UNCOLORED);
        }

        let mut mask = ConflictMask::with_capacity(n.max(1));
        for &i in perm {
            if boundary[i] {
                continue;
            }
            stack.clear();
            for &j in graph.local_neighbors(i) {
                seen[j] = i;
                stack.push((j, 1));
            }
            while let Some((v, dist)) = stack.pop() {
                if colors[v] != UNCOLORED {
                    mask.stamp(colors[v], i);
                }
                if dist < distance {
                    for &j in graph.local_neighbors(v) {
                        if seen[j] != i {
                            seen[j] = i;
                            stack.push((j, dist + 1));
                        }
                    }
                }
            }
            let c = mask.lowest_clear(i);
            if c >= max_colors {
                return Err(FcError::ColorBudgetExceeded(max_colors));
            }
            colors[i] = c;
        }
        Ok(())
    }
}
