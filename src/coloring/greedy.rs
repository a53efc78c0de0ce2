//! Greedy coloring with parallel conflict correction.
//!
//! Each round colors the still-unassigned local vertices greedily in permutation
//! order, broadcasts owner colors to ghost copies, then revokes the color of any
//! local vertex that clashes with a heavier remote neighbor. Rounds repeat until
//! the all-reduced assigned count reaches the global vertex count. On one process
//! the first round already produces a conflict-free coloring.

use crate::config::ColoringOptions;
use crate::error::FcError;
use crate::graph::DistributedGraph;
use crate::parallel::{Comm, ExchangeMap, ReduceOp};

use super::{check_inputs, BadColorList, ColorAssignment, ConflictMask};

pub struct GreedyColoring {
    options: ColoringOptions,
}

impl GreedyColoring {
    pub fn new(options: ColoringOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ColoringOptions {
        &self.options
    }

    /// Color the locally owned vertices of `graph`.
    ///
    /// `weights` break parallel ties (heavier vertex keeps its color) and `perm`
    /// fixes the local visiting order. Collective over `comm`.
    pub fn apply<C: Comm>(
        &self,
        graph: &DistributedGraph,
        weights: &[f64],
        perm: &[usize],
        comm: &C,
    ) -> Result<ColorAssignment, FcError> {
        check_inputs(graph.n_local(), weights, perm)?;
        match self.options.distance {
            1 => self.distance_one(graph, weights, perm, comm),
            2 => self.distance_two(graph, weights, perm, comm),
            d => Err(FcError::UnsupportedDistance(d)),
        }
    }

    fn distance_one<C: Comm>(
        &self,
        graph: &DistributedGraph,
        weights: &[f64],
        perm: &[usize],
        comm: &C,
    ) -> Result<ColorAssignment, FcError> {
        let n = graph.n_local();
        let max_colors = self.options.max_colors;
        let sf = ExchangeMap::build(graph.ranges(), graph.ghost_global_id())?;
        let n_ghost = sf.n_ghost();

        let mut owts = vec![0.0f64; n_ghost];
        sf.bcast_owner_to_ghost(comm, weights, &mut owts);

        let mut colors = vec![max_colors; n];
        let mut ocolors = vec![max_colors; n_ghost];
        let mut mask = ConflictMask::with_capacity(20);

        let n_global = graph.n_global();
        let mut assigned_global = 0usize;
        while assigned_global < n_global {
            let mut overflow = false;
            for &i in perm {
                if colors[i] != max_colors {
                    continue;
                }
                for &j in graph.local_neighbors(i) {
                    if colors[j] != max_colors {
                        mask.stamp(colors[j], i);
                    }
                }
                for &g in graph.remote_neighbors(i) {
                    if ocolors[g] != max_colors {
                        mask.stamp(ocolors[g], i);
                    }
                }
                let c = mask.lowest_clear(i);
                if c < max_colors {
                    colors[i] = c;
                } else {
                    overflow = true;
                }
            }

            sf.bcast_owner_to_ghost(comm, &colors, &mut ocolors);

            // A clash across a rank boundary is resolved by weight: the lighter
            // vertex gives up its color and retries next round.
            for i in 0..n {
                if colors[i] == max_colors {
                    continue;
                }
                for &g in graph.remote_neighbors(i) {
                    if ocolors[g] == colors[i] && owts[g] > weights[i] {
                        colors[i] = max_colors;
                        break;
                    }
                }
            }

            let assigned = colors.iter().filter(|&&c| c != max_colors).count();
            let overflow_global = comm.all_reduce_max_usize(overflow as usize);
            let now_global = comm.all_reduce_sum_usize(assigned);
            // A round without global progress never recovers: either some vertex
            // ran out of colors, or the weight tie-break is broken.
            if now_global == assigned_global {
                if overflow_global > 0 {
                    return Err(FcError::ColorBudgetExceeded(max_colors));
                }
                return Err(FcError::NotConverging);
            }
            assigned_global = now_global;
        }

        Ok(ColorAssignment::from_raw(colors, max_colors))
    }

    /// Distance-2 variant. Serially (no remote block) directed patterns are
    /// handled by scanning the transposed local rows as well, so two vertices
    /// sharing an out-neighbor still see each other. Across ranks the pattern must
    /// be structurally symmetric, so every distance-2 pair is reachable through a
    /// local distance-1 neighbor on one of the two owning ranks.
    fn distance_two<C: Comm>(
        &self,
        graph: &DistributedGraph,
        weights: &[f64],
        perm: &[usize],
        comm: &C,
    ) -> Result<ColorAssignment, FcError> {
        let n = graph.n_local();
        let max_colors = self.options.max_colors;
        let sf = ExchangeMap::build(graph.ranges(), graph.ghost_global_id())?;
        let n_ghost = sf.n_ghost();

        let mut owts = vec![0.0f64; n_ghost];
        sf.bcast_owner_to_ghost(comm, weights, &mut owts);

        // column-to-row map of the local block; stays empty when a remote block
        // is present (symmetric pattern required there)
        let (t_start, t_cols) = if n_ghost == 0 {
            transpose_pattern(n, graph)
        } else {
            (Vec::new(), Vec::new())
        };

        let mut colors = vec![max_colors; n];
        let mut ocolors = vec![max_colors; n_ghost];
        let mut mask = ConflictMask::with_capacity(n.max(1));
        let mut bad = BadColorList::new(n);
        let mut conf = vec![0usize; n];
        let mut oconf = vec![0usize; n_ghost];
        let mut middles: Vec<usize> = Vec::with_capacity(n);

        let n_global = graph.n_global();
        let mut max_color_local = 0usize;
        let mut assigned_global = 0usize;
        while assigned_global < n_global {
            let mut overflow = false;
            for &i in perm {
                if colors[i] != max_colors {
                    continue;
                }
                // colors revoked in earlier rounds stay off-limits
                for c in bad.colors(i) {
                    mask.stamp(c, i);
                }
                middles.clear();
                for &j in graph.local_neighbors(i) {
                    middles.push(j);
                    if colors[j] != max_colors {
                        mask.stamp(colors[j], i);
                    }
                }
                for &j in transpose_row(&t_start, &t_cols, i) {
                    middles.push(j);
                    if colors[j] != max_colors {
                        mask.stamp(colors[j], i);
                    }
                }
                for &g in graph.remote_neighbors(i) {
                    if ocolors[g] != max_colors {
                        mask.stamp(ocolors[g], i);
                    }
                }
                // distance-2 through the one-hop vertices, in both directions
                for t in 0..middles.len() {
                    let v = middles[t];
                    for &j in graph.local_neighbors(v) {
                        if colors[j] != max_colors {
                            mask.stamp(colors[j], i);
                        }
                    }
                    for &j in transpose_row(&t_start, &t_cols, v) {
                        if colors[j] != max_colors {
                            mask.stamp(colors[j], i);
                        }
                    }
                    for &g in graph.remote_neighbors(v) {
                        if ocolors[g] != max_colors {
                            mask.stamp(ocolors[g], i);
                        }
                    }
                }
                let c = mask.lowest_clear(i);
                if c < max_colors {
                    colors[i] = c;
                    if c > max_color_local {
                        max_color_local = c;
                    }
                } else {
                    overflow = true;
                }
            }

            sf.bcast_owner_to_ghost(comm, &colors, &mut ocolors);

            // Conflict detection over each boundary star: for every color seen in
            // the star of a vertex with remote neighbors, only the heaviest holder
            // survives; everyone lighter is flagged locally or on the owner.
            let max_color_global = comm.all_reduce_max_usize(max_color_local);
            let mut color_weights = vec![0.0f64; max_color_global + 1];
            conf.fill(0);
            oconf.fill(0);
            for i in 0..n {
                let rneigh = graph.remote_neighbors(i);
                if rneigh.is_empty() {
                    continue;
                }
                for w in color_weights.iter_mut() {
                    *w = 0.0;
                }
                if colors[i] < max_colors {
                    color_weights[colors[i]] = weights[i];
                }
                for &j in graph.local_neighbors(i) {
                    if colors[j] < max_colors && weights[j] > color_weights[colors[j]] {
                        color_weights[colors[j]] = weights[j];
                    }
                }
                for &g in rneigh {
                    if ocolors[g] < max_colors && owts[g] > color_weights[ocolors[g]] {
                        color_weights[ocolors[g]] = owts[g];
                    }
                }
                if colors[i] < max_colors && color_weights[colors[i]] > weights[i] {
                    conf[i] = 1;
                }
                for &j in graph.local_neighbors(i) {
                    if colors[j] < max_colors && color_weights[colors[j]] > weights[j] {
                        conf[j] = 1;
                    }
                }
                for &g in rneigh {
                    if ocolors[g] < max_colors && color_weights[ocolors[g]] > owts[g] {
                        oconf[g] = 1;
                    }
                }
            }
            sf.reduce_ghost_to_owner(comm, &oconf, &mut conf, ReduceOp::Sum);

            for i in 0..n {
                if conf[i] > 0 && colors[i] != max_colors {
                    bad.push(i, colors[i]);
                    colors[i] = max_colors;
                }
            }

            let assigned = colors.iter().filter(|&&c| c != max_colors).count();
            let overflow_global = comm.all_reduce_max_usize(overflow as usize);
            let now_global = comm.all_reduce_sum_usize(assigned);
            if now_global == assigned_global {
                if overflow_global > 0 {
                    return Err(FcError::ColorBudgetExceeded(max_colors));
                }
                return Err(FcError::NotConverging);
            }
            assigned_global = now_global;
        }

        Ok(ColorAssignment::from_raw(colors, max_colors))
    }
}

fn transpose_row<'a>(t_start: &[usize], t_cols: &'a [usize], v: usize) -> &'a [usize] {
    if t_start.is_empty() {
        &[]
    } else {
        &t_cols[t_start[v]..t_start[v + 1]]
    }
}

/// Column-to-row adjacency of the local block.
fn transpose_pattern(n: usize, graph: &DistributedGraph) -> (Vec<usize>, Vec<usize>) {
    let mut counts = vec![0usize; n + 1];
    for i in 0..n {
        for &j in graph.local_neighbors(i) {
            counts[j + 1] += 1;
        }
    }
    for j in 1..=n {
        counts[j] += counts[j - 1];
    }
    let t_start = counts;
    let mut cursor = t_start.clone();
    let mut t_cols = vec![0usize; *t_start.last().unwrap()];
    for i in 0..n {
        for &j in graph.local_neighbors(i) {
            t_cols[cursor[j]] = i;
            cursor[j] += 1;
        }
    }
    (t_start, t_cols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coloring::{natural_permutation, natural_weights};
    use crate::matrix::CsrMatrix;
    use crate::parallel::SerialComm;

    fn path_graph(n: usize) -> DistributedGraph {
        // tridiagonal pattern: each vertex adjacent to its neighbors on the path
        let mut row_ptr = vec![0usize];
        let mut col_idx = Vec::new();
        for i in 0..n {
            if i > 0 {
                col_idx.push(i - 1);
            }
            col_idx.push(i);
            if i + 1 < n {
                col_idx.push(i + 1);
            }
            row_ptr.push(col_idx.len());
        }
        let nnz = col_idx.len();
        let m = CsrMatrix::from_csr(n, n, row_ptr, col_idx, vec![1.0f64; nnz]).unwrap();
        DistributedGraph::from_matrix(&m).unwrap()
    }

    #[test]
    fn path_needs_two_colors_at_distance_one() {
        let g = path_graph(7);
        let engine = GreedyColoring::new(ColoringOptions::default());
        let c = engine
            .apply(&g, &natural_weights(7, 0), &natural_permutation(7), &SerialComm)
            .unwrap();
        assert_eq!(c.n_colors(), 2);
        for i in 0..6 {
            assert_ne!(c.color(i), c.color(i + 1));
        }
    }

    #[test]
    fn path_needs_three_colors_at_distance_two() {
        let g = path_graph(7);
        let engine = GreedyColoring::new(ColoringOptions::default().with_distance(2));
        let c = engine
            .apply(&g, &natural_weights(7, 0), &natural_permutation(7), &SerialComm)
            .unwrap();
        assert_eq!(c.n_colors(), 3);
        for i in 0..7 {
            for j in (i + 1)..7.min(i + 3) {
                assert_ne!(c.color(i), c.color(j), "vertices {i} and {j} collide");
            }
        }
    }

    #[test]
    fn directed_rows_sharing_a_column_collide_at_distance_two() {
        // 0 -> 1 <- 2 with an empty middle row: 0 and 2 are two hops apart
        // through 1 even though no row connects them directly
        let g = DistributedGraph::from_split_csr(
            3,
            vec![0, 1, 1, 2],
            vec![1, 1],
            vec![],
            vec![],
            vec![],
            vec![0, 3],
        )
        .unwrap();
        let engine = GreedyColoring::new(ColoringOptions::default().with_distance(2));
        let c = engine
            .apply(&g, &natural_weights(3, 0), &[1, 0, 2], &SerialComm)
            .unwrap();
        assert_ne!(c.color(0), c.color(2));
        assert_ne!(c.color(0), c.color(1));
        assert_ne!(c.color(1), c.color(2));
    }

    #[test]
    fn unsupported_distance_is_rejected() {
        let g = path_graph(3);
        let engine = GreedyColoring::new(ColoringOptions::default().with_distance(3));
        assert!(matches!(
            engine.apply(&g, &natural_weights(3, 0), &natural_permutation(3), &SerialComm),
            Err(FcError::UnsupportedDistance(3))
        ));
    }

    #[test]
    fn tight_budget_fails_cleanly() {
        let g = path_graph(5);
        let engine = GreedyColoring::new(ColoringOptions::default().with_distance(2).with_max_colors(2));
        assert!(matches!(
            engine.apply(&g, &natural_weights(5, 0), &natural_permutation(5), &SerialComm),
            Err(FcError::ColorBudgetExceeded(2))
        ));
    }
}
