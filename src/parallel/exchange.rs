//! Star-forest exchange map: routing values between owned entries and their ghost
//! copies on other ranks.
//!
//! An `ExchangeMap` is built once per graph from a contiguous ownership layout plus
//! the global ids of the ghost entries referenced locally. It owns only the routing
//! table (owner rank and owner-local offset per ghost), never the vertex data, and
//! is read-only after construction. Broadcast and reduce are blocking; the latency-
//! hiding begin/end split of the underlying transport is internal to the backend.

use crate::error::FcError;
use crate::parallel::{Comm, ReduceOp, SfScalar};

pub struct ExchangeMap {
    owners: Vec<usize>,
    offsets: Vec<usize>,
}

impl ExchangeMap {
    /// Build the routing table from per-rank ownership ranges (`ranges[r]..ranges[r+1]`
    /// is the global index span owned by rank `r`) and the ghost global ids.
    /// O(ghost count · log(size)) construction.
    pub fn build(ranges: &[usize], ghost_global_ids: &[usize]) -> Result<Self, FcError> {
        if ranges.len() < 2 || ranges.windows(2).any(|w| w[0] > w[1]) {
            return Err(FcError::NonAijFormat("ownership ranges must be non-decreasing".into()));
        }
        let n_global = *ranges.last().unwrap();
        let mut owners = Vec::with_capacity(ghost_global_ids.len());
        let mut offsets = Vec::with_capacity(ghost_global_ids.len());
        for &gid in ghost_global_ids {
            if gid >= n_global {
                return Err(FcError::NonAijFormat(format!(
                    "ghost id {gid} outside global range {n_global}"
                )));
            }
            // partition_point gives the first range boundary above gid
            let owner = ranges.partition_point(|&start| start <= gid) - 1;
            owners.push(owner);
            offsets.push(gid - ranges[owner]);
        }
        Ok(Self { owners, offsets })
    }

    pub fn n_ghost(&self) -> usize {
        self.owners.len()
    }

    /// Owner-to-ghost broadcast: fill `ghost[g]` with the owner's current value.
    /// Collective over `comm`; each value is delivered exactly once per call.
    pub fn bcast_owner_to_ghost<T: SfScalar, C: Comm>(&self, comm: &C, owned: &[T], ghost: &mut [T]) {
        debug_assert_eq!(ghost.len(), self.n_ghost());
        comm.sf_bcast(owned, &self.owners, &self.offsets, ghost);
    }

    /// Ghost-to-owner reduction: accumulate every ghost contribution into the
    /// owner's slot with `op`, keeping the owner's prior value as the initial one.
    pub fn reduce_ghost_to_owner<T: SfScalar, C: Comm>(
        &self,
        comm: &C,
        ghost: &[T],
        owned: &mut [T],
        op: ReduceOp,
    ) {
        debug_assert_eq!(ghost.len(), self.n_ghost());
        comm.sf_reduce(ghost, &self.owners, &self.offsets, owned, op);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::SerialComm;

    #[test]
    fn build_resolves_owner_and_offset() {
        // Two ranks own [0,4) and [4,10); serially we can still build the table.
        let map = ExchangeMap::build(&[0, 4, 10], &[5, 0, 9]).unwrap();
        assert_eq!(map.n_ghost(), 3);
        assert_eq!(map.owners, vec![1, 0, 1]);
        assert_eq!(map.offsets, vec![1, 0, 5]);
    }

    #[test]
    fn build_rejects_out_of_range_ghosts() {
        assert!(matches!(
            ExchangeMap::build(&[0, 4], &[4]),
            Err(FcError::NonAijFormat(_))
        ));
    }

    #[test]
    fn serial_roundtrip() {
        let comm = SerialComm;
        let map = ExchangeMap::build(&[0, 4], &[3, 1]).unwrap();
        let owned = vec![0.5, 1.5, 2.5, 3.5];
        let mut ghost = vec![0.0; 2];
        map.bcast_owner_to_ghost(&comm, &owned, &mut ghost);
        assert_eq!(ghost, vec![3.5, 1.5]);

        let mut accum = vec![0.0; 4];
        map.reduce_ghost_to_owner(&comm, &[1.0, 2.0], &mut accum, ReduceOp::Sum);
        assert_eq!(accum, vec![0.0, 2.0, 0.0, 1.0]);
    }
}
