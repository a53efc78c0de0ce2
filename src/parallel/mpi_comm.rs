//! MPI-backed [`Comm`] implementation.
//!
//! Wraps the world communicator and maps the trait's collectives onto MPI ones.
//! The indexed exchange primitives (`sf_bcast` / `sf_reduce`) are realized with a
//! request/reply pair of `all_to_all_varcount` rounds: ghosts are grouped by owning
//! rank, owners are asked for (or handed) the listed offsets, and replies are
//! scattered back into ghost order. Only compiled with the `mpi` feature.

use mpi::Count;
use mpi::datatype::{Partition, PartitionMut};
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;

use super::{Comm, ReduceOp, SfScalar};

/// MPI communicator wrapper for distributed parallelism.
pub struct MpiComm {
    pub world: SimpleCommunicator,
    pub rank: usize,
    pub size: usize,
}

impl MpiComm {
    /// Initializes MPI and constructs a new `MpiComm` instance.
    ///
    /// # Panics
    /// Panics if MPI initialization fails.
    pub fn new() -> Self {
        let universe = mpi::initialize().unwrap();
        let world = universe.world();
        let rank = world.rank() as usize;
        let size = world.size() as usize;
        MpiComm { world, rank, size }
    }

    /// Group ghost indices by owning rank. Returns per-rank counts, displacements,
    /// and the permutation taking "grouped order" back to ghost order.
    fn group_by_owner(&self, owners: &[usize]) -> (Vec<Count>, Vec<Count>, Vec<usize>) {
        let mut counts = vec![0 as Count; self.size];
        for &r in owners {
            counts[r] += 1;
        }
        let mut displs = vec![0 as Count; self.size];
        for r in 1..self.size {
            displs[r] = displs[r - 1] + counts[r - 1];
        }
        let mut cursor: Vec<usize> = displs.iter().map(|&d| d as usize).collect();
        let mut order = vec![0usize; owners.len()];
        for (g, &r) in owners.iter().enumerate() {
            order[cursor[r]] = g;
            cursor[r] += 1;
        }
        (counts, displs, order)
    }

    /// Exchange the offsets each rank wants from every other rank. Returns the
    /// incoming request offsets along with their per-rank counts and displacements.
    fn exchange_requests(
        &self,
        offsets: &[usize],
        counts: &[Count],
        displs: &[Count],
        order: &[usize],
    ) -> (Vec<usize>, Vec<Count>, Vec<Count>) {
        let mut recv_counts = vec![0 as Count; self.size];
        self.world.all_to_all_into(counts, &mut recv_counts);
        let mut recv_displs = vec![0 as Count; self.size];
        for r in 1..self.size {
            recv_displs[r] = recv_displs[r - 1] + recv_counts[r - 1];
        }
        let send_offsets: Vec<usize> = order.iter().map(|&g| offsets[g]).collect();
        let total_in: usize = recv_counts.iter().map(|&c| c as usize).sum();
        let mut incoming = vec![0usize; total_in];
        {
            let send_part = Partition::new(&send_offsets[..], counts, displs);
            let mut recv_part = PartitionMut::new(&mut incoming[..], &recv_counts[..], &recv_displs[..]);
            self.world.all_to_all_varcount_into(&send_part, &mut recv_part);
        }
        (incoming, recv_counts, recv_displs)
    }
}

impl Comm for MpiComm {
    fn rank(&self) -> usize {
        self.rank
    }
    fn size(&self) -> usize {
        self.size
    }
    fn barrier(&self) {
        self.world.barrier();
    }

    fn all_reduce(&self, x: f64) -> f64 {
        use mpi::collective::SystemOperation;
        let mut y = x;
        self.world.all_reduce_into(&x, &mut y, &SystemOperation::sum());
        y
    }

    fn all_reduce_max(&self, x: f64) -> f64 {
        use mpi::collective::SystemOperation;
        let mut y = x;
        self.world.all_reduce_into(&x, &mut y, &SystemOperation::max());
        y
    }

    fn all_reduce_sum_usize(&self, x: usize) -> usize {
        use mpi::collective::SystemOperation;
        let mut y = x;
        self.world.all_reduce_into(&x, &mut y, &SystemOperation::sum());
        y
    }

    fn all_reduce_max_usize(&self, x: usize) -> usize {
        use mpi::collective::SystemOperation;
        let mut y = x;
        self.world.all_reduce_into(&x, &mut y, &SystemOperation::max());
        y
    }

    fn sf_bcast<T: SfScalar>(&self, owned: &[T], owners: &[usize], offsets: &[usize], ghost: &mut [T]) {
        let (counts, displs, order) = self.group_by_owner(owners);
        let (incoming, recv_counts, recv_displs) = self.exchange_requests(offsets, &counts, &displs, &order);
        // Serve the requested owned values back to the requesters.
        let replies: Vec<T> = incoming.iter().map(|&off| owned[off]).collect();
        let mut grouped = vec![T::zero(); ghost.len()];
        {
            let send_part = Partition::new(&replies[..], &recv_counts[..], &recv_displs[..]);
            let mut recv_part = PartitionMut::new(&mut grouped[..], &counts[..], &displs[..]);
            self.world.all_to_all_varcount_into(&send_part, &mut recv_part);
        }
        for (k, &g) in order.iter().enumerate() {
            ghost[g] = grouped[k];
        }
    }

    fn sf_reduce<T: SfScalar>(
        &self,
        ghost: &[T],
        owners: &[usize],
        offsets: &[usize],
        owned: &mut [T],
        op: ReduceOp,
    ) {
        let (counts, displs, order) = self.group_by_owner(owners);
        let (incoming, recv_counts, recv_displs) = self.exchange_requests(offsets, &counts, &displs, &order);
        // Ship ghost contributions to their owners, paired one-to-one with the
        // offset lists exchanged above.
        let contributions: Vec<T> = order.iter().map(|&g| ghost[g]).collect();
        let total_in: usize = recv_counts.iter().map(|&c| c as usize).sum();
        let mut arriving = vec![T::zero(); total_in];
        {
            let send_part = Partition::new(&contributions[..], &counts[..], &displs[..]);
            let mut recv_part = PartitionMut::new(&mut arriving[..], &recv_counts[..], &recv_displs[..]);
            self.world.all_to_all_varcount_into(&send_part, &mut recv_part);
        }
        for (&off, &v) in incoming.iter().zip(arriving.iter()) {
            owned[off] = op.combine(owned[off], v);
        }
    }
}
