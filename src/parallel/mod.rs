//! Process-parallel communication layer.
//!
//! Algorithms in this crate are written against the [`Comm`] trait: a process group
//! with collective reductions plus the indexed exchange primitives that back
//! [`exchange::ExchangeMap`]. Correctness requires every rank to issue the same
//! sequence of collective calls; termination tests are therefore always driven by
//! all-reduced global counts, never per-rank state.

/// Scalar types that can travel through the exchange layer.
#[cfg(not(feature = "mpi"))]
pub trait SfScalar: Copy + PartialOrd + num_traits::Zero {}
#[cfg(not(feature = "mpi"))]
impl<T: Copy + PartialOrd + num_traits::Zero> SfScalar for T {}

#[cfg(feature = "mpi")]
pub trait SfScalar: Copy + PartialOrd + num_traits::Zero + mpi::datatype::Equivalence {}
#[cfg(feature = "mpi")]
impl<T: Copy + PartialOrd + num_traits::Zero + mpi::datatype::Equivalence> SfScalar for T {}

/// Reduction operator for ghost-to-owner accumulation.
///
/// Both operators are associative and commutative; no ordering is guaranteed among
/// ghost contributions targeting the same owned entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    Sum,
    Max,
}

impl ReduceOp {
    #[inline]
    pub(crate) fn combine<T: SfScalar>(self, a: T, b: T) -> T {
        match self {
            ReduceOp::Sum => a + b,
            ReduceOp::Max => {
                if b > a {
                    b
                } else {
                    a
                }
            }
        }
    }
}

pub trait Comm {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;
    fn barrier(&self);
    /// All-reduce sum over the process group.
    fn all_reduce(&self, x: f64) -> f64;
    /// All-reduce max over the process group.
    fn all_reduce_max(&self, x: f64) -> f64;
    /// All-reduce sum of a counter (termination tests).
    fn all_reduce_sum_usize(&self, x: usize) -> usize;
    /// All-reduce max of a counter (e.g. globally largest color).
    fn all_reduce_max_usize(&self, x: usize) -> usize;
    /// Fetch `ghost[g] = owned_on_rank(owners[g])[offsets[g]]` for every ghost index.
    ///
    /// Every rank must call this, even with zero ghosts of its own, since it may
    /// serve values to other ranks. Blocking.
    fn sf_bcast<T: SfScalar>(&self, owned: &[T], owners: &[usize], offsets: &[usize], ghost: &mut [T]);
    /// Accumulate `owned_on_rank(owners[g])[offsets[g]] ⟵ op(…, ghost[g])` for every
    /// ghost index. The owned buffer keeps its prior contents as the initial value.
    fn sf_reduce<T: SfScalar>(
        &self,
        ghost: &[T],
        owners: &[usize],
        offsets: &[usize],
        owned: &mut [T],
        op: ReduceOp,
    );
    fn dot(&self, a: &[f64], b: &[f64]) -> f64 {
        let local = a.iter().zip(b).map(|(&x, &y)| x * y).sum::<f64>();
        self.all_reduce(local)
    }
}

/// Single-process communicator; every collective degenerates to a local copy.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialComm;

impl Comm for SerialComm {
    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn barrier(&self) {}
    fn all_reduce(&self, x: f64) -> f64 {
        x
    }
    fn all_reduce_max(&self, x: f64) -> f64 {
        x
    }
    fn all_reduce_sum_usize(&self, x: usize) -> usize {
        x
    }
    fn all_reduce_max_usize(&self, x: usize) -> usize {
        x
    }
    fn sf_bcast<T: SfScalar>(&self, owned: &[T], owners: &[usize], offsets: &[usize], ghost: &mut [T]) {
        debug_assert!(owners.iter().all(|&r| r == 0));
        let _ = owners;
        for (g, &off) in offsets.iter().enumerate() {
            ghost[g] = owned[off];
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
        debug_assert!(owners.iter().all(|&r| r == 0));
        let _ = owners;
        for (g, &off) in offsets.iter().enumerate() {
            owned[off] = op.combine(owned[off], ghost[g]);
        }
    }
}

#[cfg(feature = "mpi")]
pub mod mpi_comm;
#[cfg(feature = "mpi")]
pub use mpi_comm::MpiComm;

pub mod exchange;
pub use exchange::ExchangeMap;
