//! Shared solver utilities.

pub mod convergence;

pub use convergence::{ConvergedReason, ConvergenceTest, RelativeResidual, SolveStats, TestDecision};
