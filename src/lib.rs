//! fcgraph: distributed graph coloring and flexible Krylov solvers
//!
//! This crate provides parallel greedy and Jones-Plassmann coloring of sparse matrix
//! adjacency graphs, together with a flexible conjugate gradient (FCG) solver with
//! truncated re-orthogonalization. Inter-process coordination goes through a
//! star-forest exchange map and collective reductions, so the same code runs serially
//! or under MPI.

pub mod parallel;

pub mod coloring;
pub mod config;
pub mod core;
pub mod error;
pub mod graph;
pub mod matrix;
pub mod preconditioner;
pub mod solver;
pub mod utils;

// Re-exports for convenience
pub use coloring::*;
pub use config::*;
pub use core::*;
pub use error::*;
pub use graph::*;
pub use matrix::*;
pub use preconditioner::*;
pub use solver::*;
pub use utils::*;
