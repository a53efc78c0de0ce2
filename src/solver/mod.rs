//! Krylov solvers.

pub mod basis;
pub mod fcg;

pub use basis::BasisManager;
pub use fcg::{CgNormType, FcgSolver, FcgTruncationType};
