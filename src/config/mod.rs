//! Configuration structs shared across the coloring engines.

pub mod options;
pub use options::ColoringOptions;
