use thiserror::Error;

// Unified error type for fcgraph

#[derive(Error, Debug)]
pub enum FcError {
    #[error("unsupported coloring distance {0} (only distance 1 and 2 are supported)")]
    UnsupportedDistance(usize),
    #[error("graph view requires an AIJ-style compressed-row pattern: {0}")]
    NonAijFormat(String),
    #[error("coloring exceeds the configured budget of {0} colors")]
    ColorBudgetExceeded(usize),
    #[error("coloring round made no global progress")]
    NotConverging,
    #[error("zero curvature encountered (p^T A p = 0)")]
    BreakdownZeroCurvature,
    #[error("indefinite preconditioner detected (r^T z < 0)")]
    IndefinitePreconditioner,
    #[error("solve error: {0}")]
    SolveError(String),
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
