// Sparse matrix storage (CSR)

pub mod sparse;
pub use sparse::CsrMatrix;
