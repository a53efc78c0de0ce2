//! Preconditioners for the flexible solvers.

use crate::error::FcError;

/// A preconditioner M ≈ A⁻¹.
pub trait Preconditioner<M, V> {
    /// Apply M⁻¹ to r, writing z = M⁻¹ r
    fn apply(&self, r: &V, z: &mut V) -> Result<(), FcError>;
    /// Optionally: setup/factorize from A
    fn setup(&mut self, _a: &M) -> Result<(), FcError> {
        Ok(())
    }
}

/// A preconditioner whose action M⁻¹ may change at every iteration.
///
/// The flexible solvers only require this weaker contract; any fixed
/// [`Preconditioner`] satisfies it via the blanket impl below.
pub trait FlexiblePreconditioner<M, V> {
    /// Given the current residual `r`, produce `z ≈ Mₖ⁻¹ r`.
    fn apply(&mut self, r: &V, z: &mut V) -> Result<(), FcError>;
}

impl<M, V, P: Preconditioner<M, V>> FlexiblePreconditioner<M, V> for P {
    fn apply(&mut self, r: &V, z: &mut V) -> Result<(), FcError> {
        Preconditioner::apply(self, r, z)
    }
}

pub mod jacobi;

pub use jacobi::Jacobi;
