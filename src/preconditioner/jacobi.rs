// Jacobi preconditioner implementation

use crate::core::traits::{Indexing, MatVec};
use crate::error::FcError;
use crate::preconditioner::Preconditioner;
use num_traits::Float;

/// Jacobi preconditioner: M⁻¹ = D⁻¹
pub struct Jacobi<T> {
    pub(crate) inv_diag: Vec<T>,
}

impl<T: Float> Jacobi<T> {
    /// new with empty state; user must call `setup`.
    pub fn new() -> Self {
        Self { inv_diag: Vec::new() }
    }
}

impl<T: Float> Default for Jacobi<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M, V, T> Preconditioner<M, V> for Jacobi<T>
where
    M: MatVec<V> + Indexing,
    V: AsRef<[T]> + AsMut<[T]> + From<Vec<T>>,
    T: Float + Send + Sync,
{
    fn setup(&mut self, a: &M) -> Result<(), FcError> {
        let n = a.nrows();
        let mut diag = vec![T::zero(); n];
        let mut e = vec![T::zero(); n];
        // probe the diagonal one basis vector at a time
        for i in 0..n {
            e.iter_mut().for_each(|x| *x = T::zero());
            e[i] = T::one();
            let e_v = V::from(e.clone());
            let mut col_v = V::from(vec![T::zero(); n]);
            a.matvec(&e_v, &mut col_v);
            diag[i] = col_v.as_ref()[i];
        }
        self.inv_diag = diag
            .into_iter()
            .map(|d| if d != T::zero() { T::one() / d } else { T::zero() })
            .collect();
        Ok(())
    }

    fn apply(&self, x: &V, y: &mut V) -> Result<(), FcError> {
        let x_ref = x.as_ref();
        let y_mut = y.as_mut();
        for i in 0..x_ref.len() {
            y_mut[i] = self.inv_diag[i] * x_ref[i];
        }
        Ok(())
    }
}
