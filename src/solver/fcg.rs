//! Flexible conjugate gradients.
//!
//! CG variant that stays correct under a preconditioner whose action changes
//! between iterations, at the cost of explicitly re-orthogonalizing each new
//! direction against a window of retained previous directions. With `mmax = 0` it
//! degenerates to preconditioned steepest descent; with a fixed SPD preconditioner
//! and a full window it reproduces classic CG up to rounding.
//!
//! Retained directions are stored pairwise with their operator images, the image
//! pre-scaled by 1/(pᵀAp) so the projection step is a fused multi-dot followed by a
//! multi-axpy.

use num_traits::Float;

use crate::core::traits::{InnerProduct, MatVec};
use crate::error::FcError;
use crate::preconditioner::FlexiblePreconditioner;
use crate::solver::basis::BasisManager;
use crate::utils::convergence::{
    ConvergedReason, ConvergenceTest, RelativeResidual, SolveStats, TestDecision,
};

/// How the direction window shrinks and refills as slots are recycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FcgTruncationType {
    /// Always orthogonalize against the last `mmax` directions.
    Standard,
    /// Periodically restart the window (Notay): at iteration `i`, orthogonalize
    /// against the last `max(1, i mod (mmax+1))` directions.
    Notay,
}

/// Which quantity the convergence test sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CgNormType {
    /// ‖z‖₂, the preconditioned residual norm (default).
    Preconditioned,
    /// ‖r‖₂, the true residual norm.
    Unpreconditioned,
    /// sqrt(|rᵀz|), the norm induced by the preconditioner.
    Natural,
    /// Skip norm computation; runs until the iteration cap.
    None,
}

pub struct FcgSolver<T> {
    /// Maximum number of previous directions retained.
    pub mmax: usize,
    /// Directions preallocated up front.
    pub nprealloc: usize,
    /// Chunk size for lazy direction allocation.
    pub vecb: usize,
    pub truncation: FcgTruncationType,
    pub norm_type: CgNormType,
    pub max_iters: usize,
    pub convergence: Box<dyn ConvergenceTest<T>>,
    /// Called with (iteration, residual norm) once per iteration.
    pub monitor: Option<Box<dyn FnMut(usize, T)>>,
    pub residual_history: Vec<T>,
    calc_eigs: bool,
    // Lanczos tridiagonal built from the CG coefficients
    diag: Vec<T>,
    offdiag: Vec<T>,
}

impl<T: Float + 'static> FcgSolver<T> {
    pub fn new(max_iters: usize) -> Self {
        Self {
            mmax: 30,
            nprealloc: 10,
            vecb: 5,
            truncation: FcgTruncationType::Notay,
            norm_type: CgNormType::Preconditioned,
            max_iters,
            convergence: Box::new(RelativeResidual::new(T::from(1e-5).unwrap())),
            monitor: None,
            residual_history: Vec::new(),
            calc_eigs: false,
            diag: Vec::new(),
            offdiag: Vec::new(),
        }
    }

    pub fn with_mmax(mut self, mmax: usize) -> Self {
        self.mmax = mmax;
        self
    }

    pub fn with_nprealloc(mut self, nprealloc: usize) -> Self {
        self.nprealloc = nprealloc;
        self
    }

    pub fn with_truncation(mut self, truncation: FcgTruncationType) -> Self {
        self.truncation = truncation;
        self
    }

    pub fn with_norm_type(mut self, norm_type: CgNormType) -> Self {
        self.norm_type = norm_type;
        self
    }

    pub fn with_convergence(mut self, test: Box<dyn ConvergenceTest<T>>) -> Self {
        self.convergence = test;
        self
    }

    pub fn with_monitor<F>(mut self, f: F) -> Self
    where
        F: FnMut(usize, T) + 'static,
    {
        self.monitor = Some(Box::new(f));
        self
    }

    pub fn with_eigen_estimates(mut self, on: bool) -> Self {
        self.calc_eigs = on;
        self
    }

    /// Lanczos tridiagonal (diagonal, off-diagonal) accumulated during the last
    /// solve; empty unless eigen estimates were enabled.
    pub fn eigen_tridiagonal(&self) -> (&[T], &[T]) {
        (&self.diag, &self.offdiag)
    }

    /// Window of prior directions to orthogonalize against at iteration `i`.
    fn truncation_window(&self, i: usize) -> usize {
        match self.truncation {
            FcgTruncationType::Standard => self.mmax,
            FcgTruncationType::Notay => (i % (self.mmax + 1)).max(1),
        }
    }

    fn record(&mut self, iteration: usize, rnorm: T) {
        self.residual_history.push(rnorm);
        if let Some(m) = self.monitor.as_mut() {
            m(iteration, rnorm);
        }
    }

    /// Solve `A x = b`, overwriting `x` (a nonzero `x` is used as initial guess).
    pub fn solve<M, V>(
        &mut self,
        a: &M,
        mut pc: Option<&mut dyn FlexiblePreconditioner<M, V>>,
        b: &V,
        x: &mut V,
    ) -> Result<SolveStats<T>, FcError>
    where
        M: MatVec<V>,
        V: AsRef<[T]> + AsMut<[T]> + From<Vec<T>> + Clone,
        (): InnerProduct<V, Scalar = T>,
    {
        let ip = ();
        let n = b.as_ref().len();
        self.residual_history.clear();
        self.diag.clear();
        self.offdiag.clear();
        self.convergence.reset();

        let cap = self.mmax + 1;
        let mut basis: BasisManager<T> = BasisManager::new(n, self.mmax);
        basis.ensure_capacity(self.nprealloc.min(cap), self.nprealloc.max(1));

        // r = b - A x, skipping the matvec for a zero guess
        let guess_is_zero = x.as_ref().iter().all(|&xi| xi == T::zero());
        let mut r: V = if guess_is_zero {
            b.clone()
        } else {
            let mut ax = V::from(vec![T::zero(); n]);
            a.matvec(x, &mut ax);
            V::from(
                b.as_ref()
                    .iter()
                    .zip(ax.as_ref())
                    .map(|(&bi, &axi)| bi - axi)
                    .collect::<Vec<T>>(),
            )
        };
        let mut z = V::from(vec![T::zero(); n]);

        let dp = match self.norm_type {
            CgNormType::Preconditioned => {
                precondition(&mut pc, &r, &mut z)?;
                ip.norm(&z)
            }
            CgNormType::Unpreconditioned => ip.norm(&r),
            CgNormType::Natural => {
                precondition(&mut pc, &r, &mut z)?;
                ip.dot(&r, &z).abs().sqrt()
            }
            CgNormType::None => T::zero(),
        };
        self.record(0, dp);
        let mut stats = SolveStats {
            iterations: 0,
            final_residual: dp,
            converged: false,
            reason: ConvergedReason::Iterating,
        };
        match self.convergence.test(0, dp) {
            TestDecision::Converged => {
                stats.converged = true;
                stats.reason = ConvergedReason::Converged;
                return Ok(stats);
            }
            TestDecision::Diverged => {
                stats.reason = ConvergedReason::Diverged;
                return Ok(stats);
            }
            TestDecision::Continue => {}
        }
        // the norm step above only produced z for the preconditioned norms
        if matches!(self.norm_type, CgNormType::Unpreconditioned | CgNormType::None) {
            precondition(&mut pc, &r, &mut z)?;
        }

        let mut alpha = T::zero();
        let mut alpha_old;
        let mut beta = T::zero();
        let mut beta_old;
        let mut i = 0usize;
        loop {
            basis.ensure_capacity(i + 1, self.vecb.max(1));
            let idx = basis.slot_of(i);
            let mi = self.truncation_window(i);
            let start = i.saturating_sub(mi);
            let window: Vec<usize> = (start..i).map(|k| basis.slot_of(k)).collect();

            // p = z - Σ (z·Cₖ) pₖ over the window (Cₖ pre-scaled by 1/(pₖᵀApₖ))
            let mut p = z.as_ref().to_vec();
            if !window.is_empty() {
                let mut dots = basis.mdot_c(z.as_ref(), &window);
                for d in dots.iter_mut() {
                    *d = -*d;
                }
                basis.maxpy_p(&mut p, &dots, &window);
            }
            basis.p_mut(idx).copy_from_slice(&p);

            let pv = V::from(p);
            beta_old = beta;
            beta = ip.dot(&pv, &r);
            let mut cv = V::from(vec![T::zero(); n]);
            a.matvec(&pv, &mut cv);
            let dpi = ip.dot(&pv, &cv);
            if dpi == T::zero() {
                return Err(FcError::BreakdownZeroCurvature);
            }
            alpha_old = alpha;
            alpha = beta / dpi;

            for (xj, &pj) in x.as_mut().iter_mut().zip(pv.as_ref()) {
                *xj = *xj + alpha * pj;
            }
            for (rj, &cj) in r.as_mut().iter_mut().zip(cv.as_ref()) {
                *rj = *rj - alpha * cj;
            }

            let dp = match self.norm_type {
                CgNormType::Preconditioned => {
                    precondition(&mut pc, &r, &mut z)?;
                    ip.norm(&z)
                }
                CgNormType::Unpreconditioned => ip.norm(&r),
                CgNormType::Natural => {
                    precondition(&mut pc, &r, &mut z)?;
                    ip.dot(&r, &z).abs().sqrt()
                }
                CgNormType::None => T::zero(),
            };
            self.record(i + 1, dp);
            stats.iterations = i + 1;
            stats.final_residual = dp;
            match self.convergence.test(i + 1, dp) {
                TestDecision::Converged => {
                    stats.converged = true;
                    stats.reason = ConvergedReason::Converged;
                    break;
                }
                TestDecision::Diverged => {
                    stats.reason = ConvergedReason::Diverged;
                    break;
                }
                TestDecision::Continue => {}
            }
            if matches!(self.norm_type, CgNormType::Unpreconditioned | CgNormType::None) {
                precondition(&mut pc, &r, &mut z)?;
            }

            // store C = A p scaled by 1/(pᵀAp) for future projections
            let inv_dpi = T::one() / dpi;
            for (ck, &cj) in basis.c_mut(idx).iter_mut().zip(cv.as_ref()) {
                *ck = cj * inv_dpi;
            }

            if self.calc_eigs {
                if i == 0 {
                    self.offdiag.push(T::zero());
                    self.diag.push(T::one() / alpha);
                } else {
                    let ratio = (beta / beta_old).abs().sqrt();
                    let e = ratio / alpha_old;
                    self.offdiag.push(e);
                    self.diag.push(ratio * e + T::one() / alpha);
                }
            }

            i += 1;
            if i >= self.max_iters {
                stats.reason = ConvergedReason::DivergedMaxIts;
                break;
            }
        }
        Ok(stats)
    }
}

fn precondition<M, V: Clone>(
    pc: &mut Option<&mut dyn FlexiblePreconditioner<M, V>>,
    r: &V,
    z: &mut V,
) -> Result<(), FcError> {
    match pc {
        Some(p) => p.apply(r, z),
        None => {
            z.clone_from(r);
            Ok(())
        }
    }
}
