//! Convergence testing for the iterative solvers.
//!
//! Tests are stateful objects consulted once per iteration with the current
//! residual norm. Iteration 0 is probed before any search direction is built, so a
//! solve may legitimately finish with zero iterations (e.g. a zero right-hand side
//! with a zero initial guess).

use num_traits::Float;

/// Verdict of a [`ConvergenceTest`] probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestDecision {
    Continue,
    Converged,
    Diverged,
}

/// Why a solve stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergedReason {
    /// Still running (only seen on in-progress stats).
    Iterating,
    Converged,
    /// The convergence test declared divergence.
    Diverged,
    /// Iteration cap reached without convergence.
    DivergedMaxIts,
}

/// Summary of a finished (or aborted) solve.
#[derive(Debug, Clone)]
pub struct SolveStats<T> {
    pub iterations: usize,
    pub final_residual: T,
    pub converged: bool,
    pub reason: ConvergedReason,
}

pub trait ConvergenceTest<T> {
    /// Probe with the iteration number and residual norm for that iteration.
    fn test(&mut self, iteration: usize, rnorm: T) -> TestDecision;

    /// Forget state from a previous solve.
    fn reset(&mut self) {}
}

/// Default test: converge when `rnorm <= atol` or `rnorm / rnorm0 <= rtol`, with
/// `rnorm0` recorded at iteration 0.
pub struct RelativeResidual<T> {
    pub rtol: T,
    pub atol: T,
    rnorm0: Option<T>,
}

impl<T: Float> RelativeResidual<T> {
    pub fn new(rtol: T) -> Self {
        Self { rtol, atol: T::from(1e-50).unwrap(), rnorm0: None }
    }

    pub fn with_atol(mut self, atol: T) -> Self {
        self.atol = atol;
        self
    }
}

impl<T: Float> ConvergenceTest<T> for RelativeResidual<T> {
    fn test(&mut self, iteration: usize, rnorm: T) -> TestDecision {
        if iteration == 0 {
            self.rnorm0 = Some(rnorm);
        }
        let rnorm0 = self.rnorm0.unwrap_or(rnorm);
        if rnorm <= self.atol || (rnorm0 > T::zero() && rnorm <= self.rtol * rnorm0) {
            TestDecision::Converged
        } else {
            TestDecision::Continue
        }
    }

    fn reset(&mut self) {
        self.rnorm0 = None;
    }
}
