//! External-collaborator interfaces: design optimizer and cost evaluator.
//!
//! Real solvers report numerical instability through diagnostic side channels;
//! adapters wrapping them must translate that into the typed
//! [`Evaluation::Unstable`] variant rather than exposing message strings for
//! callers to inspect.

use veil_core::WorkloadVector;

use crate::domain::{NominalInit, RobustInit};

/// Tagged result of one optimizer evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation<D> {
    /// The optimizer produced a numerically meaningful design.
    Stable {
        /// Configuration returned by the optimizer.
        design: D,
        /// Whether the optimizer reported convergence. Non-converged designs
        /// remain admissible to the search loop but are counted separately.
        converged: bool,
    },
    /// Evaluation tripped a numerical-instability signal (overflow or
    /// similar). The candidate is discarded by the search loop, never
    /// surfaced as an error.
    Unstable,
}

impl<D> Evaluation<D> {
    /// Convenience constructor for a converged stable evaluation.
    pub fn stable(design: D) -> Self {
        Evaluation::Stable {
            design,
            converged: true,
        }
    }
}

/// A design optimizer consumed by the search loop.
///
/// `System` is the fixed environment description sampled once per trial;
/// `Design` is the opaque candidate configuration handed back to callers.
pub trait DesignOptimizer {
    /// Environment description shared by every candidate within a trial.
    type System;
    /// Opaque tuning configuration produced by the optimizer.
    type Design: Clone;

    /// Optimizes cost against `workload` alone.
    fn nominal_design(
        &self,
        system: &Self::System,
        workload: &WorkloadVector,
        init: Option<&NominalInit>,
    ) -> Evaluation<Self::Design>;

    /// Optimizes cost against `workload` subject to a divergence budget
    /// `radius`: the design must stay good for any workload within that
    /// distance of the given one.
    fn robust_design(
        &self,
        system: &Self::System,
        workload: &WorkloadVector,
        radius: f64,
        init: &RobustInit,
    ) -> Evaluation<Self::Design>;
}

/// A deterministic cost evaluator; lower is strictly better.
pub trait CostEvaluator {
    /// Environment description matching the optimizer's.
    type System;
    /// Design type matching the optimizer's.
    type Design;

    /// Scores `design` for `workload` under `system`.
    fn cost(
        &self,
        design: &Self::Design,
        system: &Self::System,
        workload: &WorkloadVector,
    ) -> f64;
}
