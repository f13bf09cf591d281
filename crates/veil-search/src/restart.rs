//! Admission-filtered random-restart search.
//!
//! The external nonlinear optimizer can silently produce numerically
//! meaningless results under unlucky initializations. This loop turns it into
//! a reliable one by rejection sampling: unstable evaluations are discarded,
//! stable ones compete on cost, and empty-handed batches are redrawn until at
//! least one admissible candidate exists. The retry has no hard ceiling; the
//! caller has no fallback configuration to offer, so giving up is not an
//! option. A configurable discard ceiling makes long retries observable.

use serde::{Deserialize, Serialize};

use veil_core::errors::{ErrorInfo, VeilError};
use veil_core::{RngHandle, WorkloadVector};

use crate::domain::InitDomain;
use crate::oracle::{CostEvaluator, DesignOptimizer, Evaluation};

/// Optimization regime requested from the search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SearchMode {
    /// Optimize against the given workload as if it were exact.
    Nominal,
    /// Optimize against the given workload subject to a divergence budget.
    Robust {
        /// Uncertainty radius the design must tolerate.
        radius: f64,
    },
}

/// Knobs governing one search invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of random initializations drawn per batch.
    #[serde(default = "default_candidates_per_batch")]
    pub candidates_per_batch: usize,
    /// Discard count after which a warning is logged. The search continues;
    /// the ceiling is intentionally loose.
    #[serde(default = "default_discard_ceiling")]
    pub discard_ceiling: usize,
    /// Sampling ranges for initialization tuples.
    #[serde(default)]
    pub domain: InitDomain,
}

fn default_candidates_per_batch() -> usize {
    10
}

fn default_discard_ceiling() -> usize {
    5_000
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            candidates_per_batch: default_candidates_per_batch(),
            discard_ceiling: default_discard_ceiling(),
            domain: InitDomain::default(),
        }
    }
}

/// Result of a completed search; `cost` is always finite.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome<D> {
    /// Lowest-cost admissible design found.
    pub design: D,
    /// Cost of `design` on the workload the search optimized against.
    pub cost: f64,
    /// Number of admissible candidates evaluated.
    pub admitted: usize,
    /// Number of candidates rejected for numerical instability or
    /// non-finite cost.
    pub discarded: usize,
    /// Admitted candidates whose optimizer run did not report convergence.
    pub non_converged_admitted: usize,
}

/// Finds the lowest-cost admissible design for `workload` in the given mode.
///
/// Candidates are drawn in batches of `candidates_per_batch`; a batch that
/// admits nothing is followed by a fresh one, indefinitely. The function
/// returns only once at least one admissible candidate has been costed, so
/// the outcome's cost is never infinite.
pub fn best_design<O, C>(
    optimizer: &O,
    evaluator: &C,
    system: &O::System,
    workload: &WorkloadVector,
    mode: SearchMode,
    config: &SearchConfig,
    rng: &mut RngHandle,
) -> Result<SearchOutcome<O::Design>, VeilError>
where
    O: DesignOptimizer,
    C: CostEvaluator<System = O::System, Design = O::Design>,
{
    if config.candidates_per_batch == 0 {
        return Err(VeilError::Search(ErrorInfo::new(
            "empty-batch",
            "candidates_per_batch must be at least one",
        )));
    }

    let mut best: Option<(O::Design, f64)> = None;
    let mut admitted = 0usize;
    let mut discarded = 0usize;
    let mut non_converged_admitted = 0usize;
    let mut next_warning = config.discard_ceiling.max(1);

    loop {
        for _ in 0..config.candidates_per_batch {
            let evaluation = match mode {
                SearchMode::Nominal => {
                    let init = config.domain.sample_nominal(rng);
                    optimizer.nominal_design(system, workload, Some(&init))
                }
                SearchMode::Robust { radius } => {
                    let init = config.domain.sample_robust(rng);
                    optimizer.robust_design(system, workload, radius, &init)
                }
            };

            let (design, converged) = match evaluation {
                Evaluation::Stable { design, converged } => (design, converged),
                Evaluation::Unstable => {
                    discarded += 1;
                    continue;
                }
            };

            // Expected cost: scored on the same workload the optimizer saw.
            let cost = evaluator.cost(&design, system, workload);
            if !cost.is_finite() {
                discarded += 1;
                continue;
            }

            admitted += 1;
            if !converged {
                non_converged_admitted += 1;
            }
            let improved = best.as_ref().map_or(true, |(_, current)| cost < *current);
            if improved {
                best = Some((design, cost));
            }
        }

        if discarded >= next_warning {
            tracing::warn!(
                discarded,
                ceiling = config.discard_ceiling,
                "random-restart search is discarding many candidates; continuing"
            );
            next_warning = discarded + config.discard_ceiling.max(1);
        }

        if let Some((design, cost)) = best.take() {
            return Ok(SearchOutcome {
                design,
                cost,
                admitted,
                discarded,
                non_converged_admitted,
            });
        }
    }
}
