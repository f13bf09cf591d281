//! Shared trial machinery: contexts, outcomes and search helpers.

use veil_core::{RngHandle, VeilError, WorkloadVector};
use veil_search::{
    best_design, CostEvaluator, DesignOptimizer, SearchConfig, SearchMode, SearchOutcome,
};

/// Immutable collaborators shared by every candidate within a trial.
///
/// The system description is sampled once and treated as a constant for the
/// trial's duration; optimizer and evaluator are the external solver pair the
/// search loop drives.
pub struct TrialContext<'a, O, C>
where
    O: DesignOptimizer,
{
    /// External design optimizer.
    pub optimizer: &'a O,
    /// External cost evaluator.
    pub evaluator: &'a C,
    /// Fixed environment description for the trial.
    pub system: &'a O::System,
    /// Search-loop configuration applied to both regimes.
    pub search: SearchConfig,
}

/// Final designs and realized costs reported by a trial run.
///
/// Costs here are *true-workload* costs: the search selects candidates on the
/// cost of the workload it optimized against, but a trial always scores the
/// winners against the hidden true workload.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialOutcome<D> {
    /// Winning nominal design.
    pub nominal_design: D,
    /// Winning robust design.
    pub robust_design: D,
    /// True-workload cost of the nominal design.
    pub nominal_cost: f64,
    /// True-workload cost of the robust design.
    pub robust_cost: f64,
    /// True-workload cost of the ideal nominal design, when the trial policy
    /// computes one (comparison trials only).
    pub ideal_cost: Option<f64>,
}

/// Runs a nominal search for `workload` under the trial's collaborators.
pub(crate) fn search_nominal<O, C>(
    ctx: &TrialContext<'_, O, C>,
    workload: &WorkloadVector,
    rng: &mut RngHandle,
) -> Result<SearchOutcome<O::Design>, VeilError>
where
    O: DesignOptimizer,
    C: CostEvaluator<System = O::System, Design = O::Design>,
{
    best_design(
        ctx.optimizer,
        ctx.evaluator,
        ctx.system,
        workload,
        SearchMode::Nominal,
        &ctx.search,
        rng,
    )
}

/// Runs a robust search for `workload` under the given radius budget.
pub(crate) fn search_robust<O, C>(
    ctx: &TrialContext<'_, O, C>,
    workload: &WorkloadVector,
    radius: f64,
    rng: &mut RngHandle,
) -> Result<SearchOutcome<O::Design>, VeilError>
where
    O: DesignOptimizer,
    C: CostEvaluator<System = O::System, Design = O::Design>,
{
    best_design(
        ctx.optimizer,
        ctx.evaluator,
        ctx.system,
        workload,
        SearchMode::Robust { radius },
        &ctx.search,
        rng,
    )
}
