//! Single-perturbation trial: one mechanism draw, radius pinned at one.

use veil_core::{RngHandle, VeilError, WorkloadVector};
use veil_noise::{kl_divergence, LaplaceMechanism};
use veil_search::{CostEvaluator, DesignOptimizer};

use crate::trial::{search_nominal, search_robust, TrialContext, TrialOutcome};

/// Radius assumed when no estimation batch is drawn. Privacy mechanisms aim
/// to push neighbouring inputs at least this far apart, so one divergence unit
/// is the conventional pessimistic budget.
pub const DEFAULT_RADIUS: f64 = 1.0;

/// Trial policy that privatizes the workload once and hands the robust
/// optimizer a constant radius.
#[derive(Debug, Clone)]
pub struct SingleDrawTrial {
    original: WorkloadVector,
    perturbed: WorkloadVector,
    epsilon: f64,
    radius: f64,
    true_radius: f64,
}

impl SingleDrawTrial {
    /// Draws the evaluation workload and fixes the radius at
    /// [`DEFAULT_RADIUS`].
    pub fn new(
        original: WorkloadVector,
        mechanism: &LaplaceMechanism,
        rng: &mut RngHandle,
    ) -> Result<Self, VeilError> {
        let perturbed = mechanism.perturb(&original, rng);
        let true_radius = kl_divergence(&original, &perturbed)?;
        Ok(Self {
            original,
            perturbed,
            epsilon: mechanism.params().epsilon,
            radius: DEFAULT_RADIUS,
            true_radius,
        })
    }

    /// Privacy level of the mechanism that drew the evaluation workload.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Radius handed to the robust search.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Realized divergence between the true and the perturbed workload.
    pub fn true_radius(&self) -> f64 {
        self.true_radius
    }

    /// The privatized evaluation workload.
    pub fn perturbed(&self) -> &WorkloadVector {
        &self.perturbed
    }

    /// Runs one nominal/robust pair and scores both on the true workload.
    pub fn run_trial<O, C>(
        &self,
        ctx: &TrialContext<'_, O, C>,
        rng: &mut RngHandle,
    ) -> Result<TrialOutcome<O::Design>, VeilError>
    where
        O: DesignOptimizer,
        C: CostEvaluator<System = O::System, Design = O::Design>,
    {
        let nominal = search_nominal(ctx, &self.original, rng)?;
        let robust = search_robust(ctx, &self.perturbed, self.radius, rng)?;

        let nominal_cost = ctx
            .evaluator
            .cost(&nominal.design, ctx.system, &self.original);
        let robust_cost = ctx
            .evaluator
            .cost(&robust.design, ctx.system, &self.original);

        Ok(TrialOutcome {
            nominal_design: nominal.design,
            robust_design: robust.design,
            nominal_cost,
            robust_cost,
            ideal_cost: None,
        })
    }
}
