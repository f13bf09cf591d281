//! Predefined-radius trial: the caller supplies the budget directly.

use veil_core::{RngHandle, VeilError, WorkloadVector};
use veil_noise::{kl_divergence, LaplaceMechanism};
use veil_search::{CostEvaluator, DesignOptimizer, SearchOutcome};

use crate::trial::{search_nominal, search_robust, TrialContext, TrialOutcome};

/// Trial policy that bypasses the estimator so the radius can be swept
/// independently of the noise level.
#[derive(Debug, Clone)]
pub struct PredefinedRadiusTrial<D> {
    original: WorkloadVector,
    perturbed: WorkloadVector,
    epsilon: f64,
    true_radius: f64,
    cached_nominal: Option<SearchOutcome<D>>,
}

impl<D: Clone> PredefinedRadiusTrial<D> {
    /// Draws the evaluation workload; no estimation batch is needed.
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
            true_radius,
            cached_nominal: None,
        })
    }

    /// Privacy level of the mechanism.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Realized divergence of the evaluation draw.
    pub fn true_radius(&self) -> f64 {
        self.true_radius
    }

    /// The privatized evaluation workload.
    pub fn perturbed(&self) -> &WorkloadVector {
        &self.perturbed
    }

    /// Runs one nominal/robust pair under the supplied radius.
    ///
    /// Nominal results are cached across calls on the same trial instance;
    /// only the robust stage depends on `radius`.
    pub fn run_trial<O, C>(
        &mut self,
        ctx: &TrialContext<'_, O, C>,
        radius: f64,
        rng: &mut RngHandle,
    ) -> Result<TrialOutcome<D>, VeilError>
    where
        O: DesignOptimizer<Design = D>,
        C: CostEvaluator<System = O::System, Design = D>,
    {
        if self.cached_nominal.is_none() {
            self.cached_nominal = Some(search_nominal(ctx, &self.original, rng)?);
        }
        let nominal = self
            .cached_nominal
            .as_ref()
            .unwrap_or_else(|| unreachable!("nominal cached above"));

        let robust = search_robust(ctx, &self.perturbed, radius, rng)?;

        let nominal_cost = ctx
            .evaluator
            .cost(&nominal.design, ctx.system, &self.original);
        let robust_cost = ctx
            .evaluator
            .cost(&robust.design, ctx.system, &self.original);

        Ok(TrialOutcome {
            nominal_design: nominal.design.clone(),
            robust_design: robust.design,
            nominal_cost,
            robust_cost,
            ideal_cost: None,
        })
    }
}
