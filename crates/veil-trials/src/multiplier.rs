//! Radius-multiplier trial: estimated radius scaled before the robust search.

use veil_core::{RngHandle, VeilError, WorkloadVector};
use veil_noise::{estimate_radius, kl_divergence, LaplaceMechanism};
use veil_search::{CostEvaluator, DesignOptimizer, SearchOutcome};

use crate::trial::{search_nominal, search_robust, TrialContext, TrialOutcome};

/// Trial policy that studies over- and under-estimation of the radius by
/// scaling the estimate with a caller-supplied multiplier per run.
#[derive(Debug, Clone)]
pub struct RadiusMultiplierTrial<D> {
    original: WorkloadVector,
    perturbed: WorkloadVector,
    epsilon: f64,
    estimated_radius: f64,
    true_radius: f64,
    cached_nominal: Option<SearchOutcome<D>>,
}

impl<D: Clone> RadiusMultiplierTrial<D> {
    /// Estimates the radius over `sample_count` draws and draws the separate
    /// evaluation workload.
    pub fn new(
        original: WorkloadVector,
        mechanism: &LaplaceMechanism,
        sample_count: usize,
        rng: &mut RngHandle,
    ) -> Result<Self, VeilError> {
        let perturbed = mechanism.perturb(&original, rng);
        let estimated_radius = estimate_radius(&original, mechanism, sample_count, rng)?;
        let true_radius = kl_divergence(&original, &perturbed)?;
        Ok(Self {
            original,
            perturbed,
            epsilon: mechanism.params().epsilon,
            estimated_radius,
            true_radius,
            cached_nominal: None,
        })
    }

    /// Privacy level of the mechanism.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Conservative radius estimate from the sampling batch.
    pub fn estimated_radius(&self) -> f64 {
        self.estimated_radius
    }

    /// Realized divergence of the evaluation draw.
    pub fn true_radius(&self) -> f64 {
        self.true_radius
    }

    /// The privatized evaluation workload.
    pub fn perturbed(&self) -> &WorkloadVector {
        &self.perturbed
    }

    /// Runs one nominal/robust pair with the scaled radius budget.
    ///
    /// The nominal search sees the true workload (the policy studies budget
    /// scaling, not workload hiding) and is cached across multipliers; the
    /// robust search sees the perturbed workload and
    /// `estimated_radius * multiplier`.
    pub fn run_trial<O, C>(
        &mut self,
        ctx: &TrialContext<'_, O, C>,
        multiplier: f64,
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

        let radius = self.estimated_radius * multiplier;
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
