//! N-perturbation trial: radius estimated from a batch of draws.

use serde::{Deserialize, Serialize};

use veil_core::{RngHandle, VeilError, WorkloadVector};
use veil_noise::{average_workload, kl_divergence, LaplaceMechanism};
use veil_search::{CostEvaluator, DesignOptimizer, SearchOutcome};

use crate::trial::{search_nominal, search_robust, TrialContext, TrialOutcome};

/// Workload the robust stage optimizes against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RobustTarget {
    /// A single evaluation draw, independent of the estimation batch.
    SingleDraw,
    /// The component-wise mean of the estimation batch.
    BatchAverage,
}

/// Trial policy that estimates the radius as the maximum divergence over a
/// batch of perturbations, then evaluates against a separate draw.
///
/// The evaluation draw is independent of the estimation batch, so its
/// realized divergence (the *true radius*) is not guaranteed to fall inside
/// the estimate; both are reported so that gap can be studied.
#[derive(Debug, Clone)]
pub struct EstimatedRadiusTrial<D> {
    original: WorkloadVector,
    perturbed: WorkloadVector,
    batch_average: WorkloadVector,
    epsilon: f64,
    estimated_radius: f64,
    true_radius: f64,
    target: RobustTarget,
    cached_nominal: Option<SearchOutcome<D>>,
}

impl<D: Clone> EstimatedRadiusTrial<D> {
    /// Draws the estimation batch and the separate evaluation workload.
    pub fn new(
        original: WorkloadVector,
        mechanism: &LaplaceMechanism,
        sample_count: usize,
        target: RobustTarget,
        rng: &mut RngHandle,
    ) -> Result<Self, VeilError> {
        let batch = mechanism.perturb_many(&original, sample_count.max(1), rng);
        let batch_average = average_workload(&batch)?;
        let mut estimated_radius = f64::NEG_INFINITY;
        for sample in &batch {
            let d = kl_divergence(&original, sample)?;
            if d > estimated_radius {
                estimated_radius = d;
            }
        }
        let perturbed = mechanism.perturb(&original, rng);
        let true_radius = kl_divergence(&original, &perturbed)?;
        Ok(Self {
            original,
            perturbed,
            batch_average,
            epsilon: mechanism.params().epsilon,
            estimated_radius,
            true_radius,
            target,
            cached_nominal: None,
        })
    }

    /// Privacy level of the mechanism.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Maximum divergence observed over the estimation batch.
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

    /// Runs one nominal/robust pair using the estimated radius.
    ///
    /// The nominal result is computed once per trial instance and reused by
    /// later invocations; the nominal search is radius-independent and
    /// expensive.
    pub fn run_trial<O, C>(
        &mut self,
        ctx: &TrialContext<'_, O, C>,
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

        let robust_workload = match self.target {
            RobustTarget::SingleDraw => &self.perturbed,
            RobustTarget::BatchAverage => &self.batch_average,
        };
        let robust = search_robust(ctx, robust_workload, self.estimated_radius, rng)?;

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
