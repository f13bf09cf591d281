//! Nominal-versus-robust comparison trial.
//!
//! Quantifies the price of not knowing the true workload: an ideal nominal
//! search runs against the truth, while a standard nominal/robust pair runs
//! against the privatized workload. All three winners are scored on the
//! truth.

use veil_core::{RngHandle, VeilError, WorkloadVector};
use veil_noise::{estimate_radius, kl_divergence, LaplaceMechanism};
use veil_search::{CostEvaluator, DesignOptimizer, SearchOutcome};

use crate::trial::{search_nominal, search_robust, TrialContext, TrialOutcome};

/// Trial policy running the ideal, nominal-on-perturbed and robust regimes.
#[derive(Debug, Clone)]
pub struct RobustVersusNominalTrial<D> {
    original: WorkloadVector,
    perturbed: WorkloadVector,
    epsilon: f64,
    estimated_radius: f64,
    true_radius: f64,
    cached_ideal: Option<SearchOutcome<D>>,
    cached_nominal: Option<SearchOutcome<D>>,
}

impl<D: Clone> RobustVersusNominalTrial<D> {
    /// Estimates the radius and draws the evaluation workload.
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
            cached_ideal: None,
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

    /// Runs the three regimes for one radius multiplier.
    ///
    /// Both radius-independent searches (ideal nominal on the truth, nominal
    /// on the perturbed draw) are cached across multipliers; only the robust
    /// stage reruns.
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
        if self.cached_ideal.is_none() {
            self.cached_ideal = Some(search_nominal(ctx, &self.original, rng)?);
        }
        if self.cached_nominal.is_none() {
            self.cached_nominal = Some(search_nominal(ctx, &self.perturbed, rng)?);
        }
        let ideal = self
            .cached_ideal
            .as_ref()
            .unwrap_or_else(|| unreachable!("ideal cached above"));
        let nominal = self
            .cached_nominal
            .as_ref()
            .unwrap_or_else(|| unreachable!("nominal cached above"));

        let radius = self.estimated_radius * multiplier;
        let robust = search_robust(ctx, &self.perturbed, radius, rng)?;

        let ideal_cost = ctx.evaluator.cost(&ideal.design, ctx.system, &self.original);
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
            ideal_cost: Some(ideal_cost),
        })
    }
}
