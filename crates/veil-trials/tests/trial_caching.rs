use std::sync::atomic::{AtomicUsize, Ordering};

use veil_core::{RngHandle, WorkloadVector};
use veil_noise::{LaplaceMechanism, NoiseParameters};
use veil_search::{
    CostEvaluator, DesignOptimizer, Evaluation, NominalInit, RobustInit, SearchConfig,
};
use veil_trials::{RadiusMultiplierTrial, RobustVersusNominalTrial, TrialContext};

/// Counts nominal and robust invocations; designs encode the call index.
#[derive(Default)]
struct CountingOracle {
    nominal_calls: AtomicUsize,
    robust_calls: AtomicUsize,
}

impl DesignOptimizer for CountingOracle {
    type System = ();
    type Design = usize;

    fn nominal_design(
        &self,
        _system: &(),
        _workload: &WorkloadVector,
        _init: Option<&NominalInit>,
    ) -> Evaluation<usize> {
        Evaluation::stable(self.nominal_calls.fetch_add(1, Ordering::SeqCst))
    }

    fn robust_design(
        &self,
        _system: &(),
        _workload: &WorkloadVector,
        _radius: f64,
        _init: &RobustInit,
    ) -> Evaluation<usize> {
        Evaluation::stable(self.robust_calls.fetch_add(1, Ordering::SeqCst))
    }
}

impl CostEvaluator for CountingOracle {
    type System = ();
    type Design = usize;

    fn cost(&self, design: &usize, _system: &(), _workload: &WorkloadVector) -> f64 {
        *design as f64
    }
}

fn mechanism() -> LaplaceMechanism {
    LaplaceMechanism::new(NoiseParameters::new(100.0, 1.0, 1.0, 0.5).unwrap())
}

fn search_config() -> SearchConfig {
    SearchConfig {
        candidates_per_batch: 4,
        ..SearchConfig::default()
    }
}

#[test]
fn multiplier_trial_reuses_the_nominal_search() {
    let oracle = CountingOracle::default();
    let mut rng = RngHandle::from_seed(404);
    let truth = WorkloadVector::uniform(4).unwrap();
    let mut trial = RadiusMultiplierTrial::new(truth, &mechanism(), 5, &mut rng).unwrap();
    let ctx = TrialContext {
        optimizer: &oracle,
        evaluator: &oracle,
        system: &(),
        search: search_config(),
    };

    trial.run_trial(&ctx, 0.5, &mut rng).unwrap();
    let after_first = oracle.nominal_calls.load(Ordering::SeqCst);
    trial.run_trial(&ctx, 1.5, &mut rng).unwrap();
    trial.run_trial(&ctx, 2.0, &mut rng).unwrap();

    // The nominal stage is radius independent; later multipliers reuse it.
    assert_eq!(after_first, 4);
    assert_eq!(oracle.nominal_calls.load(Ordering::SeqCst), after_first);
    // The robust stage reruns per multiplier.
    assert_eq!(oracle.robust_calls.load(Ordering::SeqCst), 12);
}

#[test]
fn single_draw_trial_pins_the_radius_at_one() {
    use veil_trials::{SingleDrawTrial, DEFAULT_RADIUS};

    let oracle = CountingOracle::default();
    let mut rng = RngHandle::from_seed(407);
    let truth = WorkloadVector::uniform(4).unwrap();
    let trial = SingleDrawTrial::new(truth, &mechanism(), &mut rng).unwrap();
    assert_eq!(trial.radius(), DEFAULT_RADIUS);
    assert!(trial.true_radius() >= 0.0);

    let ctx = TrialContext {
        optimizer: &oracle,
        evaluator: &oracle,
        system: &(),
        search: search_config(),
    };
    let outcome = trial.run_trial(&ctx, &mut rng).unwrap();
    assert!(outcome.ideal_cost.is_none());
    assert!(outcome.nominal_cost.is_finite());
    assert!(outcome.robust_cost.is_finite());
}

#[test]
fn estimated_trial_supports_both_robust_targets() {
    use veil_trials::{EstimatedRadiusTrial, RobustTarget};

    for target in [RobustTarget::SingleDraw, RobustTarget::BatchAverage] {
        let oracle = CountingOracle::default();
        let mut rng = RngHandle::from_seed(406);
        let truth = WorkloadVector::uniform(4).unwrap();
        let mut trial =
            EstimatedRadiusTrial::new(truth, &mechanism(), 6, target, &mut rng).unwrap();
        assert!(trial.estimated_radius() >= 0.0);
        let ctx = TrialContext {
            optimizer: &oracle,
            evaluator: &oracle,
            system: &(),
            search: search_config(),
        };
        let outcome = trial.run_trial(&ctx, &mut rng).unwrap();
        assert!(outcome.robust_cost.is_finite());
        let after_first = oracle.nominal_calls.load(Ordering::SeqCst);
        trial.run_trial(&ctx, &mut rng).unwrap();
        assert_eq!(oracle.nominal_calls.load(Ordering::SeqCst), after_first);
    }
}

#[test]
fn comparison_trial_caches_both_radius_independent_stages() {
    let oracle = CountingOracle::default();
    let mut rng = RngHandle::from_seed(405);
    let truth = WorkloadVector::uniform(4).unwrap();
    let mut trial = RobustVersusNominalTrial::new(truth, &mechanism(), 5, &mut rng).unwrap();
    let ctx = TrialContext {
        optimizer: &oracle,
        evaluator: &oracle,
        system: &(),
        search: search_config(),
    };

    let first = trial.run_trial(&ctx, 1.0, &mut rng).unwrap();
    assert!(first.ideal_cost.is_some());
    let after_first = oracle.nominal_calls.load(Ordering::SeqCst);
    trial.run_trial(&ctx, 1.75, &mut rng).unwrap();

    // Ideal and nominal-on-perturbed searches ran once each.
    assert_eq!(after_first, 8);
    assert_eq!(oracle.nominal_calls.load(Ordering::SeqCst), after_first);
}
