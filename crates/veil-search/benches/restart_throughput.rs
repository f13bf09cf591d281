use criterion::{criterion_group, criterion_main, Criterion};

use veil_core::{RngHandle, WorkloadVector};
use veil_search::{
    best_design, CostEvaluator, DesignOptimizer, Evaluation, NominalInit, RobustInit,
    SearchConfig, SearchMode,
};

/// Deterministic stand-in optimizer: stability and quality derive from the
/// initialization tuple alone.
struct SyntheticOptimizer;

impl DesignOptimizer for SyntheticOptimizer {
    type System = ();
    type Design = f64;

    fn nominal_design(
        &self,
        _system: &(),
        _workload: &WorkloadVector,
        init: Option<&NominalInit>,
    ) -> Evaluation<f64> {
        let init = init.expect("bench always seeds");
        if init.bits % 7 == 0 {
            Evaluation::Unstable
        } else {
            Evaluation::stable(init.ratio + init.bits as f64)
        }
    }

    fn robust_design(
        &self,
        _system: &(),
        _workload: &WorkloadVector,
        radius: f64,
        init: &RobustInit,
    ) -> Evaluation<f64> {
        if init.bits % 7 == 0 {
            Evaluation::Unstable
        } else {
            Evaluation::stable(init.ratio + init.bits as f64 + radius * init.lagrange_kl)
        }
    }
}

struct IdentityCost;

impl CostEvaluator for IdentityCost {
    type System = ();
    type Design = f64;

    fn cost(&self, design: &f64, _system: &(), _workload: &WorkloadVector) -> f64 {
        *design
    }
}

fn bench_restart(c: &mut Criterion) {
    let workload = WorkloadVector::uniform(4).expect("uniform");
    let config = SearchConfig {
        candidates_per_batch: 100,
        ..SearchConfig::default()
    };
    c.bench_function("restart_throughput", |b| {
        b.iter(|| {
            let mut rng = RngHandle::from_seed(1234);
            let outcome = best_design(
                &SyntheticOptimizer,
                &IdentityCost,
                &(),
                &workload,
                SearchMode::Robust { radius: 1.0 },
                &config,
                &mut rng,
            )
            .expect("search");
            outcome.cost
        });
    });
}

criterion_group!(benches, bench_restart);
criterion_main!(benches);
