use veil_core::WorkloadShape;
use veil_search::SearchConfig;
use veil_trials::{
    run_multiplier_sweep, run_predefined_radius_sweep, GridSpec, ReferenceOracle,
    ReferenceSystem, SweepPlan,
};

fn small_plan() -> SweepPlan {
    SweepPlan {
        shapes: vec![WorkloadShape::Uniform, WorkloadShape::Unimodal1],
        epsilon_grid: GridSpec {
            start: 0.05,
            end: 0.16,
            step: 0.05,
        },
        multipliers: vec![0.5, 1.5],
        radius_grid: GridSpec {
            start: 0.5,
            end: 1.6,
            step: 0.5,
        },
        perturbation_samples: 3,
        repeats: 1,
        search: SearchConfig {
            candidates_per_batch: 3,
            ..SearchConfig::default()
        },
        master_seed: Some(9001),
        ..SweepPlan::default()
    }
}

#[test]
fn seeded_multiplier_sweeps_reproduce() {
    let plan = small_plan();
    let oracle = ReferenceOracle::default();
    let system = ReferenceSystem::default();

    let first = run_multiplier_sweep(&plan, &oracle, &oracle, &system).unwrap();
    let second = run_multiplier_sweep(&plan, &oracle, &oracle, &system).unwrap();

    // 2 shapes x 3 epsilons x 2 multipliers.
    assert_eq!(first.rows.len(), 12);
    assert_eq!(first.plan_hash, second.plan_hash);
    assert_eq!(first.rows, second.rows);
}

#[test]
fn multiplier_rows_scale_the_estimate() {
    let plan = small_plan();
    let oracle = ReferenceOracle::default();
    let system = ReferenceSystem::default();
    let report = run_multiplier_sweep(&plan, &oracle, &oracle, &system).unwrap();

    for row in &report.rows {
        let record = &row.record;
        let estimate = record.estimated_radius.expect("estimated sweeps carry it");
        assert!(estimate >= 0.0);
        assert!(
            (record.applied_radius - estimate * record.radius_multiplier).abs() < 1e-12,
            "applied radius must be the scaled estimate"
        );
        assert!(record.robust_cost.is_finite());
        assert!(record.nominal_cost.is_finite());
    }
}

#[test]
fn predefined_sweep_reports_the_grid_radius() {
    let plan = small_plan();
    let oracle = ReferenceOracle::default();
    let system = ReferenceSystem::default();
    let report = run_predefined_radius_sweep(&plan, &oracle, &oracle, &system).unwrap();

    // 2 shapes x 3 epsilons x 3 grid radii.
    assert_eq!(report.rows.len(), 18);
    for row in &report.rows {
        assert!(row.record.estimated_radius.is_none());
        assert!(row.record.applied_radius >= 0.5);
        assert!(row.record.applied_radius < 1.6);
    }
}

#[test]
fn parallel_and_serial_schedulers_agree() {
    let mut serial = small_plan();
    serial.scheduler.concurrency = 1;
    let mut parallel = serial.clone();
    parallel.scheduler.concurrency = 4;

    let oracle = ReferenceOracle::default();
    let system = ReferenceSystem::default();
    let a = run_multiplier_sweep(&serial, &oracle, &oracle, &system).unwrap();
    let b = run_multiplier_sweep(&parallel, &oracle, &oracle, &system).unwrap();
    assert_eq!(a.rows, b.rows);
}
