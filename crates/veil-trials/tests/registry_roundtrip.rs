use veil_core::{WorkloadShape, WorkloadVector};
use veil_trials::{
    record_columns, registry_append, registry_query, stable_hash_string, write_records, Query,
    Registry, SweepReport, SweepRow, TrialRecord,
};

fn sample_record(epsilon: f64) -> TrialRecord {
    let truth = WorkloadShape::Uniform.vector();
    let perturbed = WorkloadVector::from_mix(0.4, 0.3, 0.2, 0.1).unwrap();
    TrialRecord {
        epsilon,
        robust_cost: 2.5,
        nominal_cost: 3.0,
        ideal_cost: Some(2.0),
        radius_multiplier: 1.0,
        estimated_radius: Some(0.9),
        applied_radius: 0.9,
        true_radius: 0.45,
        perturbed_workload: perturbed,
        true_workload: truth,
    }
}

fn sample_report() -> SweepReport {
    SweepReport {
        plan_hash: stable_hash_string(&"roundtrip-plan").unwrap(),
        created_at: "2026-01-01T00:00:00+00:00".to_string(),
        rows: vec![
            SweepRow {
                shape: WorkloadShape::Uniform,
                repeat: 0,
                record: sample_record(0.05),
            },
            SweepRow {
                shape: WorkloadShape::Unimodal1,
                repeat: 0,
                record: sample_record(0.1),
            },
            SweepRow {
                shape: WorkloadShape::Uniform,
                repeat: 1,
                record: sample_record(0.05),
            },
        ],
    }
}

#[test]
fn csv_registry_roundtrips() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Registry::from_path(dir.path().join("trials.csv"));
    let report = sample_report();

    registry_append(&registry, &report).unwrap();
    registry_append(&registry, &report).unwrap();

    let table = registry_query(&registry, &Query::default()).unwrap();
    assert_eq!(table.rows.len(), 6);
    assert_eq!(table.columns.len(), 4 + record_columns().len());

    let filtered = registry_query(
        &registry,
        &Query {
            shape: Some(WorkloadShape::Unimodal1.label()),
            limit: None,
        },
    )
    .unwrap();
    assert_eq!(filtered.rows.len(), 2);

    let limited = registry_query(
        &registry,
        &Query {
            shape: None,
            limit: Some(3),
        },
    )
    .unwrap();
    assert_eq!(limited.rows.len(), 3);
}

#[test]
fn sqlite_registry_roundtrips() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Registry::from_path(dir.path().join("trials.sqlite"));
    let report = sample_report();

    registry_append(&registry, &report).unwrap();

    let table = registry_query(&registry, &Query::default()).unwrap();
    assert_eq!(table.rows.len(), 3);
    let filtered = registry_query(
        &registry,
        &Query {
            shape: Some(WorkloadShape::Uniform.label()),
            limit: Some(1),
        },
    )
    .unwrap();
    assert_eq!(filtered.rows.len(), 1);
    assert_eq!(filtered.rows[0][2], WorkloadShape::Uniform.label());
}

#[test]
fn missing_registry_queries_empty() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Registry::from_path(dir.path().join("absent.csv"));
    let table = registry_query(&registry, &Query::default()).unwrap();
    assert!(table.rows.is_empty());
}

#[test]
fn record_tables_write_a_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.csv");
    write_records(&path, &[sample_record(0.05)]).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("epsilon,robust_cost,nominal_cost"));
    assert_eq!(lines.count(), 1);
}
