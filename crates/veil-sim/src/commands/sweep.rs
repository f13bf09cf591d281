//! Sweep subcommands: load a plan, fan out trials, persist tables.

use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;

use veil_core::WorkloadShape;
use veil_trials::{
    registry_append, run_comparison_sweep, run_multiplier_sweep, run_predefined_radius_sweep,
    write_records, ReferenceOracle, ReferenceSystem, Registry, SweepPlan, SweepReport,
    TrialRecord,
};

/// Shared arguments for every sweep variant.
#[derive(Args, Debug)]
pub struct SweepArgs {
    /// YAML sweep plan; defaults apply for missing fields.
    #[arg(long)]
    pub plan: Option<PathBuf>,
    /// Output directory receiving one CSV table per workload shape.
    #[arg(long)]
    pub out: PathBuf,
    /// Optional registry path (.csv or .sqlite) to append results to.
    #[arg(long)]
    pub registry: Option<PathBuf>,
}

/// Which sweep driver to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepKind {
    /// Radius-multiplier sweep.
    Multiplier,
    /// Predefined-radius grid sweep.
    PredefinedRadius,
    /// Nominal-versus-robust comparison sweep.
    Comparison,
}

/// Loads the plan, runs the requested sweep and persists the report.
pub fn run(kind: SweepKind, args: &SweepArgs, system: &ReferenceSystem) -> Result<(), Box<dyn Error>> {
    let plan = load_plan(args.plan.as_deref())?;
    let oracle = ReferenceOracle::default();

    let report = match kind {
        SweepKind::Multiplier => run_multiplier_sweep(&plan, &oracle, &oracle, system)?,
        SweepKind::PredefinedRadius => {
            run_predefined_radius_sweep(&plan, &oracle, &oracle, system)?
        }
        SweepKind::Comparison => run_comparison_sweep(&plan, &oracle, &oracle, system)?,
    };

    write_shape_tables(&report, &args.out)?;
    if let Some(path) = &args.registry {
        registry_append(&Registry::from_path(path), &report)?;
    }
    println!(
        "sweep {} complete: {} rows, plan hash {}",
        kind_label(kind),
        report.rows.len(),
        report.plan_hash
    );
    Ok(())
}

fn kind_label(kind: SweepKind) -> &'static str {
    match kind {
        SweepKind::Multiplier => "multiplier",
        SweepKind::PredefinedRadius => "radius",
        SweepKind::Comparison => "compare",
    }
}

fn load_plan(path: Option<&Path>) -> Result<SweepPlan, Box<dyn Error>> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            Ok(serde_yaml::from_str(&text)?)
        }
        None => Ok(SweepPlan::default()),
    }
}

/// Writes one CSV per shape into `out`, named by the shape label.
pub fn write_shape_tables(report: &SweepReport, out: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(out)?;
    let mut by_shape: BTreeMap<WorkloadShape, Vec<TrialRecord>> = BTreeMap::new();
    for row in &report.rows {
        by_shape
            .entry(row.shape)
            .or_default()
            .push(row.record.clone());
    }
    for (shape, records) in by_shape {
        let path = out.join(format!("{}.csv", shape.label()));
        write_records(&path, &records)?;
    }
    Ok(())
}
