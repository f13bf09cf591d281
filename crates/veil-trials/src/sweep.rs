//! Sweep plans and parallel trial execution.
//!
//! A sweep fans out one task per (shape, epsilon, repeat) cell; cells share
//! no mutable state, so they run on a rayon pool and merge in deterministic
//! key order once every task has finished.

use chrono::Utc;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use veil_core::errors::{ErrorInfo, VeilError};
use veil_core::{derive_substream_seed, RngHandle, WorkloadShape};
use veil_noise::{LaplaceMechanism, NoiseParameters};
use veil_search::{CostEvaluator, DesignOptimizer, SearchConfig};

use crate::comparison::RobustVersusNominalTrial;
use crate::hash::stable_hash_string;
use crate::multiplier::RadiusMultiplierTrial;
use crate::predefined::PredefinedRadiusTrial;
use crate::record::TrialRecord;
use crate::trial::TrialContext;

/// Half-open arithmetic grid over a float parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// First value, inclusive.
    pub start: f64,
    /// Upper bound, exclusive.
    pub end: f64,
    /// Spacing between consecutive values.
    pub step: f64,
}

impl GridSpec {
    /// Materializes the grid values.
    pub fn values(&self) -> Vec<f64> {
        let mut out = Vec::new();
        if self.step <= 0.0 {
            return out;
        }
        let mut index = 0u32;
        loop {
            let value = self.start + self.step * f64::from(index);
            if value >= self.end - 1e-12 {
                break;
            }
            out.push(value);
            index += 1;
        }
        out
    }
}

fn default_epsilon_grid() -> GridSpec {
    GridSpec {
        start: 0.05,
        end: 1.05,
        step: 0.05,
    }
}

fn default_radius_grid() -> GridSpec {
    GridSpec {
        start: 0.0,
        end: 2.1,
        step: 0.1,
    }
}

/// Noise calibration shared across a sweep; epsilon comes from the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseSpec {
    /// Magnification applied before noise is added.
    #[serde(default = "default_workload_scaler")]
    pub workload_scaler: f64,
    /// Multiplier applied to every Laplace draw.
    #[serde(default = "default_noise_scaler")]
    pub noise_scaler: f64,
    /// Sensitivity of the scaled release.
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,
}

fn default_workload_scaler() -> f64 {
    100.0
}

fn default_noise_scaler() -> f64 {
    1.0
}

fn default_sensitivity() -> f64 {
    1.0
}

impl Default for NoiseSpec {
    fn default() -> Self {
        Self {
            workload_scaler: default_workload_scaler(),
            noise_scaler: default_noise_scaler(),
            sensitivity: default_sensitivity(),
        }
    }
}

impl NoiseSpec {
    /// Builds validated mechanism parameters for one epsilon value.
    pub fn params(&self, epsilon: f64) -> Result<NoiseParameters, VeilError> {
        NoiseParameters::new(
            self.workload_scaler,
            self.noise_scaler,
            self.sensitivity,
            epsilon,
        )
    }
}

/// Scheduler configuration controlling sweep execution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scheduler {
    /// Number of cells executed concurrently.
    #[serde(default = "Scheduler::default_concurrency")]
    pub concurrency: usize,
}

impl Scheduler {
    const fn default_concurrency() -> usize {
        1
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            concurrency: Self::default_concurrency(),
        }
    }
}

/// Plan describing a sweep over shapes, privacy levels and radius settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPlan {
    /// Workload shapes to sweep; defaults to the full registry.
    #[serde(default = "WorkloadShape::all")]
    pub shapes: Vec<WorkloadShape>,
    /// Privacy levels to sweep.
    #[serde(default = "default_epsilon_grid")]
    pub epsilon_grid: GridSpec,
    /// Radius multipliers for multiplier and comparison sweeps.
    #[serde(default = "default_multipliers")]
    pub multipliers: Vec<f64>,
    /// Radius grid for predefined-radius sweeps.
    #[serde(default = "default_radius_grid")]
    pub radius_grid: GridSpec,
    /// Perturbations drawn per radius estimate.
    #[serde(default = "default_perturbation_samples")]
    pub perturbation_samples: usize,
    /// Independent repetitions of every (shape, epsilon) cell.
    #[serde(default = "default_repeats")]
    pub repeats: usize,
    /// Mechanism calibration.
    #[serde(default)]
    pub noise: NoiseSpec,
    /// Search-loop configuration.
    #[serde(default)]
    pub search: SearchConfig,
    /// Master seed for reproducible mechanism draws; entropy when absent.
    #[serde(default)]
    pub master_seed: Option<u64>,
    /// Parallel execution settings.
    #[serde(default)]
    pub scheduler: Scheduler,
}

fn default_multipliers() -> Vec<f64> {
    vec![0.25, 1.0, 1.75]
}

fn default_perturbation_samples() -> usize {
    10
}

fn default_repeats() -> usize {
    1
}

impl Default for SweepPlan {
    fn default() -> Self {
        Self {
            shapes: WorkloadShape::all(),
            epsilon_grid: default_epsilon_grid(),
            multipliers: default_multipliers(),
            radius_grid: default_radius_grid(),
            perturbation_samples: default_perturbation_samples(),
            repeats: default_repeats(),
            noise: NoiseSpec::default(),
            search: SearchConfig::default(),
            master_seed: None,
            scheduler: Scheduler::default(),
        }
    }
}

/// One output row, keyed by the cell that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
    /// Shape of the cell's true workload.
    pub shape: WorkloadShape,
    /// Repetition index of the cell.
    pub repeat: usize,
    /// The trial record.
    pub record: TrialRecord,
}

/// Aggregate sweep output persisted for reproducibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Stable hash of the plan that produced the rows.
    pub plan_hash: String,
    /// UTC timestamp of report creation.
    pub created_at: String,
    /// All rows in (shape, epsilon, repeat) order.
    pub rows: Vec<SweepRow>,
}

impl SweepReport {
    fn new(plan: &SweepPlan, rows: Vec<SweepRow>) -> Result<Self, VeilError> {
        Ok(Self {
            plan_hash: stable_hash_string(plan)?,
            created_at: Utc::now().to_rfc3339(),
            rows,
        })
    }
}

/// Sweeps radius multipliers: radius estimated per cell, scaled per row.
pub fn run_multiplier_sweep<O, C>(
    plan: &SweepPlan,
    optimizer: &O,
    evaluator: &C,
    system: &O::System,
) -> Result<SweepReport, VeilError>
where
    O: DesignOptimizer + Sync,
    O::System: Sync,
    O::Design: Clone + Send,
    C: CostEvaluator<System = O::System, Design = O::Design> + Sync,
{
    run_cells(plan, |cell| {
        let mechanism = LaplaceMechanism::new(plan.noise.params(cell.epsilon)?);
        let mut trial = RadiusMultiplierTrial::new(
            cell.shape.vector(),
            &mechanism,
            plan.perturbation_samples,
            cell.rng,
        )?;
        let ctx = TrialContext {
            optimizer,
            evaluator,
            system,
            search: plan.search.clone(),
        };
        let mut records = Vec::with_capacity(plan.multipliers.len());
        for &multiplier in &plan.multipliers {
            let outcome = trial.run_trial(&ctx, multiplier, cell.rng)?;
            records.push(TrialRecord {
                epsilon: cell.epsilon,
                robust_cost: outcome.robust_cost,
                nominal_cost: outcome.nominal_cost,
                ideal_cost: outcome.ideal_cost,
                radius_multiplier: multiplier,
                estimated_radius: Some(trial.estimated_radius()),
                applied_radius: trial.estimated_radius() * multiplier,
                true_radius: trial.true_radius(),
                perturbed_workload: trial.perturbed().clone(),
                true_workload: cell.shape.vector(),
            });
        }
        Ok(records)
    })
}

/// Sweeps a predefined radius grid, bypassing the estimator.
pub fn run_predefined_radius_sweep<O, C>(
    plan: &SweepPlan,
    optimizer: &O,
    evaluator: &C,
    system: &O::System,
) -> Result<SweepReport, VeilError>
where
    O: DesignOptimizer + Sync,
    O::System: Sync,
    O::Design: Clone + Send,
    C: CostEvaluator<System = O::System, Design = O::Design> + Sync,
{
    run_cells(plan, |cell| {
        let mechanism = LaplaceMechanism::new(plan.noise.params(cell.epsilon)?);
        let mut trial =
            PredefinedRadiusTrial::new(cell.shape.vector(), &mechanism, cell.rng)?;
        let ctx = TrialContext {
            optimizer,
            evaluator,
            system,
            search: plan.search.clone(),
        };
        let radii = plan.radius_grid.values();
        let mut records = Vec::with_capacity(radii.len());
        for radius in radii {
            let outcome = trial.run_trial(&ctx, radius, cell.rng)?;
            records.push(TrialRecord {
                epsilon: cell.epsilon,
                robust_cost: outcome.robust_cost,
                nominal_cost: outcome.nominal_cost,
                ideal_cost: outcome.ideal_cost,
                radius_multiplier: 1.0,
                estimated_radius: None,
                applied_radius: radius,
                true_radius: trial.true_radius(),
                perturbed_workload: trial.perturbed().clone(),
                true_workload: cell.shape.vector(),
            });
        }
        Ok(records)
    })
}

/// Sweeps the nominal-versus-robust comparison across multipliers.
pub fn run_comparison_sweep<O, C>(
    plan: &SweepPlan,
    optimizer: &O,
    evaluator: &C,
    system: &O::System,
) -> Result<SweepReport, VeilError>
where
    O: DesignOptimizer + Sync,
    O::System: Sync,
    O::Design: Clone + Send,
    C: CostEvaluator<System = O::System, Design = O::Design> + Sync,
{
    run_cells(plan, |cell| {
        let mechanism = LaplaceMechanism::new(plan.noise.params(cell.epsilon)?);
        let mut trial = RobustVersusNominalTrial::new(
            cell.shape.vector(),
            &mechanism,
            plan.perturbation_samples,
            cell.rng,
        )?;
        let ctx = TrialContext {
            optimizer,
            evaluator,
            system,
            search: plan.search.clone(),
        };
        let mut records = Vec::with_capacity(plan.multipliers.len());
        for &multiplier in &plan.multipliers {
            let outcome = trial.run_trial(&ctx, multiplier, cell.rng)?;
            records.push(TrialRecord {
                epsilon: cell.epsilon,
                robust_cost: outcome.robust_cost,
                nominal_cost: outcome.nominal_cost,
                ideal_cost: outcome.ideal_cost,
                radius_multiplier: multiplier,
                estimated_radius: Some(trial.estimated_radius()),
                applied_radius: trial.estimated_radius() * multiplier,
                true_radius: trial.true_radius(),
                perturbed_workload: trial.perturbed().clone(),
                true_workload: cell.shape.vector(),
            });
        }
        Ok(records)
    })
}

/// One sweep cell handed to a driver closure.
struct Cell<'a> {
    shape: WorkloadShape,
    epsilon: f64,
    rng: &'a mut RngHandle,
}

fn run_cells<F>(plan: &SweepPlan, body: F) -> Result<SweepReport, VeilError>
where
    F: Fn(&mut Cell<'_>) -> Result<Vec<TrialRecord>, VeilError> + Sync,
{
    let epsilons = plan.epsilon_grid.values();
    let mut cells = Vec::new();
    for shape in &plan.shapes {
        for &epsilon in &epsilons {
            for repeat in 0..plan.repeats.max(1) {
                cells.push((cells.len() as u64, *shape, epsilon, repeat));
            }
        }
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(plan.scheduler.concurrency.max(1))
        .build()
        .map_err(|err| {
            VeilError::Search(
                ErrorInfo::new("thread-pool", "failed to build sweep thread pool")
                    .with_context("cause", err.to_string()),
            )
        })?;

    let results: Result<Vec<(u64, Vec<SweepRow>)>, VeilError> = pool.install(|| {
        cells
            .par_iter()
            .map(|&(index, shape, epsilon, repeat)| {
                let mut rng = match plan.master_seed {
                    Some(master) => RngHandle::from_seed(derive_substream_seed(master, index)),
                    None => RngHandle::from_entropy(),
                };
                let mut cell = Cell {
                    shape,
                    epsilon,
                    rng: &mut rng,
                };
                let records = body(&mut cell)?;
                let rows = records
                    .into_iter()
                    .map(|record| SweepRow {
                        shape,
                        repeat,
                        record,
                    })
                    .collect();
                Ok((index, rows))
            })
            .collect()
    });

    let mut ordered = results?;
    ordered.sort_by_key(|(index, _)| *index);
    let rows = ordered.into_iter().flat_map(|(_, rows)| rows).collect();
    SweepReport::new(plan, rows)
}
