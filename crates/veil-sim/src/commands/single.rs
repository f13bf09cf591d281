//! One-off trial report printed to stdout.

use std::error::Error;

use clap::Args;

use veil_core::{RngHandle, WorkloadShape};
use veil_noise::{LaplaceMechanism, NoiseParameters};
use veil_search::SearchConfig;
use veil_trials::{
    EstimatedRadiusTrial, ReferenceOracle, ReferenceSystem, RobustTarget, TrialContext,
};

/// Arguments for the `single` subcommand.
#[derive(Args, Debug)]
pub struct SingleArgs {
    /// Canonical workload shape to privatize.
    #[arg(long, value_enum, default_value = "uniform")]
    pub shape: ShapeArg,
    /// Privacy level of the mechanism.
    #[arg(long, default_value_t = 0.05)]
    pub epsilon: f64,
    /// Perturbations drawn for the radius estimate.
    #[arg(long, default_value_t = 10)]
    pub samples: usize,
    /// Workload magnification before noise.
    #[arg(long, default_value_t = 1000.0)]
    pub workload_scaler: f64,
    /// Optional seed for reproducible mechanism draws.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Clap-friendly subset of the shape registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ShapeArg {
    /// Equal mass on every class.
    Uniform,
    /// Read-dominated shape.
    Unimodal1,
    /// Write-dominated shape.
    Unimodal4,
    /// Mass split across the read classes.
    Bimodal1,
    /// Mass spread over all classes but writes.
    Trimodal1,
}

impl ShapeArg {
    fn shape(&self) -> WorkloadShape {
        match self {
            ShapeArg::Uniform => WorkloadShape::Uniform,
            ShapeArg::Unimodal1 => WorkloadShape::Unimodal1,
            ShapeArg::Unimodal4 => WorkloadShape::Unimodal4,
            ShapeArg::Bimodal1 => WorkloadShape::Bimodal1,
            ShapeArg::Trimodal1 => WorkloadShape::Trimodal1,
        }
    }
}

/// Runs one estimated-radius trial and prints the results.
pub fn run(args: &SingleArgs, system: &ReferenceSystem) -> Result<(), Box<dyn Error>> {
    let mut rng = match args.seed {
        Some(seed) => RngHandle::from_seed(seed),
        None => RngHandle::from_entropy(),
    };
    let params = NoiseParameters::new(args.workload_scaler, 1.0, 1.0, args.epsilon)?;
    let mechanism = LaplaceMechanism::new(params);
    let original = args.shape.shape().vector();

    let mut trial = EstimatedRadiusTrial::new(
        original.clone(),
        &mechanism,
        args.samples,
        RobustTarget::SingleDraw,
        &mut rng,
    )?;

    let oracle = ReferenceOracle::default();
    let ctx = TrialContext {
        optimizer: &oracle,
        evaluator: &oracle,
        system,
        search: SearchConfig::default(),
    };
    let outcome = trial.run_trial(&ctx, &mut rng)?;

    println!("{}", "=".repeat(65));
    println!("Trial Results");
    println!("{}", "=".repeat(65));
    println!("{:<22}: {:.6}", "Epsilon", trial.epsilon());
    println!("{:<22}: {:.6}", "Estimated radius", trial.estimated_radius());
    println!("{:<22}: {:.6}", "True radius", trial.true_radius());
    println!("{:<22}: {}", "True workload", original);
    println!("{:<22}: {}", "Perturbed workload", trial.perturbed());
    println!();
    println!("Nominal design");
    println!(
        "  bits per entry      : {:.4}",
        outcome.nominal_design.bits_per_entry
    );
    println!(
        "  size ratio          : {:.4}",
        outcome.nominal_design.size_ratio
    );
    println!("Robust design");
    println!(
        "  bits per entry      : {:.4}",
        outcome.robust_design.bits_per_entry
    );
    println!(
        "  size ratio          : {:.4}",
        outcome.robust_design.size_ratio
    );
    println!();
    println!("Cost (true workload)");
    println!("  {:<20}: {:.6}", "Nominal", outcome.nominal_cost);
    println!("  {:<20}: {:.6}", "Robust", outcome.robust_cost);
    println!("{}", "=".repeat(65));
    Ok(())
}
