//! `veil-sim`: CLI driver for privacy-robustness experiments.

use std::error::Error;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use veil_core::RngHandle;
use veil_trials::ReferenceSystem;

use commands::single::{self, SingleArgs};
use commands::sweep::{self, SweepArgs, SweepKind};

mod commands;

/// Seed for the per-process system sampler; every trial within a run shares
/// the same system description.
const SYSTEM_SEED: u64 = 42;

#[derive(Parser, Debug)]
#[command(name = "veil-sim", about = "VEIL privacy-robustness experiment CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one estimated-radius trial and print the report.
    Single(SingleArgs),
    /// Sweep radius multipliers across shapes and privacy levels.
    MultiplierSweep(SweepArgs),
    /// Sweep a predefined radius grid across shapes and privacy levels.
    RadiusSweep(SweepArgs),
    /// Compare ideal, nominal and robust regimes across shapes.
    Compare(SweepArgs),
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let mut system_rng = RngHandle::from_seed(SYSTEM_SEED);
    let system = ReferenceSystem::sample(&mut system_rng);
    match &cli.command {
        Command::Single(args) => single::run(args, &system),
        Command::MultiplierSweep(args) => sweep::run(SweepKind::Multiplier, args, &system),
        Command::RadiusSweep(args) => sweep::run(SweepKind::PredefinedRadius, args, &system),
        Command::Compare(args) => sweep::run(SweepKind::Comparison, args, &system),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("veil-sim: {err}");
            ExitCode::FAILURE
        }
    }
}
