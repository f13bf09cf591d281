#![deny(missing_docs)]
#![doc = "Trial orchestration, sweep execution and result registries for VEIL experiments."]

mod comparison;
mod estimated;
mod hash;
mod multiplier;
mod predefined;
mod record;
mod reference;
mod registry;
mod single;
mod sweep;
mod trial;

pub use comparison::RobustVersusNominalTrial;
pub use estimated::{EstimatedRadiusTrial, RobustTarget};
pub use hash::stable_hash_string;
pub use multiplier::RadiusMultiplierTrial;
pub use predefined::PredefinedRadiusTrial;
pub use record::{record_columns, write_records, TrialRecord};
pub use reference::{ReferenceOracle, ReferenceSystem, TuningDesign};
pub use registry::{registry_append, registry_query, Query, Registry, Table};
pub use single::{SingleDrawTrial, DEFAULT_RADIUS};
pub use sweep::{
    run_comparison_sweep, run_multiplier_sweep, run_predefined_radius_sweep, GridSpec, NoiseSpec,
    Scheduler, SweepPlan, SweepReport, SweepRow,
};
pub use trial::{TrialContext, TrialOutcome};
