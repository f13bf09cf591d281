#![deny(missing_docs)]
#![doc = "Admission-filtered random-restart search over external design optimizers."]

pub mod domain;
pub mod oracle;
pub mod restart;

pub use domain::{InitDomain, NominalInit, RobustInit};
pub use oracle::{CostEvaluator, DesignOptimizer, Evaluation};
pub use restart::{best_design, SearchConfig, SearchMode, SearchOutcome};
