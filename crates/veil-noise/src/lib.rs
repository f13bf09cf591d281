#![deny(missing_docs)]
#![doc = "Perturbation mechanism, divergence metric and uncertainty-radius estimator."]

pub mod divergence;
pub mod mechanism;
pub mod radius;

pub use divergence::{clip_components, kl_divergence, kl_divergence_raw, RAW_COMPONENT_FLOOR};
pub use mechanism::{LaplaceMechanism, NoiseParameters, PERTURBATION_FLOOR};
pub use radius::{average_workload, estimate_radius};
