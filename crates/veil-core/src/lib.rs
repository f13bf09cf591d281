#![deny(missing_docs)]
#![doc = "Core data types for the VEIL privacy-budgeted robust-search engine."]

pub mod errors;
pub mod rng;
pub mod shapes;
pub mod workload;

pub use errors::{ErrorInfo, VeilError};
pub use rng::{derive_substream_seed, RngHandle};
pub use shapes::WorkloadShape;
pub use workload::{WorkloadVector, CANONICAL_CLASSES, NORMALIZATION_TOLERANCE};
