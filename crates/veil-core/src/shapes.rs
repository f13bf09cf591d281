//! Immutable registry of canonical workload shapes.
//!
//! Each shape maps to a fixed probability vector over the four canonical
//! operation classes. Vectors are rebuilt on every call and returned by value,
//! so callers can never observe shared mutable state.

use serde::{Deserialize, Serialize};

use crate::workload::WorkloadVector;

/// Canonical workload shapes used by sweep drivers and experiments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkloadShape {
    /// Equal mass on every operation class.
    Uniform,
    /// Mass concentrated on empty point reads.
    Unimodal1,
    /// Mass concentrated on point reads.
    Unimodal2,
    /// Mass concentrated on range scans.
    Unimodal3,
    /// Mass concentrated on writes.
    Unimodal4,
    /// Mass split between the two read classes.
    Bimodal1,
    /// Mass split between empty point reads and range scans.
    Bimodal2,
    /// Mass split between empty point reads and writes.
    Bimodal3,
    /// Mass split between point reads and writes.
    Bimodal4,
    /// Mass split between range scans and writes.
    Bimodal5,
    /// Mass spread over all classes but writes.
    Trimodal1,
    /// Mass spread over all classes but range scans.
    Trimodal2,
    /// Mass spread over all classes but point reads.
    Trimodal3,
    /// Mass spread over all classes but empty point reads.
    Trimodal4,
}

impl WorkloadShape {
    /// Stable numeric identifier for registry rows.
    pub fn id(&self) -> u32 {
        match self {
            WorkloadShape::Uniform => 0,
            WorkloadShape::Unimodal1 => 1,
            WorkloadShape::Unimodal2 => 2,
            WorkloadShape::Unimodal3 => 3,
            WorkloadShape::Unimodal4 => 4,
            WorkloadShape::Bimodal1 => 5,
            WorkloadShape::Bimodal2 => 6,
            WorkloadShape::Bimodal3 => 7,
            WorkloadShape::Bimodal4 => 8,
            WorkloadShape::Bimodal5 => 9,
            WorkloadShape::Trimodal1 => 10,
            WorkloadShape::Trimodal2 => 11,
            WorkloadShape::Trimodal3 => 12,
            WorkloadShape::Trimodal4 => 13,
        }
    }

    /// Family tag grouping shapes with the same number of dominant classes.
    pub fn tag(&self) -> &'static str {
        match self {
            WorkloadShape::Uniform => "uniform",
            WorkloadShape::Unimodal1
            | WorkloadShape::Unimodal2
            | WorkloadShape::Unimodal3
            | WorkloadShape::Unimodal4 => "unimodal",
            WorkloadShape::Bimodal1
            | WorkloadShape::Bimodal2
            | WorkloadShape::Bimodal3
            | WorkloadShape::Bimodal4
            | WorkloadShape::Bimodal5 => "bimodal",
            WorkloadShape::Trimodal1
            | WorkloadShape::Trimodal2
            | WorkloadShape::Trimodal3
            | WorkloadShape::Trimodal4 => "trimodal",
        }
    }

    /// Returns the fixed probability vector for this shape, by value.
    pub fn vector(&self) -> WorkloadVector {
        let mix = match self {
            WorkloadShape::Uniform => [0.25, 0.25, 0.25, 0.25],
            WorkloadShape::Unimodal1 => [0.97, 0.01, 0.01, 0.01],
            WorkloadShape::Unimodal2 => [0.01, 0.97, 0.01, 0.01],
            WorkloadShape::Unimodal3 => [0.01, 0.01, 0.97, 0.01],
            WorkloadShape::Unimodal4 => [0.01, 0.01, 0.01, 0.97],
            WorkloadShape::Bimodal1 => [0.49, 0.49, 0.01, 0.01],
            WorkloadShape::Bimodal2 => [0.49, 0.01, 0.49, 0.01],
            WorkloadShape::Bimodal3 => [0.49, 0.01, 0.01, 0.49],
            WorkloadShape::Bimodal4 => [0.01, 0.49, 0.01, 0.49],
            WorkloadShape::Bimodal5 => [0.01, 0.01, 0.49, 0.49],
            WorkloadShape::Trimodal1 => [0.33, 0.33, 0.33, 0.01],
            WorkloadShape::Trimodal2 => [0.33, 0.33, 0.01, 0.33],
            WorkloadShape::Trimodal3 => [0.33, 0.01, 0.33, 0.33],
            WorkloadShape::Trimodal4 => [0.01, 0.33, 0.33, 0.33],
        };
        WorkloadVector::from_mix(mix[0], mix[1], mix[2], mix[3])
            .unwrap_or_else(|_| unreachable!("canonical shapes are valid by construction"))
    }

    /// Enumerates every canonical shape in registry order.
    pub fn all() -> Vec<WorkloadShape> {
        vec![
            WorkloadShape::Uniform,
            WorkloadShape::Unimodal1,
            WorkloadShape::Unimodal2,
            WorkloadShape::Unimodal3,
            WorkloadShape::Unimodal4,
            WorkloadShape::Bimodal1,
            WorkloadShape::Bimodal2,
            WorkloadShape::Bimodal3,
            WorkloadShape::Bimodal4,
            WorkloadShape::Bimodal5,
            WorkloadShape::Trimodal1,
            WorkloadShape::Trimodal2,
            WorkloadShape::Trimodal3,
            WorkloadShape::Trimodal4,
        ]
    }

    /// Human readable label used in file names and registry rows.
    pub fn label(&self) -> String {
        format!("{}-{}", self.tag(), self.id())
    }
}
