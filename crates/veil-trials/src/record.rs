//! Tabular trial records and CSV export.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use csv::WriterBuilder;
use serde::{Deserialize, Serialize};

use veil_core::errors::{ErrorInfo, VeilError};
use veil_core::WorkloadVector;

/// One row of experiment output. Field semantics follow the persisted-output
/// contract: costs are true-workload costs, `estimated_radius` is the batch
/// maximum handed to the robust search (absent when the radius was supplied
/// directly) and `applied_radius` is the budget the robust search actually
/// received after any multiplier scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// Privacy level of the mechanism for this row.
    pub epsilon: f64,
    /// True-workload cost of the winning robust design.
    pub robust_cost: f64,
    /// True-workload cost of the winning nominal design.
    pub nominal_cost: f64,
    /// True-workload cost of the ideal nominal design, comparison trials only.
    pub ideal_cost: Option<f64>,
    /// Multiplier applied to the estimated radius (1 when unused).
    pub radius_multiplier: f64,
    /// Batch-maximum radius estimate, when one was computed.
    pub estimated_radius: Option<f64>,
    /// Budget handed to the robust search.
    pub applied_radius: f64,
    /// Realized divergence between the true and the perturbed workload.
    pub true_radius: f64,
    /// The privatized evaluation workload.
    pub perturbed_workload: WorkloadVector,
    /// The hidden true workload.
    pub true_workload: WorkloadVector,
}

/// Column names for trial record tables, in serialization order.
pub fn record_columns() -> Vec<String> {
    [
        "epsilon",
        "robust_cost",
        "nominal_cost",
        "ideal_cost",
        "radius_multiplier",
        "estimated_radius",
        "applied_radius",
        "true_radius",
        "perturbed_workload",
        "true_workload",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl TrialRecord {
    /// Renders the row as CSV cells matching [`record_columns`].
    pub fn to_cells(&self) -> Vec<String> {
        vec![
            format!("{:.6}", self.epsilon),
            format!("{:.6}", self.robust_cost),
            format!("{:.6}", self.nominal_cost),
            self.ideal_cost.map(|c| format!("{c:.6}")).unwrap_or_default(),
            format!("{:.6}", self.radius_multiplier),
            self.estimated_radius
                .map(|r| format!("{r:.6}"))
                .unwrap_or_default(),
            format!("{:.6}", self.applied_radius),
            format!("{:.6}", self.true_radius),
            self.perturbed_workload.to_string(),
            self.true_workload.to_string(),
        ]
    }
}

/// Writes a header plus one line per record to `path`.
pub fn write_records<P: AsRef<Path>>(path: P, records: &[TrialRecord]) -> Result<(), VeilError> {
    let file = File::create(path.as_ref()).map_err(|err| {
        VeilError::Serde(
            ErrorInfo::new("records-create", "failed to create results file")
                .with_context("path", path.as_ref().display().to_string())
                .with_context("cause", err.to_string()),
        )
    })?;
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::new(file));
    writer
        .write_record(record_columns())
        .map_err(|err| wrap_csv("records-header", err))?;
    for record in records {
        writer
            .write_record(record.to_cells())
            .map_err(|err| wrap_csv("records-row", err))?;
    }
    writer
        .flush()
        .map_err(|err| wrap_csv("records-flush", err.into()))?;
    Ok(())
}

pub(crate) fn wrap_csv(code: &str, err: csv::Error) -> VeilError {
    VeilError::Serde(
        ErrorInfo::new(code, "CSV table failure").with_context("cause", err.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TrialRecord {
        let truth = WorkloadVector::uniform(4).unwrap();
        TrialRecord {
            epsilon: 0.05,
            robust_cost: 1.25,
            nominal_cost: 1.5,
            ideal_cost: None,
            radius_multiplier: 1.0,
            estimated_radius: Some(0.8),
            applied_radius: 0.8,
            true_radius: 0.4,
            perturbed_workload: truth.clone(),
            true_workload: truth,
        }
    }

    #[test]
    fn cells_match_columns() {
        let cells = record().to_cells();
        assert_eq!(cells.len(), record_columns().len());
        assert_eq!(cells[0], "0.050000");
        assert!(cells[3].is_empty());
    }
}
