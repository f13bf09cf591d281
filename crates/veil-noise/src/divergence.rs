//! Directional Kullback-Leibler divergence between workload vectors.

use veil_core::{VeilError, WorkloadVector};

/// Floor applied by [`clip_components`] for callers holding raw solver output.
pub const RAW_COMPONENT_FLOOR: f64 = 1e-12;

/// Computes `sum_i p_i * ln(p_i / q_i)`.
///
/// The metric is directional: `kl_divergence(p, q)` and `kl_divergence(q, p)`
/// differ in general, and callers must keep their argument order consistent.
/// Validated [`WorkloadVector`] inputs are strictly positive, so no clipping
/// happens here; unequal lengths fail with a shape-mismatch error.
pub fn kl_divergence(p: &WorkloadVector, q: &WorkloadVector) -> Result<f64, VeilError> {
    kl_divergence_raw(p.components(), q.components())
}

/// Raw-slice variant of [`kl_divergence`] for callers outside the validated
/// path. Slices containing zeros or negatives must be passed through
/// [`clip_components`] first; this function does not clip.
pub fn kl_divergence_raw(p: &[f64], q: &[f64]) -> Result<f64, VeilError> {
    if p.len() != q.len() {
        return Err(VeilError::shape_mismatch(p.len(), q.len()));
    }
    Ok(p.iter()
        .zip(q.iter())
        .map(|(&pi, &qi)| pi * (pi / qi).ln())
        .sum())
}

/// Clips raw components to [`RAW_COMPONENT_FLOOR`], the documented duty of any
/// caller feeding unvalidated vectors (e.g. candidate solutions from an
/// external constrained optimizer) into the divergence.
pub fn clip_components(raw: &[f64]) -> Vec<f64> {
    raw.iter().map(|&v| v.max(RAW_COMPONENT_FLOOR)).collect()
}
