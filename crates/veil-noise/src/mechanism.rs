//! Laplace perturbation of workload vectors.
//!
//! The mechanism scales a workload into absolute magnitudes, adds
//! zero-centred Laplace noise calibrated by `sensitivity / epsilon`, scales
//! back, clips to a positive floor and renormalizes. The floor trades a small
//! boundary information leak for strictly positive outputs, so downstream
//! divergence computations never divide by or take the log of zero. Callers
//! must treat the output as a calibrated approximation, not a certified
//! epsilon-DP release.

use rand::Rng;
use serde::{Deserialize, Serialize};

use veil_core::errors::{ErrorInfo, VeilError};
use veil_core::{RngHandle, WorkloadVector};

/// Minimum value any perturbed component may take before renormalization.
pub const PERTURBATION_FLOOR: f64 = 0.01;

/// Calibration parameters for the Laplace mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseParameters {
    /// Magnification applied to the workload before noise is added.
    pub workload_scaler: f64,
    /// Multiplier applied to every Laplace draw.
    pub noise_scaler: f64,
    /// How much the scaled output may change when one input record changes.
    pub sensitivity: f64,
    /// Privacy level; smaller values inject more noise.
    pub epsilon: f64,
}

impl NoiseParameters {
    /// Validates and builds a parameter set.
    pub fn new(
        workload_scaler: f64,
        noise_scaler: f64,
        sensitivity: f64,
        epsilon: f64,
    ) -> Result<Self, VeilError> {
        if !(epsilon > 0.0) {
            return Err(VeilError::Estimator(
                ErrorInfo::new("bad-epsilon", "epsilon must be positive")
                    .with_context("epsilon", epsilon.to_string()),
            ));
        }
        if !(workload_scaler > 0.0) {
            return Err(VeilError::Estimator(
                ErrorInfo::new("bad-scaler", "workload scaler must be positive")
                    .with_context("workload_scaler", workload_scaler.to_string()),
            ));
        }
        Ok(Self {
            workload_scaler,
            noise_scaler,
            sensitivity,
            epsilon,
        })
    }

    /// Scale of the Laplace distribution: `sensitivity / epsilon`.
    pub fn spread(&self) -> f64 {
        self.sensitivity / self.epsilon
    }
}

/// Applies calibrated Laplace noise to workload vectors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaplaceMechanism {
    params: NoiseParameters,
}

impl LaplaceMechanism {
    /// Creates a mechanism from validated parameters.
    pub fn new(params: NoiseParameters) -> Self {
        Self { params }
    }

    /// Returns the calibration parameters.
    pub fn params(&self) -> &NoiseParameters {
        &self.params
    }

    /// Produces a privatized copy of `vector`.
    ///
    /// Pure given the RNG: every call draws one Laplace sample per component,
    /// clips at [`PERTURBATION_FLOOR`] and renormalizes, so the output is
    /// always a valid probability vector.
    pub fn perturb(&self, vector: &WorkloadVector, rng: &mut RngHandle) -> WorkloadVector {
        let scale = self.params.workload_scaler;
        let spread = self.params.spread();
        let mut noisy = Vec::with_capacity(vector.len());
        for &w in vector.components() {
            let scaled = w * scale;
            let noise = laplace_draw(spread, rng) * self.params.noise_scaler;
            let unscaled = (scaled + noise) / scale;
            noisy.push(unscaled.max(PERTURBATION_FLOOR));
        }
        WorkloadVector::normalized(noisy)
            .unwrap_or_else(|_| unreachable!("floored components are positive and finite"))
    }

    /// Draws `count` independent perturbations of `vector`.
    pub fn perturb_many(
        &self,
        vector: &WorkloadVector,
        count: usize,
        rng: &mut RngHandle,
    ) -> Vec<WorkloadVector> {
        (0..count).map(|_| self.perturb(vector, rng)).collect()
    }
}

/// Samples the Laplace distribution with the given scale by inverse CDF.
fn laplace_draw(scale: f64, rng: &mut RngHandle) -> f64 {
    // u == -0.5 would take the log of zero; redraw the endpoint.
    let u = loop {
        let candidate: f64 = rng.inner_mut().gen_range(-0.5..0.5);
        if candidate != -0.5 {
            break candidate;
        }
    };
    -scale * u.signum() * (1.0 - 2.0 * u.abs()).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_epsilon() {
        let err = NoiseParameters::new(100.0, 1.0, 1.0, 0.0).unwrap_err();
        assert_eq!(err.info().code, "bad-epsilon");
    }

    #[test]
    fn spread_is_sensitivity_over_epsilon() {
        let params = NoiseParameters::new(100.0, 1.0, 2.0, 0.5).unwrap();
        assert!((params.spread() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn perturbed_output_is_normalized() {
        // Scenario: uniform truth, heavy noise at epsilon = 0.05.
        let params = NoiseParameters::new(100.0, 1.0, 1.0, 0.05).unwrap();
        let mechanism = LaplaceMechanism::new(params);
        let truth = WorkloadVector::uniform(4).unwrap();
        let mut rng = RngHandle::from_seed(7);
        for _ in 0..32 {
            let noisy = mechanism.perturb(&truth, &mut rng);
            let sum: f64 = noisy.components().iter().sum();
            assert!((sum - 1.0).abs() < 1e-9);
            // Post-floor, post-renormalization components stay well above zero.
            assert!(noisy.components().iter().all(|&c| c >= 1e-4));
        }
    }

    #[test]
    fn params_roundtrip_through_json() {
        let params = NoiseParameters::new(100.0, 1.0, 1.0, 0.05).unwrap();
        let text = serde_json::to_string(&params).unwrap();
        let back: NoiseParameters = serde_json::from_str(&text).unwrap();
        assert_eq!(params, back);
    }

    #[test]
    fn laplace_draws_are_zero_centred() {
        let mut rng = RngHandle::from_seed(11);
        let mean: f64 =
            (0..20_000).map(|_| laplace_draw(1.0, &mut rng)).sum::<f64>() / 20_000.0;
        assert!(mean.abs() < 0.05, "sample mean {mean}");
    }
}
