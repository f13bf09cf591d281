//! Initialization-parameter domain for the external optimizer.
//!
//! The ranges belong to the external optimizer's valid input space; this
//! crate only samples from them. Values here mirror the reference solver's
//! defaults and are overridable through sweep plans.

use rand::Rng;
use serde::{Deserialize, Serialize};

use veil_core::RngHandle;

/// Initialization seeds for a nominal optimization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NominalInit {
    /// Discrete memory-bits starting point.
    pub bits: i64,
    /// Continuous size-ratio starting point.
    pub ratio: f64,
}

/// Initialization seeds for a robust optimization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RobustInit {
    /// Discrete memory-bits starting point.
    pub bits: i64,
    /// Continuous size-ratio starting point.
    pub ratio: f64,
    /// Lagrange weight on the cost term of the robust objective.
    pub lagrange_cost: f64,
    /// Lagrange weight on the divergence-budget term.
    pub lagrange_kl: f64,
}

/// Sampling ranges for candidate initialization tuples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitDomain {
    /// Inclusive-exclusive range for the discrete memory-bits dimension.
    #[serde(default = "default_bits_range")]
    pub bits_range: (i64, i64),
    /// Half-open range for the continuous size-ratio dimension.
    #[serde(default = "default_ratio_range")]
    pub ratio_range: (f64, f64),
    /// Half-open range shared by both Lagrange weights in robust mode.
    #[serde(default = "default_weight_range")]
    pub weight_range: (f64, f64),
}

fn default_bits_range() -> (i64, i64) {
    (1, 10)
}

fn default_ratio_range() -> (f64, f64) {
    (2.0, 31.0)
}

fn default_weight_range() -> (f64, f64) {
    (0.0, 10.0)
}

impl Default for InitDomain {
    fn default() -> Self {
        Self {
            bits_range: default_bits_range(),
            ratio_range: default_ratio_range(),
            weight_range: default_weight_range(),
        }
    }
}

impl InitDomain {
    /// Draws a random nominal initialization tuple.
    pub fn sample_nominal(&self, rng: &mut RngHandle) -> NominalInit {
        NominalInit {
            bits: rng.inner_mut().gen_range(self.bits_range.0..self.bits_range.1),
            ratio: rng
                .inner_mut()
                .gen_range(self.ratio_range.0..self.ratio_range.1),
        }
    }

    /// Draws a random robust initialization tuple.
    pub fn sample_robust(&self, rng: &mut RngHandle) -> RobustInit {
        RobustInit {
            bits: rng.inner_mut().gen_range(self.bits_range.0..self.bits_range.1),
            ratio: rng
                .inner_mut()
                .gen_range(self.ratio_range.0..self.ratio_range.1),
            lagrange_cost: rng
                .inner_mut()
                .gen_range(self.weight_range.0..self.weight_range.1),
            lagrange_kl: rng
                .inner_mut()
                .gen_range(self.weight_range.0..self.weight_range.1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_stay_inside_the_domain() {
        let domain = InitDomain::default();
        let mut rng = RngHandle::from_seed(23);
        for _ in 0..128 {
            let nominal = domain.sample_nominal(&mut rng);
            assert!(nominal.bits >= domain.bits_range.0 && nominal.bits < domain.bits_range.1);
            assert!(nominal.ratio >= domain.ratio_range.0 && nominal.ratio < domain.ratio_range.1);

            let robust = domain.sample_robust(&mut rng);
            assert!(robust.lagrange_cost >= domain.weight_range.0);
            assert!(robust.lagrange_cost < domain.weight_range.1);
            assert!(robust.lagrange_kl >= domain.weight_range.0);
            assert!(robust.lagrange_kl < domain.weight_range.1);
        }
    }
}
