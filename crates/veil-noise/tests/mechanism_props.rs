use proptest::prelude::*;

use veil_core::{RngHandle, WorkloadVector};
use veil_noise::{estimate_radius, kl_divergence, LaplaceMechanism, NoiseParameters};

fn workload_strategy() -> impl Strategy<Value = WorkloadVector> {
    prop::collection::vec(0.01f64..1.0, 2..8).prop_map(|raw| {
        WorkloadVector::normalized(raw).expect("positive components normalize")
    })
}

proptest! {
    #[test]
    fn perturbation_preserves_validity(
        seed in any::<u64>(),
        workload in workload_strategy(),
        epsilon in 0.05f64..2.0,
        scaler in 10.0f64..1000.0,
    ) {
        let params = NoiseParameters::new(scaler, 1.0, 1.0, epsilon).expect("valid params");
        let mechanism = LaplaceMechanism::new(params);
        let mut rng = RngHandle::from_seed(seed);
        let noisy = mechanism.perturb(&workload, &mut rng);

        let sum: f64 = noisy.components().iter().sum();
        prop_assert!((sum - 1.0).abs() < 1e-9);
        prop_assert!(noisy.components().iter().all(|&c| c > 0.0));
        prop_assert_eq!(noisy.len(), workload.len());
    }

    #[test]
    fn self_divergence_is_zero(workload in workload_strategy()) {
        let d = kl_divergence(&workload, &workload).expect("equal lengths");
        prop_assert!(d.abs() < 1e-12);
    }

    #[test]
    fn perturbed_divergence_is_finite(
        seed in any::<u64>(),
        workload in workload_strategy(),
        epsilon in 0.05f64..1.0,
    ) {
        let params = NoiseParameters::new(100.0, 1.0, 1.0, epsilon).expect("valid params");
        let mechanism = LaplaceMechanism::new(params);
        let mut rng = RngHandle::from_seed(seed);
        let noisy = mechanism.perturb(&workload, &mut rng);
        let d = kl_divergence(&workload, &noisy).expect("equal lengths");
        prop_assert!(d.is_finite());
    }

    #[test]
    fn radius_grows_with_replayed_batches(
        seed in any::<u64>(),
        small in 1usize..5,
        extra in 0usize..20,
    ) {
        let truth = WorkloadVector::uniform(4).expect("uniform");
        let params = NoiseParameters::new(100.0, 1.0, 1.0, 0.05).expect("valid params");
        let mechanism = LaplaceMechanism::new(params);

        let mut rng_a = RngHandle::from_seed(seed);
        let first = estimate_radius(&truth, &mechanism, small, &mut rng_a).expect("radius");
        let mut rng_b = RngHandle::from_seed(seed);
        let second =
            estimate_radius(&truth, &mechanism, small + extra, &mut rng_b).expect("radius");
        prop_assert!(second >= first);
    }
}
