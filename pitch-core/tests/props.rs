use proptest::prelude::*;

use pitch_core::aggregator::finalize_run;
use pitch_core::pitch::{cumulative_mean_normalized, difference_function};
use pitch_core::preprocess::normalize;
use pitch_core::{DifferenceMethod, Error, OutlierBand, PeriodEstimator};

fn frame(len: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-1.0f32..1.0, len)
}

proptest! {
    #[test]
    fn normalized_peak_is_one(samples in prop::collection::vec(-10.0f32..10.0, 1..256)) {
        match normalize(&samples) {
            Ok(normalized) => {
                let peak = normalized.iter().fold(0.0f32, |p, s| p.max(s.abs()));
                prop_assert!((peak - 1.0).abs() < 1e-6);
            }
            Err(Error::DegenerateFrame { .. }) => {
                prop_assert!(samples.iter().all(|s| *s == 0.0));
            }
            Err(err) => prop_assert!(false, "unexpected error {}", err),
        }
    }

    #[test]
    fn cumulative_is_anchored_and_non_negative(samples in frame(128)) {
        let mut difference = vec![0.0; 64];
        let mut cumulative = vec![0.0; 64];
        difference_function(&samples, &mut difference);
        cumulative_mean_normalized(&difference, &mut cumulative);

        prop_assert_eq!(difference[0], 0.0);
        prop_assert_eq!(cumulative[0], 1.0);
        prop_assert!(cumulative.iter().all(|v| *v >= 0.0 && v.is_finite()));
    }

    #[test]
    fn estimate_is_absent_or_in_range(samples in frame(256), fft in any::<bool>()) {
        let method = if fft { DifferenceMethod::Fft } else { DifferenceMethod::Direct };
        let mut estimator = PeriodEstimator::new(0.1, method);
        if let Some(frequency) = estimator.estimate(&samples, 8000) {
            prop_assert!(frequency.is_finite());
            // lag lies in (0, N/2)
            prop_assert!(frequency > 8000.0 / 128.0 - 1.0);
        }
    }

    #[test]
    fn finalized_pitch_accounts_for_every_estimate(
        run in prop::collection::vec(300.0f32..2000.0, 1..32)
    ) {
        if let Some(pitch) = finalize_run(&run, OutlierBand::default()) {
            prop_assert_eq!(pitch.kept + pitch.rejected, run.len());
            prop_assert!(pitch.kept > 0);
            let lo = run.iter().copied().fold(f32::INFINITY, f32::min);
            let hi = run.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            prop_assert!(pitch.frequency >= lo - 1e-3 && pitch.frequency <= hi + 1e-3);
        }
    }
}
