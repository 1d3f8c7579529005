//! # Period Estimation Module
//!
//! Estimates the fundamental frequency of a normalized frame using the YIN
//! difference function and its cumulative mean normalization.
//!
//! ## Steps
//! - Squared-difference function over lags `1..N/2`
//! - Cumulative mean normalized difference (CMND), `cumulative[0] = 1`
//! - First lag below the threshold, walked forward to the local minimum
//! - Parabolic interpolation for sub-sample accuracy
//!
//! A frame without a sub-threshold lag yields `None`. That is the normal
//! outcome for silence and noise, not a failure.

use crate::config::{DifferenceMethod, PitchConfig};
use crate::fft::FftDifference;

/// Fills `result[t]` with `Σ_{i<W} (buffer[i] - buffer[i+t])²` for `t` in `1..W`,
/// where `W = buffer.len() / 2`. `result[0]` is set to zero.
///
/// # Panics
/// * If `result` is shorter than `buffer.len() / 2`
pub fn difference_function(buffer: &[f32], result: &mut [f32]) {
    let max_lag = buffer.len() / 2;
    assert!(result.len() >= max_lag);
    if max_lag == 0 {
        return;
    }

    result[0] = 0.0;
    for tau in 1..max_lag {
        let mut diff = 0.0;
        for i in 0..max_lag {
            let delta = buffer[i] - buffer[i + tau];
            diff += delta * delta;
        }
        result[tau] = diff;
    }
}

/// Computes the cumulative mean normalized difference of `difference` into `cumulative`.
///
/// `cumulative[0]` is always 1. A lag whose running sum is still zero is also
/// assigned 1, so it can never be picked as a period.
pub fn cumulative_mean_normalized(difference: &[f32], cumulative: &mut [f32]) {
    assert!(cumulative.len() >= difference.len());
    if difference.is_empty() {
        return;
    }

    cumulative[0] = 1.0;
    let mut running_sum = 0.0;
    for tau in 1..difference.len() {
        running_sum += difference[tau];
        cumulative[tau] = if running_sum > 0.0 {
            difference[tau] * tau as f32 / running_sum
        } else {
            1.0
        };
    }
}

/// Finds the first lag whose CMND drops below `threshold`, then follows the
/// curve down to its local minimum.
///
/// Returns `None` if the search space is exhausted.
pub fn find_period(cumulative: &[f32], threshold: f32) -> Option<usize> {
    let max_lag = cumulative.len();
    let mut tau = (1..max_lag).find(|&t| cumulative[t] < threshold)?;

    while tau + 1 < max_lag && cumulative[tau + 1] < cumulative[tau] {
        tau += 1;
    }

    (cumulative[tau] < threshold).then_some(tau)
}

/// Refines an integer lag with a parabola through its two neighbours.
///
/// Falls back to `tau` itself when a neighbour is missing or the parabola is flat.
pub fn refine_period(cumulative: &[f32], tau: usize) -> f32 {
    if tau == 0 || tau + 1 >= cumulative.len() {
        return tau as f32;
    }

    let x0 = cumulative[tau - 1];
    let x1 = cumulative[tau];
    let x2 = cumulative[tau + 1];

    let denominator = 2.0 * (2.0 * x1 - x2 - x0);
    if denominator == 0.0 {
        return tau as f32;
    }
    let shift = (x2 - x0) / denominator;
    if shift.is_finite() && shift.abs() < 1.0 {
        tau as f32 + shift
    } else {
        tau as f32
    }
}

/// YIN period estimator with reusable work buffers.
pub struct PeriodEstimator {
    threshold: f32,
    method: DifferenceMethod,
    difference: Vec<f32>,
    cumulative: Vec<f32>,
    fft: Option<FftDifference>,
}

impl PeriodEstimator {
    pub fn new(threshold: f32, method: DifferenceMethod) -> Self {
        Self {
            threshold,
            method,
            difference: Vec::new(),
            cumulative: Vec::new(),
            fft: None,
        }
    }

    pub fn from_config(config: &PitchConfig) -> Self {
        let mut estimator = Self::new(config.threshold, config.difference);
        estimator.prepare(config.frame_length);
        estimator
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// CMND of the last analyzed frame.
    pub fn cumulative(&self) -> &[f32] {
        &self.cumulative
    }

    /// Estimates the pitch of a normalized frame in Hz.
    ///
    /// # Returns
    /// * `Some(frequency)` - positive, finite frequency
    /// * `None` - no period below the threshold, a frame too short to search,
    ///   or non-finite samples
    pub fn estimate(&mut self, frame: &[f32], sample_rate: u32) -> Option<f32> {
        let max_lag = frame.len() / 2;
        if max_lag < 2 || sample_rate == 0 {
            return None;
        }
        if frame.iter().any(|s| !s.is_finite()) {
            log::trace!("non-finite samples in frame, no pitch");
            return None;
        }

        self.prepare(frame.len());
        match self.method {
            DifferenceMethod::Direct => difference_function(frame, &mut self.difference),
            DifferenceMethod::Fft => {
                let fft = self
                    .fft
                    .get_or_insert_with(|| FftDifference::new(frame.len()));
                fft.compute(frame, &mut self.difference);
            }
        }
        cumulative_mean_normalized(&self.difference, &mut self.cumulative);

        let tau = find_period(&self.cumulative, self.threshold)?;
        let better_tau = refine_period(&self.cumulative, tau);

        let frequency = sample_rate as f32 / better_tau;
        if frequency.is_finite() && frequency > 0.0 {
            Some(frequency)
        } else {
            None
        }
    }

    fn prepare(&mut self, frame_length: usize) {
        let max_lag = frame_length / 2;
        self.difference.resize(max_lag, 0.0);
        self.cumulative.resize(max_lag, 0.0);
        if self.method == DifferenceMethod::Fft
            && self.fft.as_ref().is_some_and(|fft| fft.len() != frame_length)
        {
            self.fft = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sine(freq: f32, size: usize, sample_rate: u32) -> Vec<f32> {
        let dx = 2.0 * std::f32::consts::PI * freq / sample_rate as f32;
        (0..size).map(|i| (i as f32 * dx).sin()).collect()
    }

    #[test]
    fn difference_of_small_signal() {
        let signal = [0., 1., 2., 0., -1., -2.];
        let mut result = [0.0; 3];
        difference_function(&signal, &mut result);
        // t=1: (0-1)² + (1-2)² + (2-0)², t=2: (0-2)² + (1-0)² + (2+1)²
        assert_eq!(result, [0.0, 6.0, 14.0]);
    }

    #[test]
    fn cumulative_of_small_signal() {
        let difference = [0., 6., 14.];
        let mut cumulative = [0.0; 3];
        cumulative_mean_normalized(&difference, &mut cumulative);
        assert_eq!(cumulative, [1., 1., 2. * 14. / (6. + 14.)]);
    }

    #[test]
    fn zero_difference_never_divides_by_zero() {
        let mut cumulative = [0.0; 4];
        cumulative_mean_normalized(&[0.0; 4], &mut cumulative);
        assert_eq!(cumulative, [1.0; 4]);
    }

    #[test]
    fn walks_to_local_minimum() {
        let cumulative = [1.0, 0.8, 0.09, 0.05, 0.02, 0.04, 0.3];
        assert_eq!(find_period(&cumulative, 0.1), Some(4));
    }

    #[test]
    fn nothing_below_threshold() {
        let cumulative = [1.0, 0.8, 0.5, 0.3, 0.2];
        assert_eq!(find_period(&cumulative, 0.1), None);
    }

    #[test]
    fn boundary_lag_skips_interpolation() {
        // The minimum sits at the last lag, so there is no right neighbour.
        let cumulative = [1.0, 0.9, 0.5, 0.05];
        assert_eq!(find_period(&cumulative, 0.1), Some(3));
        assert_eq!(refine_period(&cumulative, 3), 3.0);
    }

    #[test]
    fn flat_minimum_falls_back_to_integer_lag() {
        let cumulative = [1.0, 0.05, 0.05, 0.05];
        assert_eq!(refine_period(&cumulative, 2), 2.0);
    }

    #[test]
    fn parabola_vertex() {
        // y = (x - 2.25)² sampled at 1, 2, 3
        let cumulative = [1.0, 1.5625, 0.0625, 0.5625];
        assert_relative_eq!(refine_period(&cumulative, 2), 2.25, epsilon = 1e-6);
    }

    #[test]
    fn estimates_sine() {
        let frame = sine(440.0, 2048, 44100);
        let mut estimator = PeriodEstimator::new(0.1, DifferenceMethod::Direct);
        let frequency = estimator.estimate(&frame, 44100).unwrap();
        assert_relative_eq!(frequency, 440.0, max_relative = 0.01);
        assert_eq!(estimator.cumulative()[0], 1.0);
    }

    #[test]
    fn silent_frame_has_no_pitch() {
        let mut estimator = PeriodEstimator::new(0.1, DifferenceMethod::Direct);
        assert_eq!(estimator.estimate(&[0.0; 1024], 44100), None);
    }

    #[test]
    fn short_and_non_finite_frames() {
        let mut estimator = PeriodEstimator::new(0.1, DifferenceMethod::Direct);
        assert_eq!(estimator.estimate(&[0.5, -0.5, 0.5], 44100), None);
        assert_eq!(estimator.estimate(&[f32::NAN; 64], 44100), None);
    }

    #[test]
    fn fft_method_agrees_with_direct() {
        let frame = sine(660.0, 1024, 48000);
        let mut direct = PeriodEstimator::new(0.1, DifferenceMethod::Direct);
        let mut fft = PeriodEstimator::new(0.1, DifferenceMethod::Fft);
        let a = direct.estimate(&frame, 48000).unwrap();
        let b = fft.estimate(&frame, 48000).unwrap();
        assert_relative_eq!(a, b, max_relative = 0.001);
    }
}
