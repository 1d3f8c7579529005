//! # FFT Difference Module
//!
//! Computes the windowed squared-difference function through a
//! cross-correlation in the frequency domain. For a frame `x` of length `N`
//! and window `W = N / 2`,
//!
//! > d(t) = p(0) + p(t) - 2 r(t)
//!
//! where `p(t)` is the energy of `x[t..t + W]` and `r(t)` is the correlation
//! of `x[..W]` with `x[t..t + W]`. Since `t < W`, the circular correlation of
//! length `N` never wraps, so no zero padding is needed.

use std::sync::Arc;

use rustfft::{Fft, FftPlanner, num_complex::Complex};

/// Cached plans and scratch buffers for one frame length.
pub struct FftDifference {
    len: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    signal: Vec<Complex<f32>>,
    window: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl FftDifference {
    /// Plans forward and inverse transforms for frames of `len` samples.
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(len);
        let inverse = planner.plan_fft_inverse(len);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        Self {
            len,
            forward,
            inverse,
            signal: vec![Complex::new(0.0, 0.0); len],
            window: vec![Complex::new(0.0, 0.0); len],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
        }
    }

    /// Frame length these plans were built for.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Writes `d(t)` for `t` in `0..frame.len() / 2` into `result`.
    ///
    /// # Panics
    /// * If `frame.len()` differs from the planned length
    /// * If `result` is shorter than `frame.len() / 2`
    pub fn compute(&mut self, frame: &[f32], result: &mut [f32]) {
        assert_eq!(frame.len(), self.len, "frame length must match the planned FFT size");
        let window_size = frame.len() / 2;
        assert!(result.len() >= window_size);

        for (i, (s, w)) in self.signal.iter_mut().zip(self.window.iter_mut()).enumerate() {
            *s = Complex::new(frame[i], 0.0);
            *w = if i < window_size {
                Complex::new(frame[i], 0.0)
            } else {
                Complex::new(0.0, 0.0)
            };
        }

        self.forward
            .process_with_scratch(&mut self.signal, &mut self.scratch);
        self.forward
            .process_with_scratch(&mut self.window, &mut self.scratch);

        // rustfft leaves both directions unnormalized; divide once by N.
        let normalization = 1.0 / self.len as f32;
        for (s, w) in self.signal.iter_mut().zip(self.window.iter()) {
            *s = *s * w.conj() * normalization;
        }
        self.inverse
            .process_with_scratch(&mut self.signal, &mut self.scratch);

        let power = frame[..window_size].iter().map(|&s| s * s).sum::<f32>();
        let mut windowed_power = power;
        for t in 0..window_size {
            let d = power + windowed_power - 2.0 * self.signal[t].re;
            // Rounding can push exact matches slightly below zero.
            result[t] = d.max(0.0);
            windowed_power = windowed_power - frame[t] * frame[t]
                + frame[t + window_size] * frame[t + window_size];
        }
        result[0] = 0.0;
    }
}
