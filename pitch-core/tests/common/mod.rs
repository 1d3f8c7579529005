//! Synthetic signals shared by the integration tests.
#![allow(dead_code)]

pub fn sin_wave(freq: f32, size: usize, sample_rate: u32) -> Vec<f32> {
    let dx = 2.0 * std::f32::consts::PI * freq / sample_rate as f32;
    (0..size).map(|i| (i as f32 * dx).sin()).collect()
}

pub fn square_wave(freq: f32, size: usize, sample_rate: u32) -> Vec<f32> {
    let period = sample_rate as f32 / freq;
    (0..size)
        .map(|i| {
            let x = i as f32 / period;
            if x - x.floor() >= 0.5 { -1.0 } else { 1.0 }
        })
        .collect()
}

pub fn triangle_wave(freq: f32, size: usize, sample_rate: u32) -> Vec<f32> {
    let period = sample_rate as f32 / freq;
    (0..size)
        .map(|i| {
            let x = i as f32 / period;
            let frac = x - x.floor();
            match frac {
                f if f < 0.25 => 4. * f,
                f if f < 0.75 => 1. - 4. * (f - 0.25),
                f => -1. + 4. * (f - 0.75),
            }
        })
        .collect()
}

/// Scales a signal, as a quiet microphone would.
pub fn scaled(signal: Vec<f32>, gain: f32) -> Vec<f32> {
    signal.into_iter().map(|s| s * gain).collect()
}

pub fn silence(size: usize) -> Vec<f32> {
    vec![0.0; size]
}
