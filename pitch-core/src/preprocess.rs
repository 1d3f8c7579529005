//! # Signal Preprocessing Module
//!
//! Scales a raw sample frame so that its peak absolute amplitude is exactly
//! 1.0. Silent frames cannot be scaled this way and are reported as
//! [`Error::DegenerateFrame`] instead of turning every sample into NaN.

use crate::error::{Error, Result};

/// Returns the largest absolute sample value, or `None` if any sample is not finite.
pub fn peak_amplitude(frame: &[f32]) -> Option<f32> {
    frame.iter().try_fold(0.0f32, |peak, &sample| {
        sample.is_finite().then(|| peak.max(sample.abs()))
    })
}

/// Returns a copy of `frame` divided by its peak absolute amplitude.
///
/// # Errors
/// * [`Error::EmptyFrame`] - `frame` has no samples
/// * [`Error::DegenerateFrame`] - every sample is zero, or some sample is NaN/infinite
pub fn normalize(frame: &[f32]) -> Result<Vec<f32>> {
    let mut normalized = frame.to_vec();
    normalize_in_place(&mut normalized)?;
    Ok(normalized)
}

/// Normalizes `frame` in place. On error the frame is left untouched.
pub fn normalize_in_place(frame: &mut [f32]) -> Result<()> {
    if frame.is_empty() {
        return Err(Error::EmptyFrame);
    }
    let peak = match peak_amplitude(frame) {
        Some(peak) if peak > 0.0 => peak,
        Some(peak) => return Err(Error::DegenerateFrame { peak }),
        None => return Err(Error::DegenerateFrame { peak: f32::NAN }),
    };
    for sample in frame.iter_mut() {
        *sample /= peak;
    }
    Ok(())
}
