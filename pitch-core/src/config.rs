//! # Configuration Module
//!
//! Every tunable constant of the pipeline lives in [`PitchConfig`]. The
//! defaults were tuned against one microphone setup and should be calibrated
//! against real hardware rather than treated as intrinsic to the algorithm.
//!
//! Configurations are stored as pretty-printed JSON with camelCase keys.
//! Missing keys fall back to their defaults, so a file may override a single
//! value.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::aggregator::OutlierCenter;
use crate::error::{Error, Result};

/// Samples per analysis window.
pub const DEFAULT_FRAME_LENGTH: usize = 2048;
/// CMND cutoff for accepting a period candidate.
pub const DEFAULT_THRESHOLD: f32 = 0.1;
/// Estimates below this frequency never enter a run.
pub const DEFAULT_MIN_FREQUENCY: f32 = 300.0;
/// Allowed upward deviation from the run centre, in Hz.
pub const DEFAULT_UPPER_OUTLIER_BAND: f32 = 1000.0;
/// Allowed downward deviation from the run centre, in Hz.
pub const DEFAULT_LOWER_OUTLIER_BAND: f32 = 100.0;
/// Capture sample rate requested from the input device.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// How the difference function is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifferenceMethod {
    /// Direct squared-difference sum, O(N²/4).
    #[default]
    Direct,
    /// Cross-correlation through a forward/inverse FFT.
    Fft,
}

/// Named configuration for the estimator, the aggregator and capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PitchConfig {
    /// Samples per analysis window.
    pub frame_length: usize,
    /// CMND cutoff.
    pub threshold: f32,
    /// Drop estimates below this frequency (Hz). Zero disables the filter.
    pub min_frequency: f32,
    /// Drop run elements more than this far above the run centre (Hz).
    pub upper_outlier_band: f32,
    /// Drop run elements more than this far below the run centre (Hz).
    pub lower_outlier_band: f32,
    /// Whether the outlier band is measured from the run's median or mean.
    pub outlier_center: OutlierCenter,
    /// Minimum number of estimates surviving outlier rejection for a run to be emitted.
    pub min_run_length: usize,
    pub difference: DifferenceMethod,
    /// Requested capture rate; the device may settle on a different one.
    pub sample_rate: u32,
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            frame_length: DEFAULT_FRAME_LENGTH,
            threshold: DEFAULT_THRESHOLD,
            min_frequency: DEFAULT_MIN_FREQUENCY,
            upper_outlier_band: DEFAULT_UPPER_OUTLIER_BAND,
            lower_outlier_band: DEFAULT_LOWER_OUTLIER_BAND,
            outlier_center: OutlierCenter::Median,
            min_run_length: 1,
            difference: DifferenceMethod::Direct,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl PitchConfig {
    /// Checks that every value is usable by the pipeline.
    pub fn validate(&self) -> Result<()> {
        if self.frame_length < 4 {
            return Err(invalid(
                "frameLength",
                self.frame_length,
                "must be at least 4 samples",
            ));
        }
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(invalid("threshold", self.threshold, "must lie in (0, 1]"));
        }
        if !self.min_frequency.is_finite() || self.min_frequency < 0.0 {
            return Err(invalid(
                "minFrequency",
                self.min_frequency,
                "must be finite and non-negative",
            ));
        }
        if !self.upper_outlier_band.is_finite() || self.upper_outlier_band < 0.0 {
            return Err(invalid(
                "upperOutlierBand",
                self.upper_outlier_band,
                "must be finite and non-negative",
            ));
        }
        if !self.lower_outlier_band.is_finite() || self.lower_outlier_band < 0.0 {
            return Err(invalid(
                "lowerOutlierBand",
                self.lower_outlier_band,
                "must be finite and non-negative",
            ));
        }
        if self.min_run_length == 0 {
            return Err(invalid("minRunLength", self.min_run_length, "must be at least 1"));
        }
        if self.sample_rate == 0 {
            return Err(invalid("sampleRate", self.sample_rate, "must be positive"));
        }
        Ok(())
    }

    /// Loads and validates a configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let config: PitchConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        log::debug!("loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Saves the configuration as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json_string = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json_string.as_bytes())?;
        Ok(())
    }
}

fn invalid(name: &'static str, value: impl ToString, reason: &'static str) -> Error {
    Error::InvalidParameter {
        name,
        value: value.to_string(),
        reason,
    }
}
