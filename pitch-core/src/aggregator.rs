//! # Run Aggregation Module
//!
//! Turns the stream of per-frame estimates into one stable value per tone.
//! Consecutive valid estimates are collected into a run; the first frame
//! without a pitch ends the tone, and the run is reduced to an
//! outlier-trimmed mean.
//!
//! The outlier band is deliberately asymmetric: an estimate may sit up to
//! `upper` Hz above the centre of the run (octave errors on the high side are
//! common) but only `lower` Hz below it. The centre is the run's median by
//! default. Measured from the mean, one wild estimate such as 5000 Hz in a
//! run around 440 Hz shifts the centre so far that the genuine estimates are
//! the ones rejected.

use serde::{Deserialize, Serialize};

use crate::config::PitchConfig;

/// State of the aggregator between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorState {
    /// No run in progress.
    Idle,
    /// A tone is sounding and its estimates are being collected.
    Accumulating,
}

/// Event forwarded to the consumer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PitchEvent {
    /// A frame produced a valid estimate that joined the current run.
    Running { frequency: f32 },
    /// A tone ended; its run was reduced to one value.
    Finalized(FinalizedPitch),
}

/// Outlier-trimmed mean of one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinalizedPitch {
    pub frequency: f32,
    /// Estimates that survived outlier rejection.
    pub kept: usize,
    /// Estimates dropped by outlier rejection.
    pub rejected: usize,
}

/// Reference point the outlier band is measured from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierCenter {
    /// Median of the run. A single wild estimate cannot drag the band away
    /// from the tone.
    #[default]
    Median,
    /// Arithmetic mean of the run.
    Mean,
}

/// Allowed deviation from the centre of a run, in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierBand {
    pub upper: f32,
    pub lower: f32,
    pub center: OutlierCenter,
}

impl OutlierBand {
    pub fn new(upper: f32, lower: f32) -> Self {
        Self {
            upper,
            lower,
            center: OutlierCenter::default(),
        }
    }

    pub fn with_center(mut self, center: OutlierCenter) -> Self {
        self.center = center;
        self
    }

    /// True if `value` lies within the band around `center`.
    pub fn contains(&self, center: f32, value: f32) -> bool {
        !(value - center > self.upper || center - value > self.lower)
    }

    fn center_of(&self, run: &[f32]) -> f32 {
        match self.center {
            OutlierCenter::Median => median(run),
            OutlierCenter::Mean => mean(run),
        }
    }
}

impl Default for OutlierBand {
    fn default() -> Self {
        let config = PitchConfig::default();
        Self::new(config.upper_outlier_band, config.lower_outlier_band)
            .with_center(config.outlier_center)
    }
}

fn mean(values: &[f32]) -> f32 {
    values.iter().sum::<f32>() / values.len() as f32
}

fn median(values: &[f32]) -> f32 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f32::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Reduces a run to the mean of the estimates inside the outlier band.
///
/// Returns `None` for an empty run, or when every estimate falls outside the band.
pub fn finalize_run(run: &[f32], band: OutlierBand) -> Option<FinalizedPitch> {
    if run.is_empty() {
        return None;
    }

    let center = band.center_of(run);
    let kept: Vec<f32> = run
        .iter()
        .copied()
        .filter(|&value| band.contains(center, value))
        .collect();

    if kept.is_empty() {
        return None;
    }

    Some(FinalizedPitch {
        frequency: mean(&kept),
        kept: kept.len(),
        rejected: run.len() - kept.len(),
    })
}

/// Online state machine collecting a run of estimates per tone.
#[derive(Debug, Clone)]
pub struct Aggregator {
    run: Vec<f32>,
    min_frequency: f32,
    band: OutlierBand,
    min_run_length: usize,
}

impl Aggregator {
    pub fn new(min_frequency: f32, band: OutlierBand, min_run_length: usize) -> Self {
        Self {
            run: Vec::new(),
            min_frequency,
            band,
            min_run_length: min_run_length.max(1),
        }
    }

    pub fn from_config(config: &PitchConfig) -> Self {
        Self::new(
            config.min_frequency,
            OutlierBand::new(config.upper_outlier_band, config.lower_outlier_band)
                .with_center(config.outlier_center),
            config.min_run_length,
        )
    }

    pub fn state(&self) -> AggregatorState {
        if self.run.is_empty() {
            AggregatorState::Idle
        } else {
            AggregatorState::Accumulating
        }
    }

    /// Estimates collected for the tone currently sounding.
    pub fn run(&self) -> &[f32] {
        &self.run
    }

    /// Feeds the estimator's result for one frame.
    pub fn push(&mut self, estimate: Option<f32>) -> Option<PitchEvent> {
        match estimate {
            Some(frequency) => self.observe_pitch(frequency),
            None => self.observe_silence(),
        }
    }

    /// Appends a valid estimate to the run.
    ///
    /// Estimates below the minimum frequency are dropped without touching the
    /// run; they do not count as silence either.
    pub fn observe_pitch(&mut self, frequency: f32) -> Option<PitchEvent> {
        if !frequency.is_finite() || frequency <= 0.0 {
            log::warn!("ignoring invalid estimate {}", frequency);
            return None;
        }
        if frequency < self.min_frequency {
            log::trace!(
                "dropping {:.1} Hz below minimum {:.1} Hz",
                frequency,
                self.min_frequency
            );
            return None;
        }

        if self.run.is_empty() {
            log::debug!("tone started at {:.1} Hz", frequency);
        }
        self.run.push(frequency);
        Some(PitchEvent::Running { frequency })
    }

    /// Handles a frame without pitch: ends the current tone, if any.
    pub fn observe_silence(&mut self) -> Option<PitchEvent> {
        self.finalize().map(PitchEvent::Finalized)
    }

    /// Reduces the current run and returns to idle. A no-op when already idle.
    ///
    /// The size check happens on the trimmed run, before it is discarded;
    /// runs shorter than the configured minimum are dropped silently.
    pub fn finalize(&mut self) -> Option<FinalizedPitch> {
        if self.run.is_empty() {
            return None;
        }

        let collected = self.run.len();
        let result = finalize_run(&self.run, self.band);
        self.run.clear();

        match result {
            Some(finalized) if finalized.kept >= self.min_run_length => {
                log::debug!(
                    "tone stopped: {:.1} Hz from {} estimates ({} rejected)",
                    finalized.frequency,
                    finalized.kept,
                    finalized.rejected
                );
                Some(finalized)
            }
            Some(finalized) => {
                log::debug!(
                    "tone stopped: run of {} too short after trimming ({} kept)",
                    collected,
                    finalized.kept
                );
                None
            }
            None => {
                log::debug!("tone stopped: all {} estimates rejected", collected);
                None
            }
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::from_config(&PitchConfig::default())
    }
}
