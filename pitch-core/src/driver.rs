//! # Frame Driver Module
//!
//! Sequences one frame at a time through normalization, period estimation
//! and aggregation, and forwards every resulting event to a consumer.
//!
//! ## Architecture
//! - **Source**: [`FrameSource`] is pulled once per frame; blocking in
//!   `next_frame` is the only place the loop waits
//! - **Sink**: [`PitchSink`] is handed over at construction and owns whatever
//!   state it derives from the events
//! - **Stopping**: the loop ends when the source returns `None`

use crossbeam_channel::{Receiver, Sender};

use crate::aggregator::{Aggregator, AggregatorState, FinalizedPitch, PitchEvent};
use crate::config::PitchConfig;
use crate::error::{Error, Result};
use crate::pitch::PeriodEstimator;
use crate::preprocess::normalize_in_place;

/// Supplies fixed-length sample frames.
pub trait FrameSource {
    /// Waits for the next frame. `None` ends the driver loop.
    fn next_frame(&mut self) -> Option<Vec<f32>>;
}

/// Receives the events produced by the driver.
pub trait PitchSink {
    fn emit(&mut self, event: PitchEvent);
}

impl<F: FnMut(PitchEvent)> PitchSink for F {
    fn emit(&mut self, event: PitchEvent) {
        self(event)
    }
}

/// Forwards events over a crossbeam channel.
#[derive(Debug, Clone)]
pub struct ChannelSink(pub Sender<PitchEvent>);

impl PitchSink for ChannelSink {
    fn emit(&mut self, event: PitchEvent) {
        if self.0.send(event).is_err() {
            log::warn!("event receiver dropped, discarding {:?}", event);
        }
    }
}

/// Frames arriving over a channel, e.g. from the capture callback.
pub struct ChannelSource {
    frames: Receiver<Vec<f32>>,
    shutdown: Option<Receiver<()>>,
}

impl ChannelSource {
    pub fn new(frames: Receiver<Vec<f32>>) -> Self {
        Self {
            frames,
            shutdown: None,
        }
    }

    /// Stops pulling frames as soon as anything arrives on `shutdown`.
    pub fn with_shutdown(frames: Receiver<Vec<f32>>, shutdown: Receiver<()>) -> Self {
        Self {
            frames,
            shutdown: Some(shutdown),
        }
    }
}

impl FrameSource for ChannelSource {
    fn next_frame(&mut self) -> Option<Vec<f32>> {
        match &self.shutdown {
            Some(shutdown) => crossbeam_channel::select! {
                recv(self.frames) -> msg => match msg {
                    Ok(frame) => Some(frame),
                    Err(_) => {
                        log::debug!("frame channel closed");
                        None
                    }
                },
                recv(shutdown) -> _ => {
                    log::debug!("received shutdown signal");
                    None
                },
            },
            None => self.frames.recv().ok(),
        }
    }
}

/// Frames from any iterator, e.g. a file split with [`crate::frame::frames`].
pub struct IterSource<I>(pub I);

impl<I: Iterator<Item = Vec<f32>>> FrameSource for IterSource<I> {
    fn next_frame(&mut self) -> Option<Vec<f32>> {
        self.0.next()
    }
}

/// Counters collected while running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    /// Frames run through the pipeline.
    pub frames: usize,
    /// Frames skipped because of a length mismatch.
    pub skipped: usize,
    /// Frames that produced a pitch estimate.
    pub pitched: usize,
    /// Finalized pitches emitted.
    pub finalized: usize,
}

/// Runs the pipeline over a stream of frames.
pub struct FrameDriver<K: PitchSink> {
    estimator: PeriodEstimator,
    aggregator: Aggregator,
    sample_rate: u32,
    frame_length: usize,
    scratch: Vec<f32>,
    sink: K,
    stats: DriverStats,
}

impl<K: PitchSink> FrameDriver<K> {
    /// Builds a driver for frames captured at `sample_rate`.
    pub fn new(config: &PitchConfig, sample_rate: u32, sink: K) -> Result<Self> {
        config.validate()?;
        if sample_rate == 0 {
            return Err(Error::InvalidParameter {
                name: "sampleRate",
                value: sample_rate.to_string(),
                reason: "must be positive",
            });
        }

        Ok(Self {
            estimator: PeriodEstimator::from_config(config),
            aggregator: Aggregator::from_config(config),
            sample_rate,
            frame_length: config.frame_length,
            scratch: Vec::with_capacity(config.frame_length),
            sink,
            stats: DriverStats::default(),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frame_length(&self) -> usize {
        self.frame_length
    }

    pub fn stats(&self) -> DriverStats {
        self.stats
    }

    pub fn state(&self) -> AggregatorState {
        self.aggregator.state()
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_sink(self) -> K {
        self.sink
    }

    /// Runs one frame through the pipeline and forwards the resulting event.
    ///
    /// Frames of the wrong length are skipped without affecting the run.
    pub fn process_frame(&mut self, frame: &[f32]) -> Option<PitchEvent> {
        if frame.len() != self.frame_length {
            let err = Error::FrameLength {
                expected: self.frame_length,
                got: frame.len(),
            };
            log::warn!("skipping frame: {}", err);
            self.stats.skipped += 1;
            return None;
        }
        self.stats.frames += 1;

        self.scratch.clear();
        self.scratch.extend_from_slice(frame);
        let estimate = match normalize_in_place(&mut self.scratch) {
            Ok(()) => self.estimator.estimate(&self.scratch, self.sample_rate),
            Err(err) => {
                log::trace!("no pitch: {}", err);
                None
            }
        };
        if estimate.is_some() {
            self.stats.pitched += 1;
        }

        let event = self.aggregator.push(estimate);
        if let Some(event) = event {
            self.forward(event);
        }
        event
    }

    /// Finalizes a pending run, e.g. when a finite source runs dry mid-tone.
    pub fn flush(&mut self) -> Option<FinalizedPitch> {
        let finalized = self.aggregator.finalize();
        if let Some(finalized) = finalized {
            self.forward(PitchEvent::Finalized(finalized));
        }
        finalized
    }

    /// Pulls frames until the source is exhausted.
    pub fn run<S: FrameSource>(&mut self, source: &mut S) -> DriverStats {
        while let Some(frame) = source.next_frame() {
            self.process_frame(&frame);
        }
        log::debug!("frame source exhausted after {} frames", self.stats.frames);
        self.stats
    }

    fn forward(&mut self, event: PitchEvent) {
        if matches!(event, PitchEvent::Finalized(_)) {
            self.stats.finalized += 1;
        }
        self.sink.emit(event);
    }
}
