// pitch-core/src/lib.rs

//! The core logic for the streaming pitch estimator.
//! This crate turns a stream of fixed-length audio frames into per-frame
//! pitch estimates and one stabilized frequency per sustained tone. It is
//! completely headless and renders nothing.
//!
//! Frames flow one way: [`preprocess`] → [`pitch`] → [`aggregator`], with
//! [`driver`] doing the sequencing and [`audio`] supplying frames from the
//! default input device.
//!
//! ```
//! use pitch_core::{FrameDriver, IterSource, PitchConfig, PitchEvent};
//!
//! let config = PitchConfig { frame_length: 1024, ..Default::default() };
//! let dx = 2.0 * std::f32::consts::PI * 440.0 / 44100.0;
//! let tone: Vec<f32> = (0..1024).map(|i| (i as f32 * dx).sin()).collect();
//! let frames = vec![tone.clone(), tone, vec![0.0; 1024]];
//!
//! let mut finalized = Vec::new();
//! let mut driver = FrameDriver::new(&config, 44100, |event: PitchEvent| {
//!     if let PitchEvent::Finalized(pitch) = event {
//!         finalized.push(pitch.frequency);
//!     }
//! })
//! .unwrap();
//! driver.run(&mut IterSource(frames.into_iter()));
//! drop(driver);
//!
//! assert_eq!(finalized.len(), 1);
//! assert!((finalized[0] - 440.0).abs() < 4.4);
//! ```

pub mod aggregator;
pub mod audio;
pub mod config;
pub mod driver;
pub mod error;
pub mod fft;
pub mod frame;
pub mod pitch;
pub mod preprocess;
pub mod tuning;

pub use aggregator::{
    Aggregator, AggregatorState, FinalizedPitch, OutlierBand, OutlierCenter, PitchEvent,
};
pub use config::{DifferenceMethod, PitchConfig};
pub use driver::{
    ChannelSink, ChannelSource, DriverStats, FrameDriver, FrameSource, IterSource, PitchSink,
};
pub use error::{Error, Result};
pub use pitch::PeriodEstimator;
