//! # pitch - streaming pitch estimator
//!
//! Runs the pitch-core pipeline over the default microphone, or over a WAV
//! file, and prints one line per pitched frame plus one line per finished
//! tone.
//!
//! ## Architecture
//! - **Audio Thread**: CPAL callback slicing samples into frames
//! - **Main Thread**: frame driver pulling frames and printing events
//! - **Communication**: Crossbeam channels for frames and the Ctrl-C signal

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use cpal::traits::StreamTrait;
use pitch_core::frame::FrameAssembler;
use pitch_core::{
    ChannelSource, DifferenceMethod, DriverStats, FrameDriver, IterSource, PitchConfig,
    PitchEvent, audio, tuning,
};

/// Frames buffered between the capture callback and the driver.
const FRAME_QUEUE: usize = 16;

/// Streaming monophonic pitch estimator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file; command-line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Analyze a WAV file instead of the default input device
    #[arg(long)]
    wav: Option<PathBuf>,
    /// Samples per analysis frame
    #[arg(long)]
    frame_length: Option<usize>,
    /// CMND threshold in (0, 1]
    #[arg(long)]
    threshold: Option<f32>,
    /// Ignore estimates below this frequency (Hz)
    #[arg(long)]
    min_frequency: Option<f32>,
    /// Minimum estimates kept after outlier rejection for a tone to be reported
    #[arg(long)]
    min_run_length: Option<usize>,
    /// Compute the difference function through an FFT
    #[arg(long, default_value_t = false)]
    fft: bool,
    /// Write the effective configuration to this file and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

impl Args {
    fn pitch_config(&self) -> Result<PitchConfig> {
        let mut config = match &self.config {
            Some(path) => PitchConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => PitchConfig::default(),
        };
        if let Some(frame_length) = self.frame_length {
            config.frame_length = frame_length;
        }
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(min_frequency) = self.min_frequency {
            config.min_frequency = min_frequency;
        }
        if let Some(min_run_length) = self.min_run_length {
            config.min_run_length = min_run_length;
        }
        if self.fft {
            config.difference = DifferenceMethod::Fft;
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.pitch_config()?;

    if let Some(path) = &args.write_config {
        config
            .save(path)
            .with_context(|| format!("failed to write config {}", path.display()))?;
        log::info!("configuration written to {}", path.display());
        return Ok(());
    }

    let stats = match &args.wav {
        Some(path) => analyze_wav(path, &config)?,
        None => analyze_microphone(&config)?,
    };
    log::info!(
        "{} frames analyzed, {} with pitch, {} tones, {} skipped",
        stats.frames,
        stats.pitched,
        stats.finalized,
        stats.skipped
    );
    Ok(())
}

fn print_event(event: PitchEvent) {
    match event {
        PitchEvent::Running { frequency } => println!("{:.0} Hz", frequency),
        PitchEvent::Finalized(pitch) => {
            println!(
                "Stop. {} from {} frames ({} rejected)",
                tuning::describe(pitch.frequency),
                pitch.kept,
                pitch.rejected
            );
        }
    }
}

fn analyze_microphone(config: &PitchConfig) -> Result<DriverStats> {
    let (frame_tx, frame_rx) = crossbeam_channel::bounded(FRAME_QUEUE);
    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);

    ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    })
    .context("failed to install Ctrl-C handler")?;

    let (stream, sample_rate) =
        audio::start_audio_capture(frame_tx, config.frame_length, config.sample_rate)
            .context("failed to start audio capture")?;
    log::info!("listening, press Ctrl-C to stop");

    let mut driver = FrameDriver::new(config, sample_rate, print_event)?;
    driver.run(&mut ChannelSource::with_shutdown(frame_rx, shutdown_rx));

    stream.pause().ok();
    drop(stream);
    driver.flush();
    Ok(driver.stats())
}

fn analyze_wav(path: &Path, config: &PitchConfig) -> Result<DriverStats> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let header = reader.spec();
    if header.channels == 0 {
        bail!("{} has no channels", path.display());
    }
    log::info!(
        "{}: {} Hz, {} channel(s), {} bit {:?}",
        path.display(),
        header.sample_rate,
        header.channels,
        header.bits_per_sample,
        header.sample_format
    );

    let samples: Vec<f32> = match header.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .context("failed to read samples")?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (header.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 * scale))
                .collect::<std::result::Result<_, _>>()
                .context("failed to read samples")?
        }
    };

    let mut frames = Vec::new();
    let mut assembler = FrameAssembler::new(config.frame_length);
    assembler.push_interleaved(&samples, header.channels as usize, |frame| frames.push(frame));
    if assembler.pending() > 0 {
        log::debug!("dropping {} trailing samples", assembler.pending());
    }

    let mut driver = FrameDriver::new(config, header.sample_rate, print_event)?;
    driver.run(&mut IterSource(frames.into_iter()));
    driver.flush();
    Ok(driver.stats())
}
