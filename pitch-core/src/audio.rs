//! # Audio Capture Module
//!
//! Opens the default input device with CPAL (Cross-Platform Audio Library)
//! and streams fixed-length frames into a channel.
//!
//! The capture callback runs on the audio host's thread. It only downmixes
//! and slices samples; all analysis happens on the thread pulling from the
//! channel.

use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;

use crate::error::{Error, Result};
use crate::frame::FrameAssembler;

/// Starts audio capture from the default input device.
///
/// # Arguments
/// * `sender` - Channel for completed frames; frames are dropped if it is full
/// * `frame_length` - Samples per frame
/// * `target_rate` - Preferred sample rate in Hz
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Playing stream handle and the rate actually in use
/// * `Err(e)` - No device, no f32 input format, or the stream failed to start
pub fn start_audio_capture(
    sender: Sender<Vec<f32>>,
    frame_length: usize,
    target_rate: u32,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| Error::AudioDevice("no input device available".into()))?;

    let device_name = device.name().map_err(device_error)?;
    log::info!("using audio input device: {}", device_name);

    let configs = device
        .supported_input_configs()
        .map_err(device_error)?
        .collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, target_rate)
        .ok_or_else(|| Error::AudioDevice("no suitable f32 input format found".into()))?;

    let rate = target_rate.clamp(
        supported_config.min_sample_rate().0,
        supported_config.max_sample_rate().0,
    );
    let config = supported_config.with_sample_rate(cpal::SampleRate(rate));
    let sample_rate = config.sample_rate().0;
    let channels = config.channels() as usize;
    let config: cpal::StreamConfig = config.into();

    log::info!(
        "selected sample rate: {} Hz, {} channel(s), {} samples per frame",
        sample_rate,
        channels,
        frame_length
    );

    let err_fn = |err| log::warn!("an error occurred on the audio stream: {}", err);

    let mut assembler = FrameAssembler::new(frame_length);

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                assembler.push_interleaved(data, channels, |frame| {
                    if sender.try_send(frame).is_err() {
                        log::trace!("frame channel full, dropping frame");
                    }
                });
            },
            err_fn,
            None,
        )
        .map_err(device_error)?;

    stream.play().map_err(device_error)?;

    Ok((stream, sample_rate))
}

/// Picks the f32 configuration with the fewest channels whose rate range lies
/// closest to `target_rate`.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min = c.min_sample_rate().0;
            let max = c.max_sample_rate().0;
            let distance = if target_rate < min {
                min - target_rate
            } else {
                target_rate.saturating_sub(max)
            };
            (distance, c.channels())
        })
}

fn device_error(err: impl std::fmt::Display) -> Error {
    Error::AudioDevice(err.to_string())
}
