//! Audio output using cpal over the shared device ring

use std::sync::Arc;

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig, SupportedStreamConfig};
use tracing::{error, info};

use framelock_core::{AudioSink, CursorError, FillWindow, RingCursors, RingFormat};

use super::ring::DeviceRing;

/// Audio output using cpal with the cursor-addressable device ring
///
/// The stream callback runs on the device thread and drains the ring in
/// real time. The loop thread commits mixed samples through [`AudioSink`].
pub struct AudioOutput {
    /// Shared ring the stream callback drains
    ring: Arc<DeviceRing>,
    /// The cpal output stream (must be kept alive)
    _stream: Stream,
    /// Negotiated sample rate (may differ from the configured preference)
    sample_rate: u32,
}

impl AudioOutput {
    /// Create a new audio output.
    ///
    /// Attempts to configure the default device for stereo output at the
    /// preferred sample rate, falling back to the device's default config
    /// if that rate is unsupported. The ring holds one second of audio at
    /// the negotiated rate.
    pub fn new(preferred_sample_rate: u32) -> anyhow::Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .context("No audio output device found")?;

        let supported = Self::find_output_config(&device, preferred_sample_rate)?;
        let sample_rate = supported.sample_rate().0;
        let sample_format = supported.sample_format();

        let config = StreamConfig {
            channels: 2,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let ring = Arc::new(DeviceRing::new(RingFormat::stereo_16(sample_rate)));

        let stream = Self::build_stream(&device, &config, sample_format, Arc::clone(&ring))?;
        stream.play().context("Failed to start audio stream")?;

        info!(
            "Audio output initialized: {} Hz {:?}, {} byte ring",
            sample_rate,
            sample_format,
            ring.format().capacity_bytes
        );

        Ok(Self {
            ring,
            _stream: stream,
            sample_rate,
        })
    }

    /// Find a stereo output config at the preferred sample rate.
    ///
    /// Falls back to the device's default config if no stereo range
    /// covers the rate.
    fn find_output_config(
        device: &Device,
        preferred_rate: u32,
    ) -> anyhow::Result<SupportedStreamConfig> {
        let supported = device
            .supported_output_configs()
            .context("Failed to query output configs")?;

        let mut fallback = None;
        for range in supported {
            if range.channels() != 2
                || range.min_sample_rate().0 > preferred_rate
                || range.max_sample_rate().0 < preferred_rate
            {
                continue;
            }
            match range.sample_format() {
                // i16 output needs no conversion in the callback
                SampleFormat::I16 => {
                    return Ok(range.with_sample_rate(cpal::SampleRate(preferred_rate)));
                }
                SampleFormat::F32 | SampleFormat::U16 => {
                    if fallback.is_none() {
                        fallback = Some(range);
                    }
                }
                _ => {}
            }
        }
        if let Some(range) = fallback {
            return Ok(range.with_sample_rate(cpal::SampleRate(preferred_rate)));
        }

        device
            .default_output_config()
            .context("Failed to get default output config")
    }

    /// Build the output stream for whatever sample format the device wants.
    ///
    /// The ring stores i16 samples, so f32 and u16 devices go through a
    /// scratch buffer conversion each callback.
    fn build_stream(
        device: &Device,
        config: &StreamConfig,
        sample_format: SampleFormat,
        ring: Arc<DeviceRing>,
    ) -> anyhow::Result<Stream> {
        let err_fn = |err| error!("Audio stream error: {}", err);
        let stream = match sample_format {
            SampleFormat::I16 => device.build_output_stream(
                config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    ring.consume_into(data);
                },
                err_fn,
                None,
            )?,
            SampleFormat::F32 => {
                // Pre-allocate scratch for the i16 -> f32 conversion
                let mut scratch: Vec<i16> = vec![0; 4096];
                device.build_output_stream(
                    config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        if scratch.len() < data.len() {
                            scratch.resize(data.len(), 0);
                        }
                        let scratch = &mut scratch[..data.len()];
                        ring.consume_into(scratch);
                        for (out, &sample) in data.iter_mut().zip(scratch.iter()) {
                            *out = f32::from(sample) / 32768.0;
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::U16 => {
                let mut scratch: Vec<i16> = vec![0; 4096];
                device.build_output_stream(
                    config,
                    move |data: &mut [u16], _: &cpal::OutputCallbackInfo| {
                        if scratch.len() < data.len() {
                            scratch.resize(data.len(), 0);
                        }
                        let scratch = &mut scratch[..data.len()];
                        ring.consume_into(scratch);
                        for (out, &sample) in data.iter_mut().zip(scratch.iter()) {
                            *out = (i32::from(sample) + 32768) as u16;
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            other => anyhow::bail!("Unsupported sample format: {:?}", other),
        };
        Ok(stream)
    }

    /// Get the negotiated sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Format of the backing ring
    pub fn format(&self) -> RingFormat {
        self.ring.format()
    }
}

impl AudioSink for AudioOutput {
    fn cursors(&self) -> Result<RingCursors, CursorError> {
        self.ring.cursors()
    }

    fn commit(&mut self, window: FillWindow, samples: &[i16]) {
        self.ring.commit(window, samples);
    }
}
