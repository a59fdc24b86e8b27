//! Microphone acquisition backends.
//!
//! The orchestrator talks to capture hardware through [`CaptureBackend`] so
//! the failure paths (no device, permission denied, dead graph) can be
//! exercised without real hardware. [`CpalBackend`] is the production
//! implementation.

use super::dispatch::FramePump;
use super::meter::LevelMeter;
use crate::config::{FallbackPolicy, SessionConfig};
use crate::error::{AcquisitionError, GraphConstructionError};
use crate::log_debug;
use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use crossbeam_channel::{bounded, Receiver};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Acquires the microphone and wires up the decoding graph.
pub trait CaptureBackend: Send + Sync {
    /// Sequentially: verify platform capability, enumerate devices, request
    /// the input stream, construct the decoding graph. Each failure maps to
    /// a distinct recoverable [`AcquisitionError`].
    fn acquire(
        &self,
        config: &SessionConfig,
        policy: &FallbackPolicy,
        meter: &LevelMeter,
    ) -> Result<Box<dyn InputStream>, AcquisitionError>;
}

/// A live input stream. Owned exclusively by one capture session and used
/// from a single worker thread.
pub trait InputStream {
    /// Native rate of the device; samples from `drain` are at this rate.
    fn device_rate(&self) -> u32;

    /// Mono samples buffered since the last drain.
    fn drain(&mut self) -> Vec<f32>;

    /// Frames lost to channel overflow so far.
    fn dropped_frames(&self) -> usize;

    /// Stop the device and tear down the graph. Idempotent.
    fn release(&mut self);
}

/// List microphone names so the CLI can expose a human-friendly selector.
pub fn list_input_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host.input_devices().context("no input devices available")?;
    let mut names = Vec::new();
    for device in devices {
        if let Ok(name) = device.name() {
            names.push(name);
        }
    }
    Ok(names)
}

/// Production backend on top of CPAL.
pub struct CpalBackend;

impl CaptureBackend for CpalBackend {
    fn acquire(
        &self,
        config: &SessionConfig,
        policy: &FallbackPolicy,
        meter: &LevelMeter,
    ) -> Result<Box<dyn InputStream>, AcquisitionError> {
        if cpal::available_hosts().is_empty() {
            return Err(AcquisitionError::Unsupported(
                "no audio host available".to_string(),
            ));
        }
        let host = cpal::default_host();
        let mut devices = host
            .input_devices()
            .map_err(|e| AcquisitionError::Unsupported(e.to_string()))?;

        let device = match &config.input_device {
            Some(name) => devices
                .find(|d| d.name().map(|n| &n == name).unwrap_or(false))
                .ok_or_else(|| AcquisitionError::DeviceNotFound(name.clone()))?,
            None => {
                if devices.next().is_none() {
                    return Err(AcquisitionError::NoDevice);
                }
                host.default_input_device()
                    .ok_or(AcquisitionError::NoDevice)?
            }
        };

        let default_config = device.default_input_config().map_err(|e| match e {
            cpal::DefaultStreamConfigError::DeviceNotAvailable => {
                AcquisitionError::TrackUnavailable("input device not available".to_string())
            }
            cpal::DefaultStreamConfigError::StreamTypeNotSupported => {
                AcquisitionError::TrackUnavailable("stream type not supported".to_string())
            }
            cpal::DefaultStreamConfigError::BackendSpecific { err } => {
                AcquisitionError::PermissionDenied(err.to_string())
            }
        })?;
        let format = default_config.sample_format();
        let device_config: StreamConfig = default_config.into();
        let device_rate = device_config.sample_rate.0;
        let channels = usize::from(device_config.channels.max(1));

        log_debug(&format!(
            "acquire: format={format:?} device_rate={device_rate}Hz channels={channels} \
             requested_channels={} echo_cancellation={}",
            config.channels, config.echo_cancellation
        ));

        let frame_samples = ((device_rate as u64 * policy.frame_ms) / 1000).max(1) as usize;
        let (sender, receiver) = bounded::<Vec<f32>>(policy.channel_capacity.max(1));
        let dropped = Arc::new(AtomicUsize::new(0));
        let pump = Arc::new(Mutex::new(FramePump::new(
            frame_samples,
            sender,
            dropped.clone(),
            meter.clone(),
        )));

        let err_fn = |err| log_debug(&format!("audio_stream_error: {err}"));
        let build_result = match format {
            SampleFormat::F32 => {
                let pump = pump.clone();
                let dropped = dropped.clone();
                device.build_input_stream(
                    &device_config,
                    move |data: &[f32], _| {
                        if let Ok(mut pump) = pump.try_lock() {
                            pump.push(data, channels, |sample| sample);
                        } else {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )
            }
            SampleFormat::I16 => {
                let pump = pump.clone();
                let dropped = dropped.clone();
                device.build_input_stream(
                    &device_config,
                    move |data: &[i16], _| {
                        if let Ok(mut pump) = pump.try_lock() {
                            pump.push(data, channels, |sample| sample as f32 / 32_768.0);
                        } else {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )
            }
            SampleFormat::U16 => {
                let pump = pump.clone();
                let dropped = dropped.clone();
                device.build_input_stream(
                    &device_config,
                    move |data: &[u16], _| {
                        if let Ok(mut pump) = pump.try_lock() {
                            pump.push(data, channels, |sample| {
                                (sample as f32 - 32_768.0) / 32_768.0
                            });
                        } else {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )
            }
            other => {
                return Err(
                    GraphConstructionError::new(format!("unsupported sample format: {other:?}"))
                        .into(),
                )
            }
        };

        let stream = build_result.map_err(|e| match e {
            cpal::BuildStreamError::DeviceNotAvailable => {
                AcquisitionError::TrackUnavailable("device disappeared during acquire".to_string())
            }
            cpal::BuildStreamError::StreamConfigNotSupported => {
                AcquisitionError::TrackUnavailable("stream config not supported".to_string())
            }
            cpal::BuildStreamError::BackendSpecific { err } => {
                AcquisitionError::PermissionDenied(err.to_string())
            }
            other => GraphConstructionError::new(other.to_string()).into(),
        })?;

        stream
            .play()
            .map_err(|e| AcquisitionError::from(GraphConstructionError::new(e.to_string())))?;

        Ok(Box::new(CpalInputStream {
            stream: Some(stream),
            frames: receiver,
            device_rate,
            dropped,
        }))
    }
}

struct CpalInputStream {
    stream: Option<cpal::Stream>,
    frames: Receiver<Vec<f32>>,
    device_rate: u32,
    dropped: Arc<AtomicUsize>,
}

impl InputStream for CpalInputStream {
    fn device_rate(&self) -> u32 {
        self.device_rate
    }

    fn drain(&mut self) -> Vec<f32> {
        let mut samples = Vec::new();
        while let Ok(frame) = self.frames.try_recv() {
            samples.extend(frame);
        }
        samples
    }

    fn dropped_frames(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    fn release(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(err) = stream.pause() {
                log_debug(&format!("failed to pause audio stream: {err}"));
            }
            drop(stream);
        }
    }
}

impl Drop for CpalInputStream {
    fn drop(&mut self) {
        self.release();
    }
}
