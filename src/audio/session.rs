//! One recording's lifecycle: acquisition, periodic flush, release.
//!
//! A session exclusively owns its input stream and decoding graph. The
//! orchestrator drives `tick()` on a fixed interval; each tick flushes
//! buffered audio into at most one encoded chunk and tracks consecutive
//! silent ticks so the orchestrator can degrade without tearing the session
//! down (real audio may resume).

use super::backend::{CaptureBackend, InputStream};
use super::denoise::suppress_noise;
use super::encoder::{ChunkEncoder, EncodedChunk};
use super::meter::{rms, LevelMeter};
use super::resample::to_session_rate;
use crate::config::{FallbackPolicy, SessionConfig};
use crate::error::{AcquisitionError, EncodingError};
use crate::log_debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionPhase {
    Active,
    Stopped,
}

pub struct CaptureSession {
    stream: Box<dyn InputStream>,
    encoder: ChunkEncoder,
    noise_suppression: bool,
    sample_rate: u32,
    silence_rms: f32,
    silence_ticks: u32,
    silent_ticks: u32,
    phase: SessionPhase,
}

/// What one flush tick produced. The orchestrator decides whether the chunk
/// is forwarded, discarded, or used as a recovery signal.
#[derive(Debug)]
pub struct TickReport {
    pub chunk: Option<EncodedChunk>,
    pub encode_error: Option<EncodingError>,
    /// RMS of the flushed window after processing.
    pub energy: f32,
    pub silent_ticks: u32,
    /// True once the consecutive-silence policy threshold is reached. A
    /// degradation trigger, not an error.
    pub silence_detected: bool,
}

impl CaptureSession {
    /// Acquire the microphone through `backend` and wire up the pipeline.
    /// Every failure is recoverable; the orchestrator falls back instead of
    /// propagating.
    pub fn acquire(
        backend: &dyn CaptureBackend,
        config: &SessionConfig,
        policy: &FallbackPolicy,
        meter: &LevelMeter,
    ) -> Result<Self, AcquisitionError> {
        let stream = backend.acquire(config, policy, meter)?;
        Ok(Self {
            stream,
            encoder: ChunkEncoder::new(config.sample_rate, 1),
            noise_suppression: config.noise_suppression,
            sample_rate: config.sample_rate,
            silence_rms: policy.silence_rms,
            silence_ticks: policy.silence_ticks.max(1),
            silent_ticks: 0,
            phase: SessionPhase::Active,
        })
    }

    pub fn device_rate(&self) -> u32 {
        self.stream.device_rate()
    }

    pub fn dropped_frames(&self) -> usize {
        self.stream.dropped_frames()
    }

    /// Flush buffered audio into at most one chunk and update the silence
    /// streak. Encoder failures are reported in the result, never panicked.
    pub fn tick(&mut self) -> TickReport {
        if self.phase == SessionPhase::Stopped {
            return TickReport {
                chunk: None,
                encode_error: None,
                energy: 0.0,
                silent_ticks: self.silent_ticks,
                silence_detected: false,
            };
        }

        let raw = self.stream.drain();
        let samples = to_session_rate(&raw, self.stream.device_rate(), self.sample_rate);
        let samples = if self.noise_suppression {
            suppress_noise(&samples, self.sample_rate)
        } else {
            samples
        };

        let energy = rms(&samples);
        let quiet = samples.is_empty() || energy < self.silence_rms;

        let mut chunk = None;
        let mut encode_error = None;
        if !samples.is_empty() {
            match self.encoder.encode(&samples) {
                Ok(encoded) => chunk = Some(encoded),
                Err(err) => {
                    log_debug(&format!("chunk encode failed: {err}"));
                    encode_error = Some(err);
                }
            }
        }

        if quiet || encode_error.is_some() {
            self.silent_ticks = self.silent_ticks.saturating_add(1);
        } else {
            self.silent_ticks = 0;
        }

        TickReport {
            chunk,
            encode_error,
            energy,
            silent_ticks: self.silent_ticks,
            silence_detected: self.silent_ticks >= self.silence_ticks,
        }
    }

    /// Stop the device tracks and close the decoding graph. Safe to call
    /// from any state, any number of times.
    pub fn release(&mut self) {
        self.stream.release();
        self.phase = SessionPhase::Stopped;
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.release();
    }
}
