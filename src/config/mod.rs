//! Command-line parsing, session configuration, and fallback policy.

mod defaults;
#[cfg(test)]
mod tests;
mod validation;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use defaults::{
    DEFAULT_ACQUIRE_TIMEOUT_MS, DEFAULT_CHANNELS, DEFAULT_CHANNEL_CAPACITY,
    DEFAULT_FALLBACK_INITIAL_DELAY_MS, DEFAULT_FALLBACK_INTERVAL_MS, DEFAULT_FLUSH_INTERVAL_MS,
    DEFAULT_FRAME_MS, DEFAULT_RUN_SECONDS, DEFAULT_SAMPLE_RATE, DEFAULT_SILENCE_RMS,
    DEFAULT_SILENCE_TICKS, DEFAULT_SINK_QUEUE_BOUND, MAX_ACQUIRE_TIMEOUT_MS,
    MAX_FALLBACK_INTERVAL_MS, MAX_FLUSH_INTERVAL_MS, MAX_SAMPLE_RATE, MIN_SAMPLE_RATE,
};

/// CLI options for the livemic pipeline runner. Validated values keep the
/// capture workers and the outbound protocol well-formed.
#[derive(Debug, Parser, Clone)]
#[command(about = "livemic capture pipeline", author, version)]
pub struct AppConfig {
    /// Transcription model the chunks are tagged for
    #[arg(long, value_enum, default_value_t = ModelKind::Google)]
    pub model: ModelKind,

    /// Preferred audio input device name
    #[arg(long)]
    pub input_device: Option<String>,

    /// Print detected audio input devices and exit
    #[arg(long = "list-input-devices", default_value_t = false)]
    pub list_input_devices: bool,

    /// Print the model catalogue as JSON and exit
    #[arg(long = "list-models", default_value_t = false)]
    pub list_models: bool,

    /// Sample rate for encoded chunks (Hz)
    #[arg(long = "sample-rate", default_value_t = DEFAULT_SAMPLE_RATE)]
    pub sample_rate: u32,

    /// Channel count requested from the input device
    #[arg(long, default_value_t = DEFAULT_CHANNELS)]
    pub channels: u16,

    /// Disable the noise suppression pass before encoding
    #[arg(long = "no-noise-suppression", default_value_t = false)]
    pub no_noise_suppression: bool,

    /// Disable echo cancellation in the stream request
    #[arg(long = "no-echo-cancellation", default_value_t = false)]
    pub no_echo_cancellation: bool,

    /// Disable the sentiment block in synthetic results
    #[arg(long = "no-sentiment", default_value_t = false)]
    pub no_sentiment: bool,

    /// Emit only silent chunks while degraded, never synthetic results
    #[arg(long = "no-synthetic-results", default_value_t = false)]
    pub no_synthetic_results: bool,

    /// Interval between chunk flushes (milliseconds)
    #[arg(long = "flush-interval-ms", default_value_t = DEFAULT_FLUSH_INTERVAL_MS)]
    pub flush_interval_ms: u64,

    /// Consecutive silent flush ticks before demo mode engages
    #[arg(long = "silence-ticks", default_value_t = DEFAULT_SILENCE_TICKS)]
    pub silence_ticks: u32,

    /// RMS threshold below which a flush tick counts as silent
    #[arg(long = "silence-rms", default_value_t = DEFAULT_SILENCE_RMS)]
    pub silence_rms: f32,

    /// Delay before the first synthetic emission (milliseconds)
    #[arg(
        long = "fallback-initial-delay-ms",
        default_value_t = DEFAULT_FALLBACK_INITIAL_DELAY_MS
    )]
    pub fallback_initial_delay_ms: u64,

    /// Cadence of synthetic emissions while degraded (milliseconds)
    #[arg(long = "fallback-interval-ms", default_value_t = DEFAULT_FALLBACK_INTERVAL_MS)]
    pub fallback_interval_ms: u64,

    /// Acquisition timeout before demo mode engages (milliseconds)
    #[arg(long = "acquire-timeout-ms", default_value_t = DEFAULT_ACQUIRE_TIMEOUT_MS)]
    pub acquire_timeout_ms: u64,

    /// Events buffered while the transport is unavailable
    #[arg(long = "sink-queue-bound", default_value_t = DEFAULT_SINK_QUEUE_BOUND)]
    pub sink_queue_bound: usize,

    /// Recording duration before the CLI stops (seconds)
    #[arg(long, default_value_t = DEFAULT_RUN_SECONDS)]
    pub seconds: u64,

    /// Enable file logging (debug)
    #[arg(long = "logs", env = "LIVEMIC_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "LIVEMIC_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,

    /// Enable verbose timing logs
    #[arg(long)]
    pub log_timings: bool,
}

impl AppConfig {
    /// Session-scoped configuration derived from the CLI surface.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            model: self.model,
            sample_rate: self.sample_rate,
            channels: self.channels,
            noise_suppression: !self.no_noise_suppression,
            echo_cancellation: !self.no_echo_cancellation,
            sentiment: !self.no_sentiment,
            input_device: self.input_device.clone(),
        }
    }

    /// Degradation thresholds and cadences derived from the CLI surface.
    pub fn fallback_policy(&self) -> FallbackPolicy {
        FallbackPolicy {
            flush_interval_ms: self.flush_interval_ms,
            silence_ticks: self.silence_ticks,
            silence_rms: self.silence_rms,
            fallback_initial_delay_ms: self.fallback_initial_delay_ms,
            fallback_interval_ms: self.fallback_interval_ms,
            acquire_timeout_ms: self.acquire_timeout_ms,
            sink_queue_bound: self.sink_queue_bound,
            emit_synthetic_results: !self.no_synthetic_results,
            frame_ms: DEFAULT_FRAME_MS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Immutable per-session input, supplied at `start()` and unchanged for the
/// session's lifetime.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub model: ModelKind,
    pub sample_rate: u32,
    pub channels: u16,
    pub noise_suppression: bool,
    pub echo_cancellation: bool,
    pub sentiment: bool,
    pub input_device: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::Google,
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            noise_suppression: true,
            echo_cancellation: true,
            sentiment: true,
            input_device: None,
        }
    }
}

/// Thresholds that trigger degradation and the cadence of synthetic
/// emission. Everything here is policy rather than a hardcoded constant.
#[derive(Debug, Clone)]
pub struct FallbackPolicy {
    pub flush_interval_ms: u64,
    pub silence_ticks: u32,
    pub silence_rms: f32,
    pub fallback_initial_delay_ms: u64,
    pub fallback_interval_ms: u64,
    pub acquire_timeout_ms: u64,
    pub sink_queue_bound: usize,
    pub emit_synthetic_results: bool,
    pub frame_ms: u64,
    pub channel_capacity: usize,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
            silence_ticks: DEFAULT_SILENCE_TICKS,
            silence_rms: DEFAULT_SILENCE_RMS,
            fallback_initial_delay_ms: DEFAULT_FALLBACK_INITIAL_DELAY_MS,
            fallback_interval_ms: DEFAULT_FALLBACK_INTERVAL_MS,
            acquire_timeout_ms: DEFAULT_ACQUIRE_TIMEOUT_MS,
            sink_queue_bound: DEFAULT_SINK_QUEUE_BOUND,
            emit_synthetic_results: true,
            frame_ms: DEFAULT_FRAME_MS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl FallbackPolicy {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn fallback_interval(&self) -> Duration {
        Duration::from_millis(self.fallback_interval_ms)
    }

    pub fn fallback_initial_delay(&self) -> Duration {
        Duration::from_millis(self.fallback_initial_delay_ms)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

/// Transcription models the pipeline can tag chunks and results for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Google,
    Vosk,
    Whisper,
}

impl ModelKind {
    pub fn id(self) -> &'static str {
        match self {
            ModelKind::Google => "google",
            ModelKind::Vosk => "vosk",
            ModelKind::Whisper => "whisper",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Google => "Google Speech Recognition",
            ModelKind::Vosk => "Vosk",
            ModelKind::Whisper => "OpenAI Whisper",
        }
    }

    pub fn all() -> [ModelKind; 3] {
        [ModelKind::Google, ModelKind::Vosk, ModelKind::Whisper]
    }

    pub fn from_id(id: &str) -> Option<ModelKind> {
        match id {
            "google" => Some(ModelKind::Google),
            "vosk" => Some(ModelKind::Vosk),
            "whisper" => Some(ModelKind::Whisper),
            _ => None,
        }
    }

    /// Model catalogue exposed to UI collaborators.
    pub fn catalogue() -> Vec<ModelInfo> {
        ModelKind::all()
            .into_iter()
            .map(|kind| ModelInfo {
                id: kind.id(),
                name: kind.display_name(),
                available: true,
            })
            .collect()
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// One entry of the model catalogue.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub available: bool,
}
