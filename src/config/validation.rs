use super::{
    AppConfig, FallbackPolicy, SessionConfig, MAX_ACQUIRE_TIMEOUT_MS, MAX_FALLBACK_INTERVAL_MS,
    MAX_FLUSH_INTERVAL_MS, MAX_SAMPLE_RATE, MIN_SAMPLE_RATE,
};
use crate::error::ConfigError;
use anyhow::Result;
use clap::Parser;

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values before any worker is spawned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        const MIN_RUN_SECONDS: u64 = 1;
        const MAX_RUN_SECONDS: u64 = 3_600;

        if !(MIN_RUN_SECONDS..=MAX_RUN_SECONDS).contains(&self.seconds) {
            return Err(ConfigError::new(
                "--seconds",
                format!("must be between {MIN_RUN_SECONDS} and {MAX_RUN_SECONDS}, got {}", self.seconds),
            ));
        }
        self.session_config().validate()?;
        self.fallback_policy().validate()
    }
}

impl SessionConfig {
    /// Caller-bug checks, reported synchronously at `start()`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(ConfigError::new(
                "sample_rate",
                format!(
                    "must be between {MIN_SAMPLE_RATE} and {MAX_SAMPLE_RATE} Hz, got {}",
                    self.sample_rate
                ),
            ));
        }
        if !(1..=2).contains(&self.channels) {
            return Err(ConfigError::new(
                "channels",
                format!("must be 1 or 2, got {}", self.channels),
            ));
        }
        if let Some(name) = &self.input_device {
            if name.trim().is_empty() {
                return Err(ConfigError::new("input_device", "must not be blank"));
            }
        }
        Ok(())
    }
}

impl FallbackPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flush_interval_ms == 0 || self.flush_interval_ms > MAX_FLUSH_INTERVAL_MS {
            return Err(ConfigError::new(
                "flush_interval_ms",
                format!(
                    "must be between 1 and {MAX_FLUSH_INTERVAL_MS}, got {}",
                    self.flush_interval_ms
                ),
            ));
        }
        if self.silence_ticks == 0 {
            return Err(ConfigError::new("silence_ticks", "must be at least 1"));
        }
        if !self.silence_rms.is_finite() || !(0.0..=1.0).contains(&self.silence_rms) {
            return Err(ConfigError::new(
                "silence_rms",
                format!("must be a finite value in [0, 1], got {}", self.silence_rms),
            ));
        }
        if self.fallback_interval_ms == 0 || self.fallback_interval_ms > MAX_FALLBACK_INTERVAL_MS {
            return Err(ConfigError::new(
                "fallback_interval_ms",
                format!(
                    "must be between 1 and {MAX_FALLBACK_INTERVAL_MS}, got {}",
                    self.fallback_interval_ms
                ),
            ));
        }
        if self.fallback_initial_delay_ms > self.fallback_interval_ms {
            return Err(ConfigError::new(
                "fallback_initial_delay_ms",
                format!(
                    "cannot exceed fallback_interval_ms ({})",
                    self.fallback_interval_ms
                ),
            ));
        }
        if self.acquire_timeout_ms == 0 || self.acquire_timeout_ms > MAX_ACQUIRE_TIMEOUT_MS {
            return Err(ConfigError::new(
                "acquire_timeout_ms",
                format!(
                    "must be between 1 and {MAX_ACQUIRE_TIMEOUT_MS}, got {}",
                    self.acquire_timeout_ms
                ),
            ));
        }
        if self.sink_queue_bound == 0 {
            return Err(ConfigError::new("sink_queue_bound", "must be at least 1"));
        }
        if !(5..=120).contains(&self.frame_ms) {
            return Err(ConfigError::new(
                "frame_ms",
                format!("must be between 5 and 120, got {}", self.frame_ms),
            ));
        }
        if !(8..=4096).contains(&self.channel_capacity) {
            return Err(ConfigError::new(
                "channel_capacity",
                format!("must be between 8 and 4096, got {}", self.channel_capacity),
            ));
        }
        Ok(())
    }
}
