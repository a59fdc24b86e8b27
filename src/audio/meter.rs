//! Loudness meter feeding the UI visualizer.
//!
//! The stream callback writes normalized levels; the UI polls `sample()` at
//! animation rate. When no analysis tap is attached the meter produces
//! bounded random values so the visualizer never appears frozen, and it
//! drops to exactly zero as soon as the session stops.

use crate::fallback::SyntheticRng;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

/// Quietest input treated as displayable signal.
const LEVEL_FLOOR_DB: f32 = -60.0;

/// Bounds of the randomized level shown while no tap is attached.
pub const SYNTHETIC_LEVEL_MIN: f32 = 0.2;
pub const SYNTHETIC_LEVEL_MAX: f32 = 0.8;

const MODE_RESET: u8 = 0;
const MODE_SYNTHETIC: u8 = 1;
const MODE_ATTACHED: u8 = 2;

/// One loudness reading. Has no identity beyond the tick that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelSample {
    /// Normalized loudness in [0, 1].
    pub value: f32,
    /// True when the value was generated rather than measured.
    pub synthetic: bool,
}

#[derive(Clone, Debug)]
pub struct LevelMeter {
    level_bits: Arc<AtomicU32>,
    mode: Arc<AtomicU8>,
    rng: Arc<Mutex<SyntheticRng>>,
}

impl LevelMeter {
    pub fn new() -> Self {
        Self {
            level_bits: Arc::new(AtomicU32::new(0.0f32.to_bits())),
            mode: Arc::new(AtomicU8::new(MODE_RESET)),
            rng: Arc::new(Mutex::new(SyntheticRng::from_entropy())),
        }
    }

    /// Switch to measured levels from the analysis tap.
    pub(crate) fn attach(&self) {
        self.mode.store(MODE_ATTACHED, Ordering::Relaxed);
    }

    /// Switch to randomized levels while no tap is live.
    pub(crate) fn set_synthetic(&self) {
        self.mode.store(MODE_SYNTHETIC, Ordering::Relaxed);
    }

    /// Drop to zero output. Called on session stop.
    pub(crate) fn reset(&self) {
        self.mode.store(MODE_RESET, Ordering::Relaxed);
        self.level_bits.store(0.0f32.to_bits(), Ordering::Relaxed);
    }

    /// Store a measured level. Written from the stream callback.
    pub(crate) fn set_level(&self, value: f32) {
        let clamped = value.clamp(0.0, 1.0);
        self.level_bits.store(clamped.to_bits(), Ordering::Relaxed);
    }

    /// Current loudness for the visualizer. Always in [0, 1].
    pub fn sample(&self) -> LevelSample {
        match self.mode.load(Ordering::Relaxed) {
            MODE_ATTACHED => LevelSample {
                value: f32::from_bits(self.level_bits.load(Ordering::Relaxed)).clamp(0.0, 1.0),
                synthetic: false,
            },
            MODE_SYNTHETIC => {
                let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
                LevelSample {
                    value: rng.range_f32(SYNTHETIC_LEVEL_MIN, SYNTHETIC_LEVEL_MAX),
                    synthetic: true,
                }
            }
            _ => LevelSample {
                value: 0.0,
                synthetic: false,
            },
        }
    }
}

impl Default for LevelMeter {
    fn default() -> Self {
        Self::new()
    }
}

/// Root-mean-square of a frame.
pub(crate) fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let energy: f32 = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    energy.sqrt()
}

/// Map a frame onto the [0, 1] range the visualizer expects, with the floor
/// at -60 dB and full scale at 0 dB.
pub(crate) fn normalized_level(samples: &[f32]) -> f32 {
    let rms = rms(samples).max(1e-6);
    let db = 20.0 * rms.log10();
    ((db - LEVEL_FLOOR_DB) / -LEVEL_FLOOR_DB).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meter_defaults_to_zero() {
        let meter = LevelMeter::new();
        let sample = meter.sample();
        assert_eq!(sample.value, 0.0);
        assert!(!sample.synthetic);
    }

    #[test]
    fn attached_meter_reports_stored_level() {
        let meter = LevelMeter::new();
        meter.attach();
        meter.set_level(0.42);
        let sample = meter.sample();
        assert!((sample.value - 0.42).abs() < 1e-6);
        assert!(!sample.synthetic);
    }

    #[test]
    fn synthetic_samples_stay_in_bounds() {
        let meter = LevelMeter::new();
        meter.set_synthetic();
        for _ in 0..200 {
            let sample = meter.sample();
            assert!(sample.synthetic);
            assert!((SYNTHETIC_LEVEL_MIN..=SYNTHETIC_LEVEL_MAX).contains(&sample.value));
        }
    }

    #[test]
    fn reset_drops_to_zero_immediately() {
        let meter = LevelMeter::new();
        meter.attach();
        meter.set_level(0.9);
        meter.reset();
        assert_eq!(meter.sample().value, 0.0);
    }

    #[test]
    fn set_level_clamps_out_of_range_input() {
        let meter = LevelMeter::new();
        meter.attach();
        meter.set_level(3.0);
        assert_eq!(meter.sample().value, 1.0);
        meter.set_level(-1.0);
        assert_eq!(meter.sample().value, 0.0);
    }

    #[test]
    fn normalized_level_spans_floor_to_full_scale() {
        assert_eq!(normalized_level(&[]), 0.0);
        let full = vec![1.0f32; 256];
        assert!((normalized_level(&full) - 1.0).abs() < 1e-3);
        let quiet = vec![1e-5f32; 256];
        assert_eq!(normalized_level(&quiet), 0.0);
    }
}
