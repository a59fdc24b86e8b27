//! Time-domain noise suppression applied before encoding.
//!
//! Estimates a noise floor from the leading portion of each flush window and
//! attenuates frames whose energy sits at or below it. Pathological input is
//! returned unchanged; this pass must never make a flush fail.

use super::meter::rms;

/// Leading audio used to estimate the noise floor (milliseconds).
const NOISE_EST_MS: u64 = 100;

/// Suppression frame size (milliseconds).
const FRAME_MS: u64 = 25;

const GAIN_EPS: f32 = 1e-10;

pub(super) fn suppress_noise(samples: &[f32], sample_rate: u32) -> Vec<f32> {
    if sample_rate == 0 {
        return samples.to_vec();
    }
    let frame_samples = ((sample_rate as u64 * FRAME_MS) / 1000).max(1) as usize;
    if samples.len() < frame_samples * 2 {
        return samples.to_vec();
    }

    // The window opens on whatever the room sounds like, so the first
    // 100ms (capped at a quarter of the window) approximates background noise.
    let est_len = (((sample_rate as u64 * NOISE_EST_MS) / 1000) as usize).min(samples.len() / 4);
    if est_len == 0 {
        return samples.to_vec();
    }
    let noise_floor = rms(&samples[..est_len]);

    let mut out = samples.to_vec();
    for frame in out.chunks_mut(frame_samples) {
        let frame_rms = rms(frame);
        let gain = ((frame_rms - noise_floor).max(0.0) / (frame_rms + GAIN_EPS)).clamp(0.0, 1.0);
        if gain < 1.0 {
            for sample in frame.iter_mut() {
                *sample *= gain;
            }
        }
    }
    out
}
