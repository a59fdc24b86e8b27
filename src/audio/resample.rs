//! Sample-rate conversion from the device rate to the session rate.
//!
//! The always-available path is a windowed-sinc low-pass (when decimating)
//! followed by linear interpolation. The `high-quality-audio` feature swaps
//! in a sinc resampler and falls back to the basic path if it cannot be
//! constructed.

#[cfg(feature = "high-quality-audio")]
use crate::log_debug;
#[cfg(feature = "high-quality-audio")]
use anyhow::{anyhow, Result};
#[cfg(feature = "high-quality-audio")]
use rubato::{InterpolationParameters, InterpolationType, Resampler, SincFixedIn, WindowFunction};
use std::f32::consts::PI;
#[cfg(feature = "high-quality-audio")]
use std::sync::atomic::{AtomicBool, Ordering};

pub(super) const MIN_DEVICE_RATE: u32 = 2_000;
pub(super) const MAX_DEVICE_RATE: u32 = 192_000;
const MAX_LOW_PASS_TAPS: usize = 129;

#[cfg(feature = "high-quality-audio")]
static SINC_WARNING_SHOWN: AtomicBool = AtomicBool::new(false);

/// Convert device-rate mono samples to the session rate.
pub(super) fn to_session_rate(input: &[f32], device_rate: u32, session_rate: u32) -> Vec<f32> {
    if input.is_empty() || device_rate == 0 || device_rate == session_rate {
        return input.to_vec();
    }

    #[cfg(feature = "high-quality-audio")]
    {
        match sinc_resample(input, device_rate, session_rate) {
            Ok(output) => output,
            Err(err) => {
                if !SINC_WARNING_SHOWN.swap(true, Ordering::AcqRel) {
                    log_debug(&format!(
                        "sinc resampler failed ({err}); falling back to basic path"
                    ));
                }
                basic_resample(input, device_rate, session_rate)
            }
        }
    }

    #[cfg(not(feature = "high-quality-audio"))]
    {
        basic_resample(input, device_rate, session_rate)
    }
}

pub(super) fn basic_resample(input: &[f32], device_rate: u32, session_rate: u32) -> Vec<f32> {
    if input.is_empty() || device_rate == 0 || device_rate == session_rate {
        return input.to_vec();
    }
    if !(MIN_DEVICE_RATE..=MAX_DEVICE_RATE).contains(&device_rate) {
        return input.to_vec();
    }

    let ratio = session_rate as f32 / device_rate as f32;
    let filtered = if device_rate > session_rate {
        // Tame frequencies above the target Nyquist before dropping samples.
        low_pass(input, device_rate, session_rate)
    } else {
        input.to_vec()
    };
    linear_resample(&filtered, ratio)
}

/// Lightweight linear resampler; adequate for short speech flush windows
/// where latency matters more than phase accuracy.
pub(super) fn linear_resample(input: &[f32], ratio: f32) -> Vec<f32> {
    let input_len = input.len();
    let output_len = (input_len as f32 * ratio).round() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_idx = i as f32 / ratio;
        let idx = src_idx.floor() as usize;
        let frac = src_idx - idx as f32;

        if idx + 1 < input_len {
            output.push(input[idx] * (1.0 - frac) + input[idx + 1] * frac);
        } else {
            output.push(input.last().copied().unwrap_or(0.0));
        }
    }

    output
}

/// Hamming-windowed sinc low-pass applied before decimation.
fn low_pass(input: &[f32], device_rate: u32, session_rate: u32) -> Vec<f32> {
    let decimation = device_rate as f32 / session_rate as f32;
    let mut taps = (decimation * 4.0).ceil().max(11.0) as usize;
    if taps % 2 == 0 {
        taps += 1;
    }
    let taps = taps.min(MAX_LOW_PASS_TAPS);

    let cutoff = (session_rate as f32 * 0.5 / device_rate as f32).min(0.499);
    let coeffs = sinc_taps(cutoff, taps);
    let half = taps / 2;
    let mut output = Vec::with_capacity(input.len());

    for n in 0..input.len() {
        let mut acc = 0.0;
        for (k, coeff) in coeffs.iter().enumerate() {
            if let Some(idx) = (n + k).checked_sub(half) {
                if let Some(sample) = input.get(idx) {
                    acc += *sample * coeff;
                }
            }
        }
        output.push(acc);
    }

    output
}

fn sinc_taps(normalized_cutoff: f32, taps: usize) -> Vec<f32> {
    let mut coeffs = Vec::with_capacity(taps);
    let m = (taps - 1) as f32;

    for n in 0..taps {
        let centered = n as f32 - m / 2.0;
        let x = 2.0 * PI * normalized_cutoff * centered;
        let sinc = if centered == 0.0 {
            2.0 * normalized_cutoff
        } else {
            (2.0 * normalized_cutoff * x.sin()) / x
        };
        let window = if taps <= 1 {
            1.0
        } else {
            0.54 - 0.46 * ((2.0 * PI * n as f32) / m).cos()
        };
        coeffs.push(sinc * window);
    }

    let sum: f32 = coeffs.iter().sum();
    if sum != 0.0 {
        for coeff in coeffs.iter_mut() {
            *coeff /= sum;
        }
    }

    coeffs
}

#[cfg(feature = "high-quality-audio")]
pub(super) fn sinc_resample(input: &[f32], device_rate: u32, session_rate: u32) -> Result<Vec<f32>> {
    if input.is_empty() || device_rate == session_rate {
        return Ok(input.to_vec());
    }
    if !(MIN_DEVICE_RATE..=MAX_DEVICE_RATE).contains(&device_rate) {
        return Err(anyhow!(
            "unsupported device sample rate {device_rate}Hz for resampling"
        ));
    }
    let ratio = session_rate as f64 / device_rate as f64;

    let chunk = 256usize;
    let params = InterpolationParameters {
        sinc_len: 64,
        f_cutoff: 0.90,
        interpolation: InterpolationType::Cubic,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk, 1)
        .map_err(|e| anyhow!("failed to construct sinc resampler: {e:?}"))?;

    let expect = ((input.len() as f64) * ratio).round().max(1.0) as usize;
    let mut out = Vec::with_capacity(expect + 8);
    let mut seg = vec![0.0f32; chunk];
    let mut idx = 0usize;
    while idx < input.len() {
        let end = (idx + chunk).min(input.len());
        let len = end - idx;
        let pad = input[end - 1];
        seg.fill(pad);
        seg[..len].copy_from_slice(&input[idx..end]);
        let produced = resampler
            .process(std::slice::from_ref(&seg), None)
            .map_err(|e| anyhow!("sinc resampler process failed: {e:?}"))?;
        out.extend_from_slice(&produced[0]);
        idx = end;
    }

    // The chunked pad can over- or under-produce by a few samples.
    if out.len() > expect {
        out.truncate(expect);
    } else if out.len() < expect {
        let pad = out.last().copied().unwrap_or(0.0);
        out.resize(expect, pad);
    }
    Ok(out)
}
