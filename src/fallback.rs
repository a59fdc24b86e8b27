//! Synthetic data for demo mode.
//!
//! When the real pipeline cannot produce audio, the generator emits silent
//! but transport-valid chunks and transcription-shaped results so the
//! downstream display and metric paths keep moving. Output always carries
//! `synthetic=true` and never runs concurrently with a live capture session.

use crate::audio::{ChunkEncoder, EncodedChunk};
use crate::config::{ModelKind, SessionConfig};
use crate::error::EncodingError;
use crate::protocol::{Sentiment, TranscriptionResult};
use std::time::{SystemTime, UNIX_EPOCH};

/// Duration of each silent chunk (milliseconds). Long enough to be a valid
/// container, short enough to be negligible on the wire.
const SILENT_CHUNK_MS: u64 = 250;

pub(crate) const DEMO_PHRASES: [&str; 15] = [
    "This is a demonstration of the speech recognition system.",
    "I'm really excited about using this application for my project.",
    "The weather today is absolutely beautiful outside.",
    "Can you tell me how well the different speech recognition models compare?",
    "I'm not sure if my microphone is working correctly but this is a test.",
    "Speech recognition technology has improved tremendously in recent years.",
    "I'm feeling happy today and looking forward to learning more about this system.",
    "This dark mode interface looks amazing with the audio visualizer.",
    "Could you analyze the sentiment of this message please?",
    "Using artificial intelligence for speech recognition is fascinating.",
    "The quick brown fox jumps over the lazy dog.",
    "How much wood would a woodchuck chuck if a woodchuck could chuck wood?",
    "To be or not to be, that is the question.",
    "Artificial intelligence is revolutionizing many industries.",
    "Voice assistants like Siri and Alexa use speech recognition algorithms.",
];

const EMOTIONS: [&str; 8] = [
    "joy",
    "excitement",
    "curiosity",
    "satisfaction",
    "interest",
    "concern",
    "confusion",
    "surprise",
];

/// Small xorshift64* generator. Seedable so tests are deterministic; the
/// output only has to look plausible, not be unpredictable.
#[derive(Debug)]
pub(crate) struct SyntheticRng {
    state: u64,
}

impl SyntheticRng {
    pub(crate) fn seeded(seed: u64) -> Self {
        Self {
            state: seed | 1, // xorshift must not start at zero
        }
    }

    pub(crate) fn from_entropy() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos() as u64;
        let seed = nanos
            .wrapping_mul(0x9E37_79B9_7F4A_7C15)
            .wrapping_add(std::process::id() as u64);
        Self::seeded(seed)
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Uniform in [0, 1).
    pub(crate) fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    pub(crate) fn range_f32(&mut self, lo: f32, hi: f32) -> f32 {
        lo + self.next_f32() * (hi - lo)
    }

    pub(crate) fn range_u64(&mut self, lo: u64, hi: u64) -> u64 {
        if hi <= lo {
            return lo;
        }
        lo + self.next_u64() % (hi - lo)
    }

    pub(crate) fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }
}

pub struct FallbackGenerator {
    model: ModelKind,
    sentiment: bool,
    encoder: ChunkEncoder,
    silent_samples: usize,
    rng: SyntheticRng,
}

impl FallbackGenerator {
    pub fn new(config: &SessionConfig) -> Self {
        Self::with_rng(config, SyntheticRng::from_entropy())
    }

    #[cfg(test)]
    pub(crate) fn seeded(config: &SessionConfig, seed: u64) -> Self {
        Self::with_rng(config, SyntheticRng::seeded(seed))
    }

    fn with_rng(config: &SessionConfig, rng: SyntheticRng) -> Self {
        let silent_samples =
            ((config.sample_rate as u64 * SILENT_CHUNK_MS) / 1000).max(1) as usize;
        Self {
            model: config.model,
            sentiment: config.sentiment,
            encoder: ChunkEncoder::new(config.sample_rate, 1),
            silent_samples,
            rng,
        }
    }

    /// A minimal valid silent chunk, flagged synthetic, for transport-format
    /// compatibility while degraded.
    pub fn silent_chunk(&mut self) -> Result<EncodedChunk, EncodingError> {
        let silence = vec![0.0f32; self.silent_samples];
        let mut chunk = self.encoder.encode(&silence)?;
        chunk.synthetic = true;
        Ok(chunk)
    }

    /// A transcription-shaped result with per-model confidence and latency
    /// ranges, bypassing the backend entirely.
    pub fn synthetic_result(&mut self) -> TranscriptionResult {
        let text = (*self.rng.pick(&DEMO_PHRASES)).to_string();
        let (confidence, processing_time) = match self.model {
            ModelKind::Google => (
                self.rng.range_f32(0.80, 0.95),
                self.rng.range_u64(100, 250),
            ),
            ModelKind::Vosk => (self.rng.range_f32(0.70, 0.90), self.rng.range_u64(50, 130)),
            ModelKind::Whisper => (
                self.rng.range_f32(0.85, 0.95),
                self.rng.range_u64(150, 350),
            ),
        };
        let sentiment = self.sentiment.then(|| self.synthetic_sentiment());
        TranscriptionResult {
            text,
            confidence,
            model: self.model.id().to_string(),
            processing_time,
            timestamp: unix_millis(),
            sentiment,
        }
    }

    fn synthetic_sentiment(&mut self) -> Sentiment {
        let polarity = self.rng.range_f32(-1.0, 1.0);
        let (label, emoji) = if polarity < -0.6 {
            ("Very Negative", "😡")
        } else if polarity < -0.2 {
            ("Negative", "😕")
        } else if polarity < 0.2 {
            ("Neutral", "😐")
        } else if polarity < 0.6 {
            ("Positive", "🙂")
        } else {
            ("Very Positive", "😄")
        };
        Sentiment {
            polarity,
            label: label.to_string(),
            emoji: emoji.to_string(),
            confidence: self.rng.range_f32(0.70, 0.95),
            specific_emotion: (*self.rng.pick(&EMOTIONS)).to_string(),
        }
    }
}

pub(crate) fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::WAV_MIME;
    use crate::config::SessionConfig;

    fn config(model: ModelKind, sentiment: bool) -> SessionConfig {
        SessionConfig {
            model,
            sentiment,
            ..SessionConfig::default()
        }
    }

    #[test]
    fn rng_is_deterministic_for_a_seed() {
        let mut a = SyntheticRng::seeded(7);
        let mut b = SyntheticRng::seeded(7);
        for _ in 0..32 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn rng_ranges_stay_in_bounds() {
        let mut rng = SyntheticRng::seeded(42);
        for _ in 0..1000 {
            let f = rng.range_f32(0.2, 0.8);
            assert!((0.2..=0.8).contains(&f));
            let u = rng.range_u64(100, 250);
            assert!((100..250).contains(&u));
        }
    }

    #[test]
    fn silent_chunk_is_synthetic_wav() {
        let mut gen = FallbackGenerator::seeded(&config(ModelKind::Google, true), 1);
        let chunk = gen.silent_chunk().expect("silent chunk");
        assert!(chunk.synthetic);
        assert_eq!(chunk.mime, WAV_MIME);
        assert_eq!(&chunk.bytes[0..4], b"RIFF");
        // 250ms of mono 16-bit at 16kHz plus the 44-byte header.
        assert_eq!(chunk.bytes.len(), 44 + 4_000 * 2);
    }

    #[test]
    fn results_respect_model_ranges() {
        let mut gen = FallbackGenerator::seeded(&config(ModelKind::Vosk, false), 9);
        for _ in 0..100 {
            let result = gen.synthetic_result();
            assert_eq!(result.model, "vosk");
            assert!((0.70..=0.90).contains(&result.confidence));
            assert!((50..130).contains(&result.processing_time));
            assert!(result.sentiment.is_none());
            assert!(DEMO_PHRASES.contains(&result.text.as_str()));
        }
    }

    #[test]
    fn whisper_results_are_slower_and_more_confident() {
        let mut gen = FallbackGenerator::seeded(&config(ModelKind::Whisper, false), 11);
        for _ in 0..100 {
            let result = gen.synthetic_result();
            assert!((0.85..=0.95).contains(&result.confidence));
            assert!((150..350).contains(&result.processing_time));
        }
    }

    #[test]
    fn sentiment_labels_match_polarity_bands() {
        let mut gen = FallbackGenerator::seeded(&config(ModelKind::Google, true), 13);
        for _ in 0..200 {
            let sentiment = gen.synthetic_result().sentiment.expect("sentiment enabled");
            assert!((-1.0..=1.0).contains(&sentiment.polarity));
            let expected = if sentiment.polarity < -0.6 {
                "Very Negative"
            } else if sentiment.polarity < -0.2 {
                "Negative"
            } else if sentiment.polarity < 0.2 {
                "Neutral"
            } else if sentiment.polarity < 0.6 {
                "Positive"
            } else {
                "Very Positive"
            };
            assert_eq!(sentiment.label, expected);
            assert!((0.70..=0.95).contains(&sentiment.confidence));
            assert!(EMOTIONS.contains(&sentiment.specific_emotion.as_str()));
        }
    }
}
