//! Chunk encoding into a transport-ready container.
//!
//! The built-in codec writes a self-describing RIFF/WAVE container: 44-byte
//! fixed header with little-endian fields, then 16-bit signed PCM. Codec
//! selection sits behind a trait so a platform codec can be substituted; the
//! `mime` tag on each chunk tells the receiver which encoding it got.

use crate::error::EncodingError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::io::Cursor;

pub const WAV_MIME: &str = "audio/wav";

/// Converts raw mono float frames into container bytes.
pub trait AudioCodec: Send + Sync {
    fn mime(&self) -> &'static str;
    fn encode(
        &self,
        frames: &[f32],
        sample_rate: u32,
        channels: u16,
    ) -> Result<Vec<u8>, EncodingError>;
}

/// Clamp to [-1, 1] then scale to the signed 16-bit range. The cast truncates
/// toward zero, so full-scale input maps exactly to ±0x7FFF.
pub(crate) fn pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32_767.0) as i16
}

/// The always-available uncompressed fallback: WAV with 16-bit PCM payload.
pub struct PcmWavCodec;

impl AudioCodec for PcmWavCodec {
    fn mime(&self) -> &'static str {
        WAV_MIME
    }

    fn encode(
        &self,
        frames: &[f32],
        sample_rate: u32,
        channels: u16,
    ) -> Result<Vec<u8>, EncodingError> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .map_err(|e| EncodingError::Container(e.to_string()))?;
            for sample in frames {
                writer
                    .write_sample(pcm16(*sample))
                    .map_err(|e| EncodingError::Container(e.to_string()))?;
            }
            writer
                .finalize()
                .map_err(|e| EncodingError::Container(e.to_string()))?;
        }
        Ok(cursor.into_inner())
    }
}

/// One transport-ready unit of encoded audio. Immutable once produced and
/// consumed exactly once by the outbound sink.
#[derive(Debug, Clone)]
pub struct EncodedChunk {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    /// True when the chunk was generated rather than captured.
    pub synthetic: bool,
}

impl EncodedChunk {
    /// `data:` URI framing for the transport layer.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64.encode(&self.bytes))
    }
}

pub struct ChunkEncoder {
    codec: Box<dyn AudioCodec>,
    sample_rate: u32,
    channels: u16,
}

impl ChunkEncoder {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self::with_codec(Box::new(PcmWavCodec), sample_rate, channels)
    }

    pub fn with_codec(codec: Box<dyn AudioCodec>, sample_rate: u32, channels: u16) -> Self {
        Self {
            codec,
            sample_rate,
            channels,
        }
    }

    pub fn mime(&self) -> &'static str {
        self.codec.mime()
    }

    /// Encode one flush window. Errors return to the tick loop instead of
    /// unwinding it.
    pub fn encode(&self, frames: &[f32]) -> Result<EncodedChunk, EncodingError> {
        if frames.is_empty() {
            return Err(EncodingError::EmptyBuffer);
        }
        if frames.iter().any(|s| !s.is_finite()) {
            return Err(EncodingError::MalformedFrame(
                "non-finite sample in frame buffer".to_string(),
            ));
        }
        let bytes = self.codec.encode(frames, self.sample_rate, self.channels)?;
        Ok(EncodedChunk {
            bytes,
            mime: self.codec.mime(),
            synthetic: false,
        })
    }
}
