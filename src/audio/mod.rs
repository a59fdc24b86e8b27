//! Microphone capture, level analysis, and chunk encoding.
//!
//! Audio is captured via CPAL, downmixed to mono, resampled to the session
//! rate, and flushed into transport-ready chunks on a fixed cadence. A level
//! tap feeds the UI visualizer at animation rate, independent of the flush
//! loop.

pub mod backend;
mod denoise;
mod dispatch;
pub mod encoder;
mod meter;
mod resample;
mod session;

pub use backend::{list_input_devices, CaptureBackend, CpalBackend, InputStream};
pub use encoder::{AudioCodec, ChunkEncoder, EncodedChunk, PcmWavCodec, WAV_MIME};
pub use meter::{LevelMeter, LevelSample, SYNTHETIC_LEVEL_MAX, SYNTHETIC_LEVEL_MIN};
pub use session::{CaptureSession, TickReport};
