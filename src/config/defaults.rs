//! Default values shared between the CLI surface and library constructors.

/// Default sample rate for encoded chunks (Hz).
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

/// Default channel count requested from the input device.
pub const DEFAULT_CHANNELS: u16 = 1;

/// How often buffered audio is flushed into a chunk (milliseconds).
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 2_000;

/// Consecutive zero-energy flush ticks before the pipeline degrades.
pub const DEFAULT_SILENCE_TICKS: u32 = 10;

/// RMS below this counts a flush tick as silent.
pub const DEFAULT_SILENCE_RMS: f32 = 1e-3;

/// Delay before the first synthetic emission after entering demo mode (ms).
pub const DEFAULT_FALLBACK_INITIAL_DELAY_MS: u64 = 500;

/// Cadence of synthetic emissions while degraded (milliseconds).
pub const DEFAULT_FALLBACK_INTERVAL_MS: u64 = 4_000;

/// Upper bound on microphone acquisition before it is treated as denied (ms).
pub const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 5_000;

/// Outbound events queued while the transport is unavailable before the
/// oldest are dropped.
pub const DEFAULT_SINK_QUEUE_BOUND: usize = 32;

/// Size of the frames handed from the stream callback to the flush loop (ms).
pub const DEFAULT_FRAME_MS: u64 = 20;

/// Capacity of the frame channel between the stream callback and the flush
/// loop. Overflow drops frames rather than blocking the callback.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// How long the CLI records before stopping (seconds).
pub const DEFAULT_RUN_SECONDS: u64 = 30;

pub const MIN_SAMPLE_RATE: u32 = 8_000;
pub const MAX_SAMPLE_RATE: u32 = 96_000;
pub const MAX_FLUSH_INTERVAL_MS: u64 = 10_000;
pub const MAX_FALLBACK_INTERVAL_MS: u64 = 30_000;
pub const MAX_ACQUIRE_TIMEOUT_MS: u64 = 30_000;
