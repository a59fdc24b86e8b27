//! Error taxonomy for the capture pipeline.
//!
//! Every variant here is recoverable: the orchestrator converts capture and
//! encoding failures into a Degraded transition instead of propagating them
//! to the caller. Only [`ConfigError`] surfaces synchronously from `start()`.

use std::time::Duration;
use thiserror::Error;

/// Failure while acquiring the microphone and building the input graph.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// The platform exposes no audio capture capability at all.
    #[error("audio capture is not supported on this platform: {0}")]
    Unsupported(String),

    /// Device enumeration succeeded but returned no input devices.
    #[error("no audio input devices are present")]
    NoDevice,

    /// The requested input device exists but was not found by name.
    #[error("input device '{0}' not found")]
    DeviceNotFound(String),

    /// The platform rejected the stream request.
    #[error("microphone permission denied: {0}")]
    PermissionDenied(String),

    /// The device disappeared or refused the requested track.
    #[error("input track unavailable: {0}")]
    TrackUnavailable(String),

    /// Acquisition did not complete within the configured bound. Treated
    /// identically to a permission denial by the orchestrator.
    #[error("acquisition timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Graph(#[from] GraphConstructionError),
}

/// The decoding graph (stream, analysis tap, frame pump) could not be built.
#[derive(Debug, Error)]
#[error("audio graph construction failed: {reason}")]
pub struct GraphConstructionError {
    pub reason: String,
}

impl GraphConstructionError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Encoding failure inside the capture tick loop. The orchestrator counts
/// these like silent ticks rather than letting them escape.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("no codec available for '{0}'")]
    CodecUnavailable(String),

    #[error("cannot encode an empty frame buffer")]
    EmptyBuffer,

    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("container write failed: {0}")]
    Container(String),
}

/// Invalid configuration supplied by the caller. The one error class that is
/// reported synchronously at `start()` instead of via a state transition.
#[derive(Debug, Error)]
#[error("invalid {field}: {reason}")]
pub struct ConfigError {
    pub field: &'static str,
    pub reason: String,
}

impl ConfigError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}
