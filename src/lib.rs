pub mod audio;
pub mod config;
pub mod error;
pub mod fallback;
mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod protocol;
pub mod sink;
mod telemetry;

pub use logging::{crash_log_path, init_logging, log_debug, log_file_path, log_panic};
pub use telemetry::init_tracing;

pub use audio::{list_input_devices, LevelMeter, LevelSample};
pub use config::{AppConfig, FallbackPolicy, ModelKind, SessionConfig};
pub use error::{AcquisitionError, ConfigError, EncodingError, GraphConstructionError};
pub use fallback::FallbackGenerator;
pub use metrics::{MetricsReport, PerformanceTracker};
pub use orchestrator::{Orchestrator, PipelineState};
pub use protocol::{OutboundEvent, Sentiment, TranscriptionResult};
pub use sink::{BufferedSink, EventSink, FnSink, NdjsonSink};
