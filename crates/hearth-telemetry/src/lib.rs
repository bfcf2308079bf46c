//! Telemetry support for the Hearth gateway: logging initialisation and the
//! Prometheus metrics registry.

mod error;
mod init;
mod metrics;

pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging};
pub use metrics::{Metrics, MetricsSnapshot};
