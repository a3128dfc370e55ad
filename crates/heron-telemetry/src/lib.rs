//! Observability for Heron.
//!
//! - **Logging**: structured JSON or pretty logs via `tracing-subscriber`
//! - **Metrics**: dispatch counters and histograms via the `metrics` facade
//!
//! Heron's own crates emit `tracing` events and record metrics whether or
//! not anything here is initialized.
//!
//! # Example
//!
//! ```rust,ignore
//! use heron_telemetry::{init_logging, describe_metrics, LogConfig};
//!
//! init_logging(&LogConfig::production())?;
//! describe_metrics();
//! ```

#![doc(html_root_url = "https://docs.rs/heron-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};
pub use metrics::describe_metrics;

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
