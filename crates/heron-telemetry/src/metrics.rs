//! Dispatch metrics.
//!
//! Heron records through the `metrics` facade. No exporter is bundled; an
//! application installs its own recorder and may call
//! [`describe_metrics`] once afterwards.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `heron_dispatch_total` | Counter | `result` | Dispatches by result |
//! | `heron_dispatch_duration_seconds` | Histogram | `result` | Time spent capturing, planning, invoking and responding |
//! | `heron_validation_failures_total` | Counter | `record` | Records rejected by the validator |

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Duration;

/// Dispatch counter name.
pub const DISPATCH_TOTAL: &str = "heron_dispatch_total";

/// Dispatch duration histogram name.
pub const DISPATCH_DURATION: &str = "heron_dispatch_duration_seconds";

/// Validation failure counter name.
pub const VALIDATION_FAILURES: &str = "heron_validation_failures_total";

/// Registers descriptions for all standard metrics.
pub fn describe_metrics() {
    describe_counter!(DISPATCH_TOTAL, "Total number of handler dispatches by result");
    describe_histogram!(
        DISPATCH_DURATION,
        Unit::Seconds,
        "Handler dispatch duration in seconds"
    );
    describe_counter!(
        VALIDATION_FAILURES,
        "Total number of records rejected by the validator"
    );
}

/// Records a completed dispatch.
///
/// Updates the following metrics:
/// - `heron_dispatch_total` (incremented)
/// - `heron_dispatch_duration_seconds` (histogram observation)
pub fn record_dispatch(result: &'static str, duration: Duration) {
    counter!(DISPATCH_TOTAL, "result" => result).increment(1);
    histogram!(DISPATCH_DURATION, "result" => result).record(duration.as_secs_f64());
}

/// Records a dispatch that ran nothing, such as an aborted request.
pub fn record_skipped(result: &'static str) {
    counter!(DISPATCH_TOTAL, "result" => result).increment(1);
}

/// Records a validation failure for `record`.
pub fn record_validation_failure(record: &'static str) {
    counter!(VALIDATION_FAILURES, "record" => record).increment(1);
}
