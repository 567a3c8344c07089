use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Logs go to stderr so `snapshot` output on stdout stays machine-readable.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "solstate_fetch_attempt_total",
            Unit::Count,
            "Total number of upstream fetch attempts, retries included."
        );
        describe_counter!(
            "solstate_fetch_failure_total",
            Unit::Count,
            "Total number of failed upstream fetch attempts."
        );
        describe_counter!(
            "solstate_fetch_fallback_total",
            Unit::Count,
            "Total number of chart loads served from bundled fallback data."
        );
        describe_histogram!(
            "solstate_fetch_ms",
            Unit::Milliseconds,
            "Upstream fetch attempt latency in milliseconds."
        );
        describe_counter!(
            "solstate_refresh_stale_total",
            Unit::Count,
            "Total number of chart refreshes discarded because a newer one was issued."
        );
    });
}
