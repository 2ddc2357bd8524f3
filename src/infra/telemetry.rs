use std::sync::Once;

use metrics::{Unit, describe_counter};
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
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
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
            "dealstack_list_cache_hit_total",
            Unit::Count,
            "Total number of list cache hits."
        );
        describe_counter!(
            "dealstack_list_cache_miss_total",
            Unit::Count,
            "Total number of list cache misses."
        );
        describe_counter!(
            "dealstack_list_cache_expired_total",
            Unit::Count,
            "Total number of list cache entries evicted on expiry."
        );
        describe_counter!(
            "dealstack_click_accepted_total",
            Unit::Count,
            "Total number of accepted offer clicks."
        );
        describe_counter!(
            "dealstack_click_rate_limited_total",
            Unit::Count,
            "Total number of clicks rejected by the rate limiter."
        );
        describe_counter!(
            "dealstack_click_audit_enqueued_total",
            Unit::Count,
            "Total number of click audit records enqueued."
        );
        describe_counter!(
            "dealstack_click_audit_dropped_total",
            Unit::Count,
            "Total number of click audit records dropped due to queue overflow."
        );
        describe_counter!(
            "dealstack_click_audit_failed_total",
            Unit::Count,
            "Total number of click audit writes that failed."
        );
    });
}
