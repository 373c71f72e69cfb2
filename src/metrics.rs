use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the global Prometheus recorder
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    init_metric_descriptions();

    Ok(handle)
}

/// Can be called multiple times safely
fn init_metric_descriptions() {
    describe_counter!(
        "chat_relay_requests_total",
        "Completion requests relayed, by provider"
    );
    describe_histogram!(
        "chat_relay_request_duration_seconds",
        "Upstream completion latency in seconds"
    );
    describe_counter!(
        "chat_relay_errors_total",
        "Failed /ask requests, by error kind"
    );
    describe_gauge!("chat_relay_info", "Service version information");

    gauge!("chat_relay_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}

pub fn record_request(provider: &str) {
    counter!("chat_relay_requests_total", "provider" => provider.to_string()).increment(1);
}

pub fn record_duration(provider: &str, duration: Duration) {
    histogram!(
        "chat_relay_request_duration_seconds",
        "provider" => provider.to_string(),
    )
    .record(duration.as_secs_f64());
}

pub fn record_error(kind: &str) {
    counter!("chat_relay_errors_total", "kind" => kind.to_string()).increment(1);
}
