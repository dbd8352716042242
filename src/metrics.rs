use anyhow::{Context, Result};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;
use tracing::info;

/// Latency buckets for HTTP requests: 1ms up to 10s
const HTTP_DURATION_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Install the global Prometheus recorder.
/// The returned handle renders the exposition text served at `/metrics`.
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            HTTP_DURATION_BUCKETS,
        )
        .context("Failed to set buckets for http_request_duration_seconds")?
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    info!("Prometheus metrics recorder installed");
    Ok(handle)
}

/// Register API metrics at zero so they show up in queries before the first event
pub fn initialize_api_metrics() {
    // Reading ingestion
    metrics::counter!("readings.created").absolute(0);
    metrics::counter!("readings.decode_failed").absolute(0);
    metrics::counter!("readings.device_not_found").absolute(0);

    // Authentication
    metrics::counter!("auth.login.succeeded").absolute(0);
    metrics::counter!("auth.login.failed").absolute(0);

    metrics::gauge!("process.is_up").set(1.0);
}

/// Refresh the uptime gauge every few seconds until the process exits
pub async fn uptime_task() {
    let start_time = Instant::now();
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(5));

    loop {
        interval.tick().await;
        metrics::gauge!("process.uptime.seconds").set(start_time.elapsed().as_secs_f64());
    }
}
