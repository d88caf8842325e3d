//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dev_server_requests_total` (counter): requests by method, status
//! - `dev_server_request_duration_seconds` (histogram): latency distribution
//! - `dev_server_resource_invocations_total` (counter): actions run, by stage and resource
//! - `dev_server_pipeline_failures_total` (counter): aborted requests, by stage
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus recorder.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics recorder"),
    }
}

/// Record a finished request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "dev_server_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("dev_server_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record a resource action about to run.
pub fn record_resource_invocation(stage: &'static str, resource: &str) {
    counter!(
        "dev_server_resource_invocations_total",
        "stage" => stage,
        "resource" => resource.to_string()
    )
    .increment(1);
}

/// Record a request aborted by a failing action.
pub fn record_pipeline_failure(stage: &'static str) {
    counter!("dev_server_pipeline_failures_total", "stage" => stage).increment(1);
}
