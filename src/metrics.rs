//! Prometheus metrics for proxy traffic.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::warn;

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus recorder, once per process.
///
/// Later calls return the same handle, so building several routers (as the
/// tests do) keeps reporting into one registry.
pub fn init() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| {
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();
            if let Err(e) = metrics::set_global_recorder(recorder) {
                warn!("Metrics recorder already installed: {}", e);
            }
            handle
        })
        .clone()
}

/// Count a finished proxy request
pub fn record_request(endpoint: &'static str, status: u16) {
    counter!(
        "hls_proxy_requests_total",
        "endpoint" => endpoint,
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record handler latency up to the response head
pub fn record_duration(endpoint: &'static str, start: Instant) {
    histogram!("hls_proxy_request_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}

/// Count lines passed through the rewriter
pub fn record_playlist_lines(count: usize) {
    counter!("hls_proxy_playlist_lines_total").increment(count as u64);
}
