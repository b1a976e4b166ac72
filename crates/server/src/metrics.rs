//! Prometheus metrics export.
//!
//! The original `metrics.rs` this module is grounded on (declared in the
//! teacher's `lib.rs` module list and re-exported as `init_metrics`,
//! `record_request`, `record_error`, `record_stt_latency`,
//! `record_tts_latency`, `record_llm_latency`, `record_total_latency`)
//! was not present in the retrieved source; this rebuilds that same
//! surface against the standard `metrics`/`metrics-exporter-prometheus`
//! install-recorder pattern, since the app serves `/metrics` itself
//! rather than running the exporter's own HTTP listener.

use once_cell::sync::OnceCell;

static PROMETHEUS_HANDLE: OnceCell<metrics_exporter_prometheus::PrometheusHandle> =
    OnceCell::new();

/// Install the global metrics recorder. Safe to call more than once;
/// only the first call takes effect.
pub fn init_metrics() {
    let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");
    let _ = PROMETHEUS_HANDLE.set(handle);
}

/// Render the current metrics snapshot for the `/metrics` endpoint.
pub async fn metrics_handler() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|h| h.render())
        .unwrap_or_default()
}

pub fn record_request(event_type: &str) {
    metrics::counter!("voicegate_requests_total", "event_type" => event_type.to_string())
        .increment(1);
}

pub fn record_error(code: &str) {
    metrics::counter!("voicegate_errors_total", "code" => code.to_string()).increment(1);
}

pub fn record_stt_latency(millis: f64) {
    metrics::histogram!("voicegate_stt_latency_ms").record(millis);
}

pub fn record_tts_latency(millis: f64) {
    metrics::histogram!("voicegate_tts_latency_ms").record(millis);
}

pub fn record_llm_latency(millis: f64) {
    metrics::histogram!("voicegate_llm_latency_ms").record(millis);
}

pub fn record_total_latency(millis: f64) {
    metrics::histogram!("voicegate_response_total_latency_ms").record(millis);
}

pub fn record_active_sessions(count: usize) {
    metrics::gauge!("voicegate_active_sessions").set(count as f64);
}

pub fn record_active_connections(count: usize) {
    metrics::gauge!("voicegate_active_connections").set(count as f64);
}

pub fn record_dropped_frame(reason: &str) {
    metrics::counter!("voicegate_dropped_frames_total", "reason" => reason.to_string())
        .increment(1);
}
