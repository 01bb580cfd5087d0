//! Prometheus metrics for vendor tracepoint discovery

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge, CounterVec, Encoder, Gauge, TextEncoder,
};

lazy_static! {
    /// Categories discovered, by source ("manifest" or "hal").
    pub static ref CATEGORIES_DISCOVERED: CounterVec = register_counter_vec!(
        "vendor_tracepoints_categories_total",
        "Vendor categories discovered",
        &["source"]
    ).expect("failed to register CATEGORIES_DISCOVERED metric");

    /// Tracepoints discovered across all categories, by source.
    pub static ref TRACEPOINTS_DISCOVERED: CounterVec = register_counter_vec!(
        "vendor_tracepoints_tracepoints_total",
        "Vendor tracepoints discovered",
        &["source"]
    ).expect("failed to register TRACEPOINTS_DISCOVERED metric");

    /// Rejected manifests, by error kind (see `ManifestError::kind`).
    pub static ref MANIFEST_ERRORS: CounterVec = register_counter_vec!(
        "vendor_tracepoints_manifest_errors_total",
        "Vendor manifest parse failures",
        &["kind"]
    ).expect("failed to register MANIFEST_ERRORS metric");

    /// HAL or tracefs calls that reported failure during probing, by step.
    pub static ref PROBE_FAILURES: CounterVec = register_counter_vec!(
        "vendor_tracepoints_probe_failures_total",
        "Failed steps while probing vendor categories",
        &["step"]
    ).expect("failed to register PROBE_FAILURES metric");

    /// Wall time of the most recent discovery run.
    pub static ref DISCOVERY_DURATION: Gauge = register_gauge!(
        "vendor_tracepoints_discovery_duration_seconds",
        "Duration of the last vendor tracepoint discovery"
    ).expect("failed to register DISCOVERY_DURATION metric");
}

/// Record the size of a successful discovery.
pub fn record_discovered(source: &str, categories: usize, tracepoints: usize) {
    CATEGORIES_DISCOVERED
        .with_label_values(&[source])
        .inc_by(categories as f64);
    TRACEPOINTS_DISCOVERED
        .with_label_values(&[source])
        .inc_by(tracepoints as f64);
}

/// Text exposition of every registered metric.
pub fn render() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
