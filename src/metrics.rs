//! Prometheus metrics for monitoring and alerting.
//!
//! NOTE: user ids never appear in labels to keep cardinality bounded.

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global metrics registry
    pub static ref METRICS_REGISTRY: Registry = Registry::new();

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "spesa_http_request_duration_seconds",
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        &["method", "endpoint", "status"]
    ).unwrap();

    /// Total HTTP requests
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("spesa_http_requests_total", "Total HTTP requests"),
        &["method", "endpoint", "status"]
    ).unwrap();

    /// Item ingestion operations by result
    pub static ref ITEM_INGEST_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("spesa_item_ingest_total", "Total item ingestion operations"),
        &["result"]
    ).unwrap();

    /// Similarity suggestions by outcome (hit/miss)
    pub static ref SUGGESTION_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "spesa_suggestion_total",
            "Similarity suggestion lookups by outcome"
        ),
        &["outcome"]
    ).unwrap();

    /// Notifications fanned out, by kind
    pub static ref NOTIFICATION_FANOUT_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "spesa_notification_fanout_total",
            "Notifications created, by kind"
        ),
        &["kind"]
    ).unwrap();

    /// Emails attempted, by result (sent/skipped/error)
    pub static ref EMAIL_SEND_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("spesa_email_send_total", "Email send attempts by result"),
        &["result"]
    ).unwrap();
}

/// Register all metrics with the global registry. Call once at startup.
pub fn register_metrics() {
    let registry = &METRICS_REGISTRY;

    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(ITEM_INGEST_TOTAL.clone()),
        Box::new(SUGGESTION_TOTAL.clone()),
        Box::new(NOTIFICATION_FANOUT_TOTAL.clone()),
        Box::new(EMAIL_SEND_TOTAL.clone()),
    ];

    for collector in collectors {
        if let Err(e) = registry.register(collector) {
            // Double registration is harmless in tests
            tracing::debug!("Metric registration skipped: {e}");
        }
    }
}

/// Render all metrics in Prometheus text format.
pub fn gather() -> String {
    use prometheus::Encoder;

    let encoder = prometheus::TextEncoder::new();
    let families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {e}");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
