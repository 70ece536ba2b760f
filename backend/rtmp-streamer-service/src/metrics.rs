use std::time::Duration;

use actix_web::{HttpRequest, HttpResponse};
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, TextEncoder,
};

static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "rtmp_streamer_http_requests_total",
            "Total HTTP requests handled by rtmp-streamer-service",
        ),
        &["method", "path", "status"],
    )
    .expect("failed to create rtmp_streamer_http_requests_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register rtmp_streamer_http_requests_total");
    counter
});

static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let histogram = HistogramVec::new(
        HistogramOpts::new(
            "rtmp_streamer_http_request_duration_seconds",
            "HTTP request latency for rtmp-streamer-service",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
        ]),
        &["method", "path", "status"],
    )
    .expect("failed to create rtmp_streamer_http_request_duration_seconds");
    prometheus::default_registry()
        .register(Box::new(histogram.clone()))
        .expect("failed to register rtmp_streamer_http_request_duration_seconds");
    histogram
});

static STREAM_OPERATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "rtmp_streamer_stream_operations_total",
            "Stream start/stop/check operations by outcome",
        ),
        &["operation", "outcome"],
    )
    .expect("failed to create rtmp_streamer_stream_operations_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register rtmp_streamer_stream_operations_total");
    counter
});

static ACTIVE_STREAMS: Lazy<IntGauge> = Lazy::new(|| {
    let gauge = IntGauge::new(
        "rtmp_streamer_active_streams",
        "Relay processes currently owned by the controller",
    )
    .expect("failed to create rtmp_streamer_active_streams");
    prometheus::default_registry()
        .register(Box::new(gauge.clone()))
        .expect("failed to register rtmp_streamer_active_streams");
    gauge
});

/// Route pattern for the `path` label, so plugin identifiers in the URL do
/// not mint new series
pub fn route_label(req: &HttpRequest) -> String {
    req.match_pattern()
        .unwrap_or_else(|| "unmatched".to_string())
}

pub fn observe_http_request(method: &str, path: &str, status: u16, elapsed: Duration) {
    let status_label = status.to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status_label])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path, &status_label])
        .observe(elapsed.as_secs_f64());
}

pub fn record_stream_operation(operation: &str, outcome: &str) {
    STREAM_OPERATIONS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
}

pub fn set_active_streams(count: i64) {
    ACTIVE_STREAMS.set(count);
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
