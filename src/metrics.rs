//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{Counter, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("vidtube_http_requests_total", "Total number of HTTP requests"),
        &["method", "status"]
    ).expect("metric can be created");
    pub static ref HTTP_REQUEST_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "vidtube_http_request_duration_seconds",
            "HTTP request duration in seconds"
        ).buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method"]
    ).expect("metric can be created");

    // Storage Metrics
    pub static ref MEDIA_UPLOADS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("vidtube_media_uploads_total", "Total number of media uploads"),
        &["kind"]
    ).expect("metric can be created");
    pub static ref MEDIA_BYTES_UPLOADED: Counter = Counter::new(
        "vidtube_media_bytes_uploaded_total",
        "Total bytes of media uploaded"
    ).expect("metric can be created");

    // Domain Metrics
    pub static ref USERS_REGISTERED_TOTAL: IntCounter = IntCounter::new(
        "vidtube_users_registered_total",
        "Total number of registered users"
    ).expect("metric can be created");
    pub static ref VIDEOS_PUBLISHED_TOTAL: IntCounter = IntCounter::new(
        "vidtube_videos_published_total",
        "Total number of published videos"
    ).expect("metric can be created");
    pub static ref VIDEO_VIEWS_TOTAL: IntCounter = IntCounter::new(
        "vidtube_video_views_total",
        "Total number of counted (first-time) video views"
    ).expect("metric can be created");
    pub static ref RELATION_TOGGLES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("vidtube_relation_toggles_total", "Total number of like/subscription toggles"),
        &["relation", "outcome"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("vidtube_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
///
/// Safe to call more than once; only the first call registers.
pub fn init_metrics() {
    static INIT: std::sync::Once = std::sync::Once::new();

    INIT.call_once(|| {
        REGISTRY
            .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
            .expect("HTTP_REQUESTS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
            .expect("HTTP_REQUEST_DURATION_SECONDS can be registered");
        REGISTRY
            .register(Box::new(MEDIA_UPLOADS_TOTAL.clone()))
            .expect("MEDIA_UPLOADS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(MEDIA_BYTES_UPLOADED.clone()))
            .expect("MEDIA_BYTES_UPLOADED can be registered");
        REGISTRY
            .register(Box::new(USERS_REGISTERED_TOTAL.clone()))
            .expect("USERS_REGISTERED_TOTAL can be registered");
        REGISTRY
            .register(Box::new(VIDEOS_PUBLISHED_TOTAL.clone()))
            .expect("VIDEOS_PUBLISHED_TOTAL can be registered");
        REGISTRY
            .register(Box::new(VIDEO_VIEWS_TOTAL.clone()))
            .expect("VIDEO_VIEWS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(RELATION_TOGGLES_TOTAL.clone()))
            .expect("RELATION_TOGGLES_TOTAL can be registered");
        REGISTRY
            .register(Box::new(ERRORS_TOTAL.clone()))
            .expect("ERRORS_TOTAL can be registered");

        tracing::info!("Metrics registry initialized");
    });
}

/// Record a finished HTTP request.
pub fn observe_http_request(method: &str, status: u16, elapsed: std::time::Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method])
        .observe(elapsed.as_secs_f64());
}
