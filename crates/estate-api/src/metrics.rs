//! Prometheus metrics for the API server.

use std::sync::LazyLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex::Regex;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "estate_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "estate_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "estate_http_requests_in_flight";

    // Render metrics
    pub const RENDERS_TOTAL: &str = "estate_renders_total";
    pub const RENDER_DURATION_SECONDS: &str = "estate_render_duration_seconds";

    // Upload and scrape metrics
    pub const UPLOADED_FILES_TOTAL: &str = "estate_uploaded_files_total";
    pub const SCRAPES_TOTAL: &str = "estate_scrapes_total";
    pub const SCRAPED_PHOTOS_TOTAL: &str = "estate_scraped_photos_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "estate_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a finished render attempt.
pub fn record_render(template: &str, status: &str, duration_secs: f64) {
    let labels = [
        ("template", template.to_string()),
        ("status", status.to_string()),
    ];
    counter!(names::RENDERS_TOTAL, &labels).increment(1);
    histogram!(names::RENDER_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record uploaded files.
pub fn record_uploaded_files(kind: &str, count: usize) {
    let labels = [("kind", kind.to_string())];
    counter!(names::UPLOADED_FILES_TOTAL, &labels).increment(count as u64);
}

/// Record a listing scrape outcome.
pub fn record_scrape(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::SCRAPES_TOTAL, &labels).increment(1);
}

/// Record photos saved from a scraped listing.
pub fn record_scraped_photos(count: usize) {
    counter!(names::SCRAPED_PHOTOS_TOTAL).increment(count as u64);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

static DOWNLOAD_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/download/[^/]+$").unwrap());
static UPLOADS_PATH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^/uploads/.+$").unwrap());

/// Sanitize path for metrics labels (remove file names).
fn sanitize_path(path: &str) -> String {
    if DOWNLOAD_PATH.is_match(path) {
        "/download/:filename".to_string()
    } else if UPLOADS_PATH.is_match(path) {
        "/uploads/*path".to_string()
    } else {
        path.to_string()
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
