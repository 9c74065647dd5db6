//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "shortclip_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "shortclip_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "shortclip_http_requests_in_flight";

    // Domain metrics
    pub const REQUESTS_CREATED_TOTAL: &str = "shortclip_conversion_requests_created_total";
    pub const STATUS_UPDATES_TOTAL: &str = "shortclip_status_updates_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "shortclip_rate_limit_hits_total";
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

/// Record a conversion request created.
pub fn record_request_created() {
    counter!(names::REQUESTS_CREATED_TOTAL).increment(1);
}

/// Record a status update, labeled by the new status.
pub fn record_status_update(status: &str) {
    let labels = [("status", status.to_string())];
    counter!(names::STATUS_UPDATES_TOTAL, &labels).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Sanitize path for metrics labels (collapse numeric ids).
fn sanitize_path(path: &str) -> String {
    regex_lite::Regex::new(r"/[0-9]+(/|$)")
        .unwrap()
        .replace_all(path, "/:id$1")
        .to_string()
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
    record_http_request(&method, &path, status, start.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/api/conversion-requests/42/status"),
            "/api/conversion-requests/:id/status"
        );
        assert_eq!(
            sanitize_path("/api/conversion-requests/42"),
            "/api/conversion-requests/:id"
        );
        assert_eq!(
            sanitize_path("/api/conversion-requests"),
            "/api/conversion-requests"
        );
    }
}
