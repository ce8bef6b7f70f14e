//! Prometheus metrics endpoint and HTTP request tracking middleware.
//!
//! Besides the per-request metrics recorded by [`metrics_middleware`], the
//! webhook handler, token exchange and PR tasks record their own counters
//! under the names defined here.

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Instant;

use crate::AppState;

// Metric names as constants for consistency
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const WEBHOOKS_RECEIVED_TOTAL: &str = "webhooks_received_total";
pub const WEBHOOK_SIGNATURE_FAILURES_TOTAL: &str = "webhook_signature_failures_total";
pub const INSTALLATION_TOKENS_ISSUED_TOTAL: &str = "installation_tokens_issued_total";
pub const PR_TASKS_TOTAL: &str = "pr_tasks_total";

/// Install the Prometheus recorder and return a handle for rendering.
///
/// Call once during startup; a second install fails.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_counter!(
        HTTP_REQUESTS_TOTAL,
        "Total number of HTTP requests received"
    );
    describe_histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "HTTP request duration in seconds"
    );
    describe_counter!(
        WEBHOOKS_RECEIVED_TOTAL,
        "Webhook deliveries accepted, by event type"
    );
    describe_counter!(
        WEBHOOK_SIGNATURE_FAILURES_TOTAL,
        "Webhook deliveries rejected for a bad signature"
    );
    describe_counter!(
        INSTALLATION_TOKENS_ISSUED_TOTAL,
        "Installation access tokens obtained from GitHub"
    );
    describe_counter!(
        PR_TASKS_TOTAL,
        "Pull request background tasks by task and outcome"
    );

    Ok(handle)
}

/// GET /metrics - Returns Prometheus-formatted metrics.
pub async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics_handle.as_ref() {
        Some(h) => (StatusCode::OK, h.render()),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Metrics not initialized".to_string(),
        ),
    }
}

/// Middleware to track HTTP request metrics.
///
/// Records:
/// - `http_requests_total` counter with method, path, and status labels
/// - `http_request_duration_seconds` histogram with method and path labels
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();

    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let method = request.method().to_string();

    let response = next.run(request).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(HTTP_REQUESTS_TOTAL, "method" => method.clone(), "path" => path.clone(), "status" => status).increment(1);
    histogram!(HTTP_REQUEST_DURATION_SECONDS, "method" => method, "path" => path).record(duration);

    response
}

/// Record an accepted webhook delivery.
pub fn record_webhook(event: &str) {
    counter!(WEBHOOKS_RECEIVED_TOTAL, "event" => event.to_string()).increment(1);
}

/// Record a delivery rejected by signature verification.
pub fn record_signature_failure() {
    counter!(WEBHOOK_SIGNATURE_FAILURES_TOTAL).increment(1);
}
