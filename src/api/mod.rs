pub mod error;
pub mod metrics;
pub mod webhooks;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(webhooks::health))
        .route("/github-webhook", post(webhooks::github_webhook))
        .route("/metrics", get(metrics::metrics_endpoint))
        .layer(middleware::from_fn(metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
