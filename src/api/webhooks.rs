use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use super::error::ApiError;
use super::metrics::{record_signature_failure, record_webhook};
use crate::github::signature::{self, SIGNATURE_HEADER};
use crate::pr::{self, PullRequestEvent};
use crate::tasks::spawn_logged;
use crate::AppState;

pub const EVENT_HEADER: &str = "X-GitHub-Event";

/// POST /github-webhook
///
/// Verifies the delivery, then hands pull request work to background tasks
/// and answers immediately.
pub async fn github_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    if state.config.check_signature {
        let provided = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok());

        if !signature::verify(&body, provided, state.config.webhook_secret.as_deref()) {
            tracing::warn!("GitHub webhook signature verification failed");
            record_signature_failure();
            return Err(ApiError::unauthorized("Invalid signature"));
        }
        tracing::debug!("GitHub webhook signature verified");
    }

    let payload: Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!("Failed to parse GitHub webhook payload: {}", e);
        ApiError::bad_request("Invalid JSON payload")
    })?;

    let event = headers
        .get(EVENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    tracing::info!(event = event, "Received GitHub webhook event: {}", event);
    record_webhook(event);

    match event {
        "pull_request" => handle_pull_request(&state, payload)?,
        _ => tracing::info!("Ignoring unhandled event type: {}", event),
    }

    Ok(Json(json!({ "message": "Webhook received" })))
}

fn handle_pull_request(state: &Arc<AppState>, payload: Value) -> Result<(), ApiError> {
    let event: PullRequestEvent = serde_json::from_value(payload).map_err(|e| {
        tracing::error!("Malformed pull_request payload: {}", e);
        ApiError::bad_request("Malformed pull_request payload")
    })?;

    tracing::info!(
        action = %event.action,
        pr_number = event.number(),
        "Pull request event for {}/{}",
        event.owner(),
        event.repo()
    );

    let state = state.clone();
    spawn_logged("pr_delivery", async move {
        pr::process_delivery(&state, &event).await
    });

    Ok(())
}

/// GET /
pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "message": "GitHub App API is running"
        })),
    )
}
