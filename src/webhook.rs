//! Inbound notification endpoint.
//!
//! The hub posts a [`WebhookPayload`] whenever repository content changes.
//! The handler answers immediately with `{"processed": bool}`; admitted
//! updates spawn one background task running both pipeline stages. The
//! caller learns only whether a run was started, never how it went —
//! pipeline failures surface in the logs.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app::AppState;
use crate::pipeline::run_pipeline;

/// Event half of a hub notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventInfo {
    pub action: String,
    pub scope: String,
}

/// Repository half of a hub notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(rename = "headSha")]
    pub head_sha: String,
}

/// Body of one content-update notification. Unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub event: EventInfo,
    pub repo: RepoInfo,
}

/// Answer to every notification, returned before any pipeline work runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub processed: bool,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    service: &'static str,
    version: &'static str,
}

/// Builds the service router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .route("/status", get(status))
        .with_state(state)
}

/// Admits or rejects one notification and schedules the pipeline pass.
pub async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<WebhookPayload>,
) -> Json<WebhookResponse> {
    if !state.guard.should_process(&payload) {
        info!(
            action = %payload.event.action,
            sha = %payload.repo.head_sha,
            "notification ignored"
        );
        return Json(WebhookResponse { processed: false });
    }

    let source = payload.repo.name.clone();
    info!(dataset = %source, sha = %payload.repo.head_sha, "pipeline run scheduled");
    tokio::spawn(run_pipeline(state.clone(), source));

    Json(WebhookResponse { processed: true })
}

async fn status(State(_state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}
