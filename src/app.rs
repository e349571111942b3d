//! Shared service state.

use std::sync::Arc;

use reqwest::Client;

use crate::config::AppConfig;
use crate::embedder::{Embedder, EmbeddingClient};
use crate::hub::{DatasetStore, HubClient};
use crate::trigger::UpdateGuard;

/// Everything the webhook handler and the background pipelines share.
pub struct AppState {
    pub config: AppConfig,
    pub guard: UpdateGuard,
    pub store: Arc<dyn DatasetStore>,
    pub embedder: Arc<dyn Embedder>,
}

impl AppState {
    /// Wires production clients from configuration; one HTTP client backs
    /// both the hub and the inference endpoint.
    pub fn from_config(config: AppConfig) -> Self {
        let http = Client::new();
        let store: Arc<dyn DatasetStore> = Arc::new(HubClient::new(
            http.clone(),
            config.hub_api_base.clone(),
            config.hub_token.clone(),
        ));
        let embedder: Arc<dyn Embedder> = Arc::new(EmbeddingClient::new(
            http,
            config.embedder_url.clone(),
            config.hub_token.clone(),
            config.embed.probe_attempts,
            config.embed.probe_interval,
        ));
        let guard = UpdateGuard::new(config.seen_capacity);
        Self {
            config,
            guard,
            store,
            embedder,
        }
    }
}
