//! Client for the remote inference endpoint.
//!
//! The endpoint converts one text into one vector per `POST`, and may take
//! a while to scale from zero, so [`Embedder::await_ready`] polls it with
//! authenticated `GET`s before any embedding work starts. Individual
//! embedding calls are never retried: a non-success response fails the
//! whole run with the response body preserved for diagnosis.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

/// Errors raised by the inference endpoint client.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// The readiness probe exhausted its attempt budget.
    #[error("inference endpoint still unavailable after {attempts} probes")]
    EndpointUnavailable { attempts: u32 },

    /// The endpoint rejected an embedding request. Not retried.
    #[error("embedding request failed with {status}: {body}")]
    RequestFailed { status: StatusCode, body: String },

    #[error("embedding call failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered success but the batch held no vector.
    #[error("inference endpoint returned an empty batch")]
    EmptyBatch,
}

/// One embedded chunk: the vector and the text it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub vector: Vec<f32>,
    pub text: String,
}

/// Seam between the embed pipeline and the remote endpoint.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Blocks until the endpoint is reachable and healthy, or fails once
    /// the probe budget is spent.
    async fn await_ready(&self) -> Result<(), EmbedError>;

    /// Embeds one text. One remote call, no retry.
    async fn embed_one(&self, text: &str) -> Result<EmbeddingRecord, EmbedError>;
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a str,
    truncate: bool,
}

/// HTTP implementation of [`Embedder`] with bearer authentication.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    http: Client,
    endpoint: Url,
    token: String,
    probe_attempts: u32,
    probe_interval: Duration,
}

impl EmbeddingClient {
    pub fn new(
        http: Client,
        endpoint: Url,
        token: impl Into<String>,
        probe_attempts: u32,
        probe_interval: Duration,
    ) -> Self {
        Self {
            http,
            endpoint,
            token: token.into(),
            probe_attempts,
            probe_interval,
        }
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    async fn await_ready(&self) -> Result<(), EmbedError> {
        info!(endpoint = %self.endpoint, "waking up inference endpoint");
        for attempt in 1..=self.probe_attempts {
            match self
                .http
                .get(self.endpoint.clone())
                .bearer_auth(&self.token)
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => {
                    info!(attempt, "inference endpoint is up");
                    return Ok(());
                }
                Ok(response) => {
                    debug!(attempt, status = %response.status(), "endpoint not ready");
                }
                // a cold endpoint may refuse connections before it serves
                // anything; that counts as a failed attempt too
                Err(err) => {
                    debug!(attempt, error = %err, "endpoint unreachable");
                }
            }
            tokio::time::sleep(self.probe_interval).await;
        }
        Err(EmbedError::EndpointUnavailable {
            attempts: self.probe_attempts,
        })
    }

    async fn embed_one(&self, text: &str) -> Result<EmbeddingRecord, EmbedError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .json(&EmbedRequest {
                inputs: text,
                truncate: true,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbedError::RequestFailed {
                status,
                body: response.text().await.unwrap_or_default(),
            });
        }

        // the endpoint embeds a batch and answers with one vector per input
        let mut vectors: Vec<Vec<f32>> = response.json().await?;
        if vectors.is_empty() {
            return Err(EmbedError::EmptyBatch);
        }
        Ok(EmbeddingRecord {
            vector: vectors.swap_remove(0),
            text: text.to_string(),
        })
    }
}
