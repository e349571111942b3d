//! ```text
//! Hub webhook ──► webhook::handle_webhook ──► trigger::UpdateGuard
//!                          │ (admitted)
//!                          ▼
//!                pipeline::run_pipeline (background task)
//!                          │
//!        ┌─────────────────┴──────────────────┐
//!        ▼                                    ▼
//! pipeline::chunk ──► hub (publish)    pipeline::embed ──► embedder (probe + calls)
//!   chunker::Chunker                      │                  │
//!                                         └──► scratch writer ──► hub (publish)
//! ```
//!
//! The chunk stage always completes (and publishes) before the embed stage
//! starts; both run outside the webhook request path.

pub mod app;
pub mod chunker;
pub mod config;
pub mod embedder;
pub mod error;
pub mod hub;
pub mod pipeline;
pub mod trigger;
pub mod webhook;

pub use app::AppState;
pub use chunker::Chunker;
pub use config::{AppConfig, ChunkSettings, ChunkStrategy, ConfigError, EmbedSettings};
pub use embedder::{EmbedError, Embedder, EmbeddingClient, EmbeddingRecord};
pub use error::PipelineError;
pub use hub::{DatasetRecord, DatasetStore, HubClient, HubError};
pub use trigger::UpdateGuard;
pub use webhook::{WebhookPayload, WebhookResponse};
