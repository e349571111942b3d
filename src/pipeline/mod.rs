//! The two background pipeline stages and their orchestration.

pub mod chunk;
pub mod embed;

use std::sync::Arc;

use tracing::error;

use crate::app::AppState;

pub use chunk::chunk_dataset;
pub use embed::embed_dataset;

/// Runs one full pipeline pass for an updated source dataset.
///
/// The embed stage starts only after the chunk stage's publish has
/// returned, and consumes exactly the dataset name that publish produced.
/// Failures abort the pass and are logged; the webhook caller already got
/// its response and is never told.
pub async fn run_pipeline(state: Arc<AppState>, source: String) {
    let chunked = match chunk_dataset(state.store.as_ref(), &state.config, &source).await {
        Ok(name) => name,
        Err(err) => {
            error!(dataset = %source, error = %err, "chunk job failed");
            return;
        }
    };

    if let Err(err) = embed_dataset(
        state.store.as_ref(),
        state.embedder.clone(),
        &state.config,
        &chunked,
    )
    .await
    {
        error!(dataset = %chunked, error = %err, "embed job failed");
    }
}
