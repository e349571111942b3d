//! Chunk stage: source dataset in, chunked dataset out.

use tracing::info;

use crate::chunker::Chunker;
use crate::config::AppConfig;
use crate::error::PipelineError;
use crate::hub::{DatasetRecord, DatasetStore};

/// Loads the configured splits of `source`, splits each record's text
/// field, and publishes one row per non-empty chunk under the configured
/// chunked-dataset name. Returns the published name.
///
/// Row order follows source record order; within one record, split order.
/// Publishing is the final step, so an error anywhere leaves the previous
/// published version untouched.
pub async fn chunk_dataset(
    store: &dyn DatasetStore,
    config: &AppConfig,
    source: &str,
) -> Result<String, PipelineError> {
    info!(dataset = source, "update detected, chunking started");

    let mut records = Vec::new();
    for split in &config.source_splits {
        records.extend(store.load_split(source, split).await?);
    }

    let chunker = Chunker::new(&config.chunk);
    let field = config.source_text_field.as_str();

    let mut chunks = Vec::new();
    for record in &records {
        let text = record.text(field).ok_or_else(|| PipelineError::MissingField {
            dataset: source.to_string(),
            field: field.to_string(),
        })?;
        for piece in chunker.split(text) {
            if !piece.is_empty() {
                chunks.push(DatasetRecord::from_text(field, piece));
            }
        }
    }

    store
        .publish(&config.chunk.output_dataset, &chunks, config.chunk.private)
        .await?;

    info!(
        source_rows = records.len(),
        chunks = chunks.len(),
        dataset = %config.chunk.output_dataset,
        "chunked dataset published"
    );
    Ok(config.chunk.output_dataset.clone())
}
