//! Embed stage: chunked dataset in, embedded dataset out.
//!
//! Embedding calls fan out under a semaphore bound, and every completed
//! call sends its result to a single writer task that owns the scratch
//! file. Only the writer touches the file, so each appended line is whole
//! no matter how tasks interleave. The scratch file is a `NamedTempFile`:
//! it is removed on drop, which covers every exit path, success or not.

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tracing::info;

use crate::config::AppConfig;
use crate::embedder::{Embedder, EmbeddingRecord};
use crate::error::PipelineError;
use crate::hub::{DatasetRecord, DatasetStore};

/// Embeds every non-blank chunk of the `train` split of `chunked` and
/// publishes the results under the configured embedded-dataset name.
/// Returns the published name.
///
/// Row order of the published dataset is task completion order, not input
/// order. Any single failed embedding call fails the whole run after all
/// in-flight tasks settle; nothing is published on failure.
pub async fn embed_dataset(
    store: &dyn DatasetStore,
    embedder: Arc<dyn Embedder>,
    config: &AppConfig,
    chunked: &str,
) -> Result<String, PipelineError> {
    info!(dataset = chunked, "update detected, embedding started");

    embedder.await_ready().await?;

    let rows = store.load_split(chunked, "train").await?;
    let field = config.source_text_field.as_str();
    let texts: Vec<String> = rows
        .iter()
        .filter_map(|row| row.text(field))
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
        .collect();
    info!(chunks = texts.len(), "embedding chunks");

    let scratch = match &config.embed.scratch_dir {
        Some(dir) => tempfile::Builder::new().suffix(".jsonl").tempfile_in(dir)?,
        None => tempfile::Builder::new().suffix(".jsonl").tempfile()?,
    };

    let (tx, rx) = flume::unbounded::<EmbeddingRecord>();

    // Single writer owning the scratch file; embedding tasks only send.
    // The loop ends once every sender is dropped and the channel drains.
    let writer = tokio::task::spawn_blocking(
        move || -> Result<tempfile::NamedTempFile, PipelineError> {
            let mut scratch = scratch;
            while let Ok(record) = rx.recv() {
                let line = serde_json::to_string(&record)?;
                writeln!(scratch, "{line}")?;
            }
            scratch.flush()?;
            Ok(scratch)
        },
    );

    let started = Instant::now();
    let semaphore = Arc::new(Semaphore::new(config.embed.concurrency));
    let mut tasks = Vec::with_capacity(texts.len());
    for text in texts {
        let semaphore = Arc::clone(&semaphore);
        let embedder = Arc::clone(&embedder);
        let tx = tx.clone();
        tasks.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
            let record = embedder.embed_one(&text).await?;
            tx.send(record).map_err(|_| PipelineError::WriterClosed)?;
            Ok::<(), PipelineError>(())
        }));
    }
    drop(tx);

    // let every in-flight task settle before deciding the run's fate
    let mut failure: Option<PipelineError> = None;
    for outcome in join_all(tasks).await {
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(join) => Err(PipelineError::Join(join)),
        };
        if let Err(err) = outcome {
            failure.get_or_insert(err);
        }
    }

    let scratch = writer.await??;
    if let Some(err) = failure {
        // scratch drops here, removing the file; nothing was published
        return Err(err);
    }
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "embedding complete"
    );

    let content = tokio::fs::read_to_string(scratch.path()).await?;
    let mut records = Vec::with_capacity(content.lines().count());
    for line in content.lines().filter(|line| !line.is_empty()) {
        let record: EmbeddingRecord = serde_json::from_str(line)?;
        let mut fields = serde_json::Map::new();
        fields.insert("vector".to_string(), serde_json::to_value(record.vector)?);
        fields.insert("text".to_string(), serde_json::Value::String(record.text));
        records.push(DatasetRecord { fields });
    }

    store
        .publish(&config.embed.output_dataset, &records, config.embed.private)
        .await?;

    info!(
        rows = records.len(),
        dataset = %config.embed.output_dataset,
        "embedded dataset published"
    );
    Ok(config.embed.output_dataset.clone())
}
