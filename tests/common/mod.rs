//! Shared fixtures: an in-memory dataset store and a scripted embedder.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

use embedsmith::config::{AppConfig, ChunkSettings, ChunkStrategy, EmbedSettings};
use embedsmith::embedder::{EmbedError, Embedder, EmbeddingRecord};
use embedsmith::hub::{DatasetRecord, DatasetStore, HubError};

/// In-memory stand-in for the hosted store.
///
/// Published datasets become readable as their own `train` split, the same
/// way a hub publish makes the new version loadable.
#[derive(Default)]
pub struct MemoryStore {
    splits: Mutex<HashMap<(String, String), Vec<DatasetRecord>>>,
    published: Mutex<HashMap<String, Vec<(Vec<DatasetRecord>, bool)>>>,
}

impl MemoryStore {
    pub fn seed_split(&self, name: &str, split: &str, rows: Vec<DatasetRecord>) {
        self.splits
            .lock()
            .unwrap()
            .insert((name.to_string(), split.to_string()), rows);
    }

    pub fn seed_texts(&self, name: &str, split: &str, field: &str, texts: &[&str]) {
        let rows = texts
            .iter()
            .map(|text| DatasetRecord::from_text(field, *text))
            .collect();
        self.seed_split(name, split, rows);
    }

    /// All published versions of a dataset, oldest first.
    pub fn versions(&self, name: &str) -> Vec<(Vec<DatasetRecord>, bool)> {
        self.published
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Rows of the latest published version, if any.
    pub fn latest(&self, name: &str) -> Option<Vec<DatasetRecord>> {
        self.versions(name).last().map(|(rows, _)| rows.clone())
    }
}

#[async_trait]
impl DatasetStore for MemoryStore {
    async fn load_split(&self, name: &str, split: &str) -> Result<Vec<DatasetRecord>, HubError> {
        Ok(self
            .splits
            .lock()
            .unwrap()
            .get(&(name.to_string(), split.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn publish(
        &self,
        name: &str,
        records: &[DatasetRecord],
        private: bool,
    ) -> Result<(), HubError> {
        self.published
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .push((records.to_vec(), private));
        self.splits.lock().unwrap().insert(
            (name.to_string(), "train".to_string()),
            records.to_vec(),
        );
        Ok(())
    }
}

/// Scripted [`Embedder`] that tracks probe and call activity.
pub struct MockEmbedder {
    /// Probe attempts consumed before `await_ready` succeeds.
    pub ready_after: u32,
    /// Text whose embedding call fails with a 500.
    pub fail_on: Option<String>,
    /// Simulated per-call latency.
    pub delay: Duration,
    probes: AtomicU32,
    active: AtomicUsize,
    max_active: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self {
            ready_after: 0,
            fail_on: None,
            delay: Duration::ZERO,
            probes: AtomicU32::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockEmbedder {
    pub fn failing_on(text: &str) -> Self {
        Self {
            fail_on: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Embedder whose endpoint needs `attempts` probes before it is up.
    pub fn cold(attempts: u32) -> Self {
        Self {
            ready_after: attempts,
            ..Self::default()
        }
    }

    /// Texts embedded so far, in completion order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of concurrently in-flight calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn await_ready(&self) -> Result<(), EmbedError> {
        let probes = self.probes.fetch_add(1, Ordering::SeqCst) + 1;
        if probes > self.ready_after {
            Ok(())
        } else {
            Err(EmbedError::EndpointUnavailable { attempts: probes })
        }
    }

    async fn embed_one(&self, text: &str) -> Result<EmbeddingRecord, EmbedError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(text.to_string());

        if self.fail_on.as_deref() == Some(text) {
            return Err(EmbedError::RequestFailed {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "scripted failure".to_string(),
            });
        }
        // deterministic vector derived from the text
        Ok(EmbeddingRecord {
            vector: vec![text.chars().count() as f32, 1.0],
            text: text.to_string(),
        })
    }
}

/// Configuration pointing at nothing real; the store and embedder are
/// substituted in tests, so the URLs are never dialed.
pub fn test_config(strategy: ChunkStrategy, chunk_len: usize, concurrency: usize) -> AppConfig {
    AppConfig {
        hub_api_base: Url::parse("http://hub.invalid").unwrap(),
        hub_token: "test-token".to_string(),
        embedder_url: Url::parse("http://embed.invalid").unwrap(),
        source_text_field: "text".to_string(),
        source_splits: vec!["train".to_string()],
        chunk: ChunkSettings {
            strategy,
            separator: ".".to_string(),
            chunk_len,
            output_dataset: "org/chunked".to_string(),
            private: true,
        },
        embed: EmbedSettings {
            concurrency,
            output_dataset: "org/embedded".to_string(),
            private: true,
            probe_attempts: 3,
            probe_interval: Duration::from_millis(5),
            scratch_dir: None,
        },
        seen_capacity: NonZeroUsize::new(64).unwrap(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
    }
}

/// Same configuration with the scratch directory pinned, so tests can
/// assert the file is gone after a run.
pub fn test_config_with_scratch(
    strategy: ChunkStrategy,
    chunk_len: usize,
    concurrency: usize,
    scratch_dir: PathBuf,
) -> AppConfig {
    let mut config = test_config(strategy, chunk_len, concurrency);
    config.embed.scratch_dir = Some(scratch_dir);
    config
}
