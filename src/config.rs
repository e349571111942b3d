//! Environment-driven configuration.
//!
//! All settings are read once at startup via [`AppConfig::from_env`] and
//! validated there; anything malformed (an unknown chunk strategy, a
//! non-numeric bound, a missing required variable) is a [`ConfigError`] and
//! aborts startup. Nothing downstream re-validates configuration.

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Errors raised while loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is absent.
    #[error("missing required environment variable {key}")]
    Missing { key: &'static str },

    /// A variable is present but could not be parsed.
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },

    /// The chunk strategy name is not one of the supported set.
    #[error("unknown chunk strategy '{name}' (expected recursive, sequence, or constant)")]
    UnknownStrategy { name: String },
}

/// Closed set of supported splitting strategies.
///
/// Parsed from `CHUNK_STRATEGY` at startup; an unrecognised name is rejected
/// there rather than surfacing as a missing operation at first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    /// Split at separator boundaries, recursively subdividing oversized
    /// segments toward the target length.
    Recursive,
    /// Split at every literal occurrence of the separator.
    Sequence,
    /// Split into fixed-length character windows.
    Constant,
}

impl ChunkStrategy {
    fn parse(name: &str) -> Result<Self, ConfigError> {
        match name {
            "recursive" => Ok(Self::Recursive),
            "sequence" => Ok(Self::Sequence),
            "constant" => Ok(Self::Constant),
            other => Err(ConfigError::UnknownStrategy {
                name: other.to_string(),
            }),
        }
    }
}

/// Settings for the chunking stage.
#[derive(Debug, Clone)]
pub struct ChunkSettings {
    pub strategy: ChunkStrategy,
    pub separator: String,
    pub chunk_len: usize,
    /// Name the chunked dataset is published under.
    pub output_dataset: String,
    /// Visibility of the published chunked dataset.
    pub private: bool,
}

/// Settings for the embedding stage.
#[derive(Debug, Clone)]
pub struct EmbedSettings {
    /// Upper bound on in-flight embedding requests.
    pub concurrency: usize,
    /// Name the embedded dataset is published under.
    pub output_dataset: String,
    /// Visibility of the published embedded dataset.
    pub private: bool,
    /// Readiness probe attempt budget.
    pub probe_attempts: u32,
    /// Sleep between readiness probes.
    pub probe_interval: Duration,
    /// Directory for the per-run scratch file; system temp when unset.
    pub scratch_dir: Option<PathBuf>,
}

/// Complete service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the hosted dataset store's API.
    pub hub_api_base: Url,
    /// Bearer credential for both the hub and the inference endpoint.
    pub hub_token: String,
    /// URL of the remote inference endpoint.
    pub embedder_url: Url,
    /// Name of the text field read from source records.
    pub source_text_field: String,
    /// Splits of the source dataset to process, in order.
    pub source_splits: Vec<String>,
    pub chunk: ChunkSettings,
    pub embed: EmbedSettings,
    /// Capacity of the recently-seen update identifier cache.
    pub seen_capacity: NonZeroUsize,
    /// Socket the HTTP service binds to.
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    /// Loads and validates configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let source_splits: Vec<String> = require("SOURCE_SPLITS")?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if source_splits.is_empty() {
            return Err(ConfigError::Invalid {
                key: "SOURCE_SPLITS",
                message: "no splits listed".to_string(),
            });
        }

        let chunk_len = parse_or("CHUNK_LEN", 512usize)?;
        if chunk_len == 0 {
            return Err(ConfigError::Invalid {
                key: "CHUNK_LEN",
                message: "chunk length must be at least 1".to_string(),
            });
        }
        let concurrency = parse_or("EMBED_CONCURRENCY", 8usize)?;
        if concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "EMBED_CONCURRENCY",
                message: "concurrency bound must be at least 1".to_string(),
            });
        }

        Ok(Self {
            hub_api_base: parse_url("HUB_API_BASE")?,
            hub_token: require("HUB_TOKEN")?,
            embedder_url: parse_url("EMBEDDER_URL")?,
            source_text_field: require("SOURCE_TEXT_FIELD")?,
            source_splits,
            chunk: ChunkSettings {
                strategy: ChunkStrategy::parse(&require("CHUNK_STRATEGY")?)?,
                separator: optional("CHUNK_SEPARATOR").unwrap_or_else(|| ".".to_string()),
                chunk_len,
                output_dataset: require("CHUNKED_DATASET")?,
                private: parse_or("CHUNKED_PRIVATE", true)?,
            },
            embed: EmbedSettings {
                concurrency,
                output_dataset: require("EMBEDDED_DATASET")?,
                private: parse_or("EMBEDDED_PRIVATE", true)?,
                probe_attempts: parse_or("PROBE_ATTEMPTS", 40u32)?,
                probe_interval: Duration::from_secs(parse_or("PROBE_INTERVAL_SECS", 2u64)?),
                scratch_dir: optional("SCRATCH_DIR").map(PathBuf::from),
            },
            seen_capacity: NonZeroUsize::new(parse_or("SEEN_CAPACITY", 1024usize)?).ok_or(
                ConfigError::Invalid {
                    key: "SEEN_CAPACITY",
                    message: "capacity must be at least 1".to_string(),
                },
            )?,
            bind_addr: parse_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 7860)))?,
        })
    }
}

fn optional(key: &'static str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn require(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::Missing { key })
}

fn parse_or<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match optional(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|err: T::Err| ConfigError::Invalid {
            key,
            message: err.to_string(),
        }),
    }
}

fn parse_url(key: &'static str) -> Result<Url, ConfigError> {
    Url::parse(&require(key)?).map_err(|err| ConfigError::Invalid {
        key,
        message: err.to_string(),
    })
}
