//! Client for the hosted dataset store.
//!
//! The store exposes named, versioned datasets over a small REST surface:
//!
//! * `GET {base}/api/datasets/{name}/rows?split={split}` — rows of one
//!   split, as `{"rows": [...]}`.
//! * `POST {base}/api/datasets/{name}?private={bool}` — publish the body
//!   (a JSON array of rows) as a new version of the dataset.
//!
//! Versioning semantics live server-side: a publish creates a new immutable
//! version that supersedes the previous one. [`DatasetStore`] is the seam
//! the pipelines depend on, so tests can substitute an in-memory store.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Errors raised while talking to the hosted store.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("hub request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The hub answered with a non-success status.
    #[error("hub returned {status} for {url}: {body}")]
    Status {
        status: StatusCode,
        url: String,
        body: String,
    },

    /// A dataset name or split produced an unbuildable request URL.
    #[error("invalid hub url: {0}")]
    InvalidUrl(String),
}

/// One row of a hosted dataset.
///
/// Rows are schemaless maps; the pipelines only ever address the configured
/// text field by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl DatasetRecord {
    /// Builds a single-field text row.
    pub fn from_text(field: &str, text: impl Into<String>) -> Self {
        let mut fields = serde_json::Map::new();
        fields.insert(field.to_string(), serde_json::Value::String(text.into()));
        Self { fields }
    }

    /// Returns the named field when it holds a string.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|value| value.as_str())
    }
}

/// Read/write access to named datasets on the hosted store.
#[async_trait]
pub trait DatasetStore: Send + Sync {
    /// Loads every row of one split, in stored order.
    async fn load_split(&self, name: &str, split: &str) -> Result<Vec<DatasetRecord>, HubError>;

    /// Publishes `records` as a new version of the named dataset.
    async fn publish(
        &self,
        name: &str,
        records: &[DatasetRecord],
        private: bool,
    ) -> Result<(), HubError>;
}

#[derive(Debug, Deserialize)]
struct RowsResponse {
    rows: Vec<DatasetRecord>,
}

/// REST implementation of [`DatasetStore`] with bearer authentication.
#[derive(Debug, Clone)]
pub struct HubClient {
    http: Client,
    base: Url,
    token: String,
}

impl HubClient {
    pub fn new(http: Client, base: Url, token: impl Into<String>) -> Self {
        Self {
            http,
            base,
            token: token.into(),
        }
    }

    fn dataset_url(&self, name: &str, tail: Option<&str>) -> Result<Url, HubError> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| HubError::InvalidUrl(self.base.to_string()))?;
            segments.pop_if_empty().extend(["api", "datasets"]);
            // dataset names may contain '/' (namespaced), each part is a segment
            segments.extend(name.split('/'));
            if let Some(tail) = tail {
                segments.push(tail);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl DatasetStore for HubClient {
    async fn load_split(&self, name: &str, split: &str) -> Result<Vec<DatasetRecord>, HubError> {
        let mut url = self.dataset_url(name, Some("rows"))?;
        url.query_pairs_mut().append_pair("split", split);

        let response = self
            .http
            .get(url.clone())
            .bearer_auth(&self.token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HubError::Status {
                status,
                url: url.to_string(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        let rows: RowsResponse = response.json().await?;
        Ok(rows.rows)
    }

    async fn publish(
        &self,
        name: &str,
        records: &[DatasetRecord],
        private: bool,
    ) -> Result<(), HubError> {
        let mut url = self.dataset_url(name, None)?;
        url.query_pairs_mut()
            .append_pair("private", if private { "true" } else { "false" });

        let response = self
            .http
            .post(url.clone())
            .bearer_auth(&self.token)
            .json(records)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HubError::Status {
                status,
                url: url.to_string(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }
}
