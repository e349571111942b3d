//! Job-level error type shared by both pipeline stages.

use thiserror::Error;

use crate::embedder::EmbedError;
use crate::hub::HubError;

/// Failure of a chunk or embed job.
///
/// A job that returns this has published nothing: both stages publish as
/// their final step, so any error aborts before the store sees a write.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Hub(#[from] HubError),

    #[error(transparent)]
    Embed(#[from] EmbedError),

    /// A source record lacks the configured text field.
    #[error("record in '{dataset}' is missing text field '{field}'")]
    MissingField { dataset: String, field: String },

    #[error("scratch file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scratch record serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// An embedding task or the scratch writer stopped without reporting.
    #[error("pipeline task aborted: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The scratch writer went away while results were still arriving.
    #[error("scratch writer closed before all results were recorded")]
    WriterClosed,
}
