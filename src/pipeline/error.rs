//! Pipeline failure type.

use axum::http::StatusCode;
use thiserror::Error;

use crate::resource::{Capability, ResourceError};

/// Why a request could not be carried through the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A resource action failed; the remaining folds for the request were skipped.
    #[error("{stage} failed in resource '{resource}': {source}")]
    Resource {
        stage: Capability,
        resource: String,
        source: ResourceError,
    },

    /// The inbound body was larger than the configured limit.
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// The inbound request could not be turned into a request descriptor.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The task running the pipeline for this request panicked or was cancelled.
    #[error("pipeline task aborted: {0}")]
    Aborted(String),
}

impl PipelineError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::Resource { source, .. } => source.status_code(),
            PipelineError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            PipelineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            PipelineError::Aborted(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
