//! Errors raised by resource actions.

use axum::http::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// A failed resolve, serve or intercept action.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Reading from disk failed.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The outbound call to an upstream origin failed.
    #[error("upstream request to {url} failed: {source}")]
    Upstream { url: String, source: reqwest::Error },

    /// A body that should hold structured data could not be parsed.
    #[error("malformed JSON in {context}: {source}")]
    MalformedJson {
        context: String,
        source: serde_json::Error,
    },

    /// A URL could not be built or converted.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Failure reported by a user-supplied resource.
    #[error(transparent)]
    Custom(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ResourceError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ResourceError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn custom(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        ResourceError::Custom(error.into())
    }

    /// Status the connection layer answers with when this error ends a request.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ResourceError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                StatusCode::NOT_FOUND
            }
            ResourceError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ResourceError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
