//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) and echo it on the response
//! - Buffer the body within the configured limit
//! - Turn the axum request into a [`RequestDescriptor`] with an absolute URL

use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, Request};
use std::path::{Component, PathBuf};
use tower_http::request_id::{MakeRequestId, RequestId};
use url::Url;
use uuid::Uuid;

use crate::pipeline::{PipelineError, RequestDescriptor};

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Request ID attached by the request-id layer, or "unknown".
pub fn request_id<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Percent-decoded URL path relative to a root directory.
///
/// `None` when the decoded path would climb out of the root.
pub fn relative_path(url_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(url_path).ok()?;
    let relative = PathBuf::from(decoded.trim_start_matches('/'));
    relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        .then_some(relative)
}

/// Build a request descriptor, reading at most `max_body_bytes` of body.
///
/// The URL authority comes from the `Host` header, falling back to
/// `fallback_authority` (the listener address).
pub async fn into_descriptor(
    request: Request<Body>,
    fallback_authority: &str,
    max_body_bytes: usize,
) -> Result<RequestDescriptor, PipelineError> {
    let (parts, body) = request.into_parts();

    let authority = parts
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| parts.uri.authority().map(|a| a.as_str()))
        .unwrap_or(fallback_authority);
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let url = Url::parse(&format!("http://{authority}{path_and_query}"))
        .map_err(|e| PipelineError::InvalidRequest(format!("{authority}{path_and_query}: {e}")))?;

    let body = axum::body::to_bytes(body, max_body_bytes)
        .await
        .map_err(|_| PipelineError::BodyTooLarge {
            limit: max_body_bytes,
        })?;

    Ok(RequestDescriptor::new(parts.method, url)
        .with_headers(parts.headers)
        .with_body(body))
}
