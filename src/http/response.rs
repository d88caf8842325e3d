//! Response handling and transformation.
//!
//! # Responsibilities
//! - Turn the pipeline's final accumulator into the outgoing response
//! - Map pipeline and resource failures to HTTP status codes
//! - Strip hop-by-hop headers from proxied messages
//!
//! # Design Decisions
//! - Only content type is managed centrally; other headers are whatever the
//!   resources left in the accumulator
//! - A body nobody labelled is sniffed the way a browser would guess it
//! - A request no resource served is a 404, not an empty 200

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::pipeline::{PipelineError, ResponseAccumulator};
use crate::resource::ResourceError;

/// Connection-scoped headers that must not be forwarded (RFC 9110 §7.6.1).
const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
];

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
    headers.remove(header::UPGRADE);
}

impl IntoResponse for ResponseAccumulator {
    fn into_response(self) -> Response {
        if self.body.is_none() && self.status.is_none() {
            return StatusCode::NOT_FOUND.into_response();
        }
        let body = self.body.unwrap_or_default();

        let fallback = (!body.is_empty()).then(|| fallback_content_type(&body));
        let mut response = Response::new(Body::from(body));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;

        let headers = response.headers_mut();
        match self
            .content_type
            .as_deref()
            .and_then(|ct| HeaderValue::from_str(ct).ok())
        {
            Some(value) => {
                headers.insert(header::CONTENT_TYPE, value);
            }
            None => {
                if let (Some(fallback), false) =
                    (fallback, headers.contains_key(header::CONTENT_TYPE))
                {
                    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(fallback));
                }
            }
        }
        response
    }
}

/// Content type for a body no resource labelled.
fn fallback_content_type(body: &[u8]) -> &'static str {
    match std::str::from_utf8(body) {
        Ok(text) if text.trim_start().starts_with('<') => "text/html; charset=utf-8",
        Ok(_) => "text/plain; charset=utf-8",
        Err(_) => "application/octet-stream",
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = %status, "Request failed");
        } else {
            tracing::warn!(error = %self, status = %status, "Request rejected");
        }
        (status, status.canonical_reason().unwrap_or("error")).into_response()
    }
}

impl IntoResponse for ResourceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = %status, "Request failed");
        } else {
            tracing::warn!(error = %self, status = %status, "Request rejected");
        }
        (status, status.canonical_reason().unwrap_or("error")).into_response()
    }
}
