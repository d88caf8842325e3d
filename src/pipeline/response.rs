//! The response accumulator folded through the serve and intercept stages.

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use bytes::Bytes;

use crate::resource::ResourceResponse;

/// Response state built up by resources, one per request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseAccumulator {
    pub body: Option<Bytes>,
    pub content_type: Option<String>,
    pub headers: HeaderMap,
    pub status: Option<StatusCode>,
}

impl ResponseAccumulator {
    /// Overlay a resource's partial response. Fields it leaves unset survive.
    pub fn merge(mut self, partial: ResourceResponse) -> Self {
        if let Some(body) = partial.body {
            self.body = Some(body);
        }
        if let Some(content_type) = partial.content_type {
            self.content_type = Some(content_type);
        }
        if let Some(headers) = partial.headers {
            self.headers = headers;
        }
        if let Some(status) = partial.status {
            self.status = Some(status);
        }
        self
    }

    /// Write the content type into the headers, as it will go on the wire.
    pub fn commit(mut self) -> Self {
        if let Some(value) = self
            .content_type
            .as_deref()
            .and_then(|ct| HeaderValue::from_str(ct).ok())
        {
            self.headers.insert(header::CONTENT_TYPE, value);
        }
        self
    }

    /// Body as text, lossily decoded. Empty when nothing was served.
    pub fn body_text(&self) -> String {
        self.body
            .as_deref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }
}
