//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, proxy prefixes and upstream URLs
//! - Validate value ranges (timeouts > 0, body limit > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::ServerConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("proxy prefix '{0}' must start with '/'")]
    InvalidProxyPrefix(String),

    #[error("proxy upstream for '{prefix}' ('{upstream}') must be an absolute http(s) URL")]
    InvalidProxyUpstream { prefix: String, upstream: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(
        &mut errors,
        "dev_server.bind_address",
        &config.dev_server.bind_address,
    );
    check_address(
        &mut errors,
        "prod_server.bind_address",
        &config.prod_server.bind_address,
    );
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    for (prefix, upstream) in &config.dev_server.proxy {
        if !prefix.starts_with('/') {
            errors.push(ValidationError::InvalidProxyPrefix(prefix.clone()));
        }
        let valid_upstream = Url::parse(upstream)
            .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
            .unwrap_or(false);
        if !valid_upstream {
            errors.push(ValidationError::InvalidProxyUpstream {
                prefix: prefix.clone(),
                upstream: upstream.clone(),
            });
        }
    }

    if config.dev_server.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero("dev_server.request_timeout_secs"));
    }
    if config.dev_server.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("dev_server.max_body_bytes"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
