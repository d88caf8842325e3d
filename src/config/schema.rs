//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration for the development and production servers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Rendering mode of the project.
    pub mode: Mode,

    /// Directory holding the user's source files, relative to the project.
    pub workspace: PathBuf,

    /// Directory the build writes into and the production server reads from.
    pub output_dir: PathBuf,

    /// Development server settings.
    pub dev_server: DevServerConfig,

    /// Production server settings.
    pub prod_server: ProdServerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            workspace: PathBuf::from("src"),
            output_dir: PathBuf::from("public"),
            dev_server: DevServerConfig::default(),
            prod_server: ProdServerConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// How pages are laid out in the output directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// One pre-rendered HTML file per route.
    #[default]
    Ssg,
    /// Single-page application: every HTML route is served `index.html`.
    Spa,
    /// Multi-page application.
    Mpa,
}

/// Development server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DevServerConfig {
    /// Bind address (e.g., "127.0.0.1:1984").
    pub bind_address: String,

    /// Path prefix to upstream base URL, e.g. `"/api" = "http://localhost:9000"`.
    pub proxy: BTreeMap<String, String>,

    /// Request timeout (total time for the whole pipeline) in seconds.
    pub request_timeout_secs: u64,

    /// Largest request body buffered for handlers, in bytes.
    pub max_body_bytes: usize,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:1984".to_string(),
            proxy: BTreeMap::new(),
            request_timeout_secs: 30,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Production server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProdServerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,
}

impl Default for ProdServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
