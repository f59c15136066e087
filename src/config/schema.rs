//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the checker.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::health::Endpoints;

/// Root configuration for the connectivity checker.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CheckerConfig {
    /// Deployment profile used to pick default base URLs.
    pub environment: Environment,

    /// Where the diagnostic endpoints live.
    pub endpoints: EndpointConfig,

    /// Probe behaviour (timeouts, cross-origin emulation).
    pub probes: ProbeConfig,

    /// Re-run schedule for `watch` mode.
    pub watch: WatchConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl CheckerConfig {
    /// Resolve base addresses and diagnostic paths into concrete endpoints.
    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            request_url: join_url(&self.endpoints.api_base_url(self.environment), &self.endpoints.request_path),
            stream_url: join_url(&self.endpoints.ws_base_url(self.environment), &self.endpoints.stream_path),
        }
    }
}

/// Deployment profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Backend running on the developer machine.
    #[default]
    Local,
    /// Hosted backend.
    Deployed,
}

impl Environment {
    /// Default request/response base URL for this profile.
    pub fn default_api_base_url(&self) -> &'static str {
        match self {
            Environment::Local => "http://localhost:8080",
            Environment::Deployed => "https://api.wildcat-radio.live",
        }
    }

    /// Default WebSocket base URL for this profile.
    pub fn default_ws_base_url(&self) -> &'static str {
        match self {
            Environment::Local => "ws://localhost:8080",
            Environment::Deployed => "wss://api.wildcat-radio.live",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Local => write!(f, "local"),
            Environment::Deployed => write!(f, "deployed"),
        }
    }
}

/// Endpoint configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Base URL for request/response traffic. Falls back to the environment default.
    pub api_base_url: Option<String>,

    /// Base URL for WebSocket traffic. Falls back to the environment default.
    pub ws_base_url: Option<String>,

    /// Diagnostic path appended to the API base URL.
    pub request_path: String,

    /// Diagnostic path appended to the WebSocket base URL.
    pub stream_path: String,
}

impl EndpointConfig {
    pub fn api_base_url(&self, environment: Environment) -> String {
        self.api_base_url
            .clone()
            .unwrap_or_else(|| environment.default_api_base_url().to_string())
    }

    pub fn ws_base_url(&self, environment: Environment) -> String {
        self.ws_base_url
            .clone()
            .unwrap_or_else(|| environment.default_ws_base_url().to_string())
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            ws_base_url: None,
            request_path: "/api/stream/cors-test".to_string(),
            stream_path: "/ws/live".to_string(),
        }
    }
}

/// Probe configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// WebSocket handshake window in milliseconds.
    pub stream_timeout_ms: u64,

    /// Optional request/response deadline in milliseconds. Unset means the
    /// HTTP client's own behaviour applies.
    pub request_timeout_ms: Option<u64>,

    /// Origin to present on the request probe. When set, the response must
    /// allow it via `Access-Control-Allow-Origin`.
    pub origin: Option<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            stream_timeout_ms: 10_000,
            request_timeout_ms: None,
            origin: None,
        }
    }
}

/// Watch mode configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Seconds between scheduled runs.
    pub interval_secs: u64,

    /// Re-run when the config file changes.
    pub reload_on_change: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            reload_on_change: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9091".to_string(),
        }
    }
}

fn join_url(base: &str, path: &str) -> String {
    if path.is_empty() {
        return base.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
