use serde::Deserialize;

use crate::utils::constants::{
    DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_PHANTOM_INTERVAL_SECS, DEFAULT_SAFETY_MARGIN_SECS,
    DEFAULT_SCAN_INTERVAL_SECS,
};

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct SettingsConfig {
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub logging: Option<LoggingConfig>
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    /// tick period, live usage is fetched on every tick
    #[serde(default = "default_scan_interval_seconds")]
    pub scan_interval_seconds: u64,
    /// minimum gap between two phantom load fetches
    /// invariant: >= scan_interval_seconds
    #[serde(default = "default_phantom_interval_seconds")]
    pub phantom_interval_seconds: u64,
    /// subtracted from the server-declared token lifetime
    #[serde(default = "default_safety_margin_seconds")]
    pub safety_margin_seconds: u64,
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            scan_interval_seconds: DEFAULT_SCAN_INTERVAL_SECS,
            phantom_interval_seconds: DEFAULT_PHANTOM_INTERVAL_SECS,
            safety_margin_seconds: DEFAULT_SAFETY_MARGIN_SECS,
            http_timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_path")]
    pub path: String,
    #[serde(default)]
    pub is_enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { path: default_metrics_path(), is_enabled: false }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: String
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new (level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "compact".to_string())
            .to_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> String {
    "8080".to_string()
}

fn default_scan_interval_seconds() -> u64 {
    DEFAULT_SCAN_INTERVAL_SECS
}

fn default_phantom_interval_seconds() -> u64 {
    DEFAULT_PHANTOM_INTERVAL_SECS
}

fn default_safety_margin_seconds() -> u64 {
    DEFAULT_SAFETY_MARGIN_SECS
}

fn default_http_timeout_ms() -> u64 {
    DEFAULT_HTTP_TIMEOUT_MS
}
