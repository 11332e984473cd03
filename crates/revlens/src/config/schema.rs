use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::AnalysisParams;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonitorConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub channels: ChannelConfig,
    #[serde(default)]
    pub defaults: AnalysisParams,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MonitorConfig {
    /// Builds a default configuration pointing at `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self {
            server: ServerConfig::new(base_url),
            channels: ChannelConfig::default(),
            defaults: AnalysisParams::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    pub base_url: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub paths: EndpointPaths,
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl ServerConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            paths: EndpointPaths::default(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Endpoint path templates. `{id}` is replaced by the job id and `{report}`
/// by the report identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EndpointPaths {
    #[serde(default = "default_submit_urls")]
    pub submit_urls: String,
    #[serde(default = "default_submit_upload")]
    pub submit_upload: String,
    #[serde(default = "default_job")]
    pub job: String,
    /// WebSocket path of the push channel, resolved against `baseUrl`
    /// with the scheme switched to `ws`/`wss`.
    #[serde(default = "default_push")]
    pub push: String,
    #[serde(default = "default_download")]
    pub download: String,
}

fn default_submit_urls() -> String {
    "/api/analyze/urls".to_string()
}

fn default_submit_upload() -> String {
    "/api/analyze/upload".to_string()
}

fn default_job() -> String {
    "/api/jobs/{id}".to_string()
}

fn default_push() -> String {
    "/ws/{id}".to_string()
}

fn default_download() -> String {
    "/api/download/{report}".to_string()
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            submit_urls: default_submit_urls(),
            submit_upload: default_submit_upload(),
            job: default_job(),
            push: default_push(),
            download: default_download(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelConfig {
    /// How long to wait for the first push event before polling as well.
    #[serde(default = "default_guard_window_ms")]
    pub guard_window_ms: u64,
    /// Fixed interval between pull-channel status queries.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Interval of the keepalive frames sent on the push channel. The
    /// backend answers a keepalive with the final status once the job ended.
    #[serde(default = "default_keepalive_ms")]
    pub keepalive_ms: u64,
    /// Capacity of the per-job event queue.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_guard_window_ms() -> u64 {
    3000
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_keepalive_ms() -> u64 {
    10_000
}

fn default_event_buffer() -> usize {
    64
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            guard_window_ms: default_guard_window_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            keepalive_ms: default_keepalive_ms(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl ChannelConfig {
    pub fn guard_window(&self) -> Duration {
        Duration::from_millis(self.guard_window_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn keepalive(&self) -> Duration {
        Duration::from_millis(self.keepalive_ms)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}
