use std::path::Path;
use std::time::Duration;

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use threadline_content::AttachmentPolicy;
use threadline_store::{MutationOptions, DEFAULT_BASE_URL};
use threadline_sync::{SyncOptions, DEFAULT_EVENTS_PATH};
use threadline_types::DEFAULT_THREAD_TITLE;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub sync: SyncConfig,
    pub attachments: AttachmentPolicy,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Unset: requests are bounded only by the transport
    pub request_timeout_ms: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub enabled: bool,
    pub reconnect_backoff_ms: u64,
    pub max_reconnect_attempts: u32,
    pub title_fresh_window_ms: u64,
    /// `{id}` is replaced with the thread id
    pub events_path: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reconnect_backoff_ms: 3000,
            max_reconnect_attempts: 10,
            title_fresh_window_ms: 3000,
            events_path: DEFAULT_EVENTS_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub default_thread_title: String,
    pub timestamp_refresh_secs: u64,
    pub process_on_send: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_thread_title: DEFAULT_THREAD_TITLE.to_string(),
            timestamp_refresh_secs: 60,
            process_on_send: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables prefixed `THREADLINE_`, sections split by `__`
    ///    (e.g. `THREADLINE_API__BASE_URL`)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let config = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("THREADLINE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        ConfigLoader::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.api.request_timeout_ms.map(Duration::from_millis)
    }

    pub fn timestamp_refresh(&self) -> Duration {
        Duration::from_secs(self.session.timestamp_refresh_secs.max(1))
    }
}

impl From<&SyncConfig> for SyncOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            reconnect_backoff: Duration::from_millis(config.reconnect_backoff_ms),
            max_reconnect_attempts: config.max_reconnect_attempts,
            title_fresh_window: Duration::from_millis(config.title_fresh_window_ms),
            untitled_placeholder: DEFAULT_THREAD_TITLE.to_string(),
        }
    }
}

impl From<&SessionConfig> for MutationOptions {
    fn from(config: &SessionConfig) -> Self {
        Self {
            default_thread_title: config.default_thread_title.clone(),
            process_on_send: config.process_on_send,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_structure() {
        let toml = r#"
            [api]
            base_url = "https://chat.example.com"
            request_timeout_ms = 15000

            [sync]
            reconnect_backoff_ms = 500
            max_reconnect_attempts = 4
            events_path = "/ws/threads/{id}"

            [attachments]
            max_size_bytes = 1048576
            allowed_mime_types = ["text/plain", "application/pdf"]

            [session]
            default_thread_title = "Untitled"
            process_on_send = false

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config: ClientConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.api.base_url, "https://chat.example.com");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.sync.max_reconnect_attempts, 4);
        assert_eq!(config.sync.title_fresh_window_ms, 3000);
        assert_eq!(config.attachments.allowed_mime_types.len(), 2);
        assert_eq!(config.session.timestamp_refresh_secs, 60);
        assert!(!config.session.process_on_send);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.request_timeout(), None);
        assert!(config.sync.enabled);
        assert_eq!(config.attachments.max_size_bytes, 50 * 1024 * 1024);
        assert_eq!(config.session.default_thread_title, "New Chat");

        let options = SyncOptions::from(&config.sync);
        assert_eq!(options.reconnect_backoff, Duration::from_secs(3));
        assert_eq!(options.max_reconnect_attempts, 10);
    }
}
