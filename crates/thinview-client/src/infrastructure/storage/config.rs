//! TOML configuration for the thin client.
//!
//! The file is optional.  Its path comes from the `THINVIEW_CONFIG`
//! environment variable or the first command-line argument; when neither is
//! given, or the file does not exist, every setting takes its default:
//!
//! ```toml
//! log_level = "info"
//! diagnostic_level = 1
//!
//! [endpoint]
//! host = "127.0.0.1"
//! port = 30002
//!
//! [display]
//! width = 800
//! height = 600
//! refresh_hz = 60
//!
//! [pipeline]
//! fill_policy = "accumulate"   # or "first_response"
//! placeholder_frames = 5
//! fps_report_interval = 60
//!
//! [network]
//! write_queue_limit = 64
//!
//! [reconnect]
//! enabled = false
//! initial_ms = 500
//! max_ms = 30000
//! ```
//!
//! Every field carries `#[serde(default = "...")]`, so a partial file only
//! overrides what it names.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thinview_core::Size;
use thiserror::Error;

use crate::application::connection::Endpoint;
use crate::application::controller::{ControllerConfig, ReconnectPolicy};
use crate::application::frame_pipeline::{FillPolicy, PipelineConfig};

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "THINVIEW_CONFIG";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level client configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Verbosity of the host diagnostic channel (0, 1, or 5).
    #[serde(default = "default_diagnostic_level")]
    pub diagnostic_level: u8,
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

/// Server address.  A deployment constant, not user input.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EndpointConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Initial view size and simulated refresh rate of the headless display.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DisplayConfig {
    #[serde(default = "default_width")]
    pub width: u16,
    #[serde(default = "default_height")]
    pub height: u16,
    #[serde(default = "default_refresh_hz")]
    pub refresh_hz: u32,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PipelineSettings {
    #[serde(default)]
    pub fill_policy: FillPolicy,
    #[serde(default = "default_placeholder_frames")]
    pub placeholder_frames: u64,
    #[serde(default = "default_fps_report_interval")]
    pub fps_report_interval: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// Writes allowed to wait behind the in-flight one.
    #[serde(default = "default_write_queue_limit")]
    pub write_queue_limit: usize,
}

/// Automatic reconnection after a failure.  Off unless enabled.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ReconnectConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_diagnostic_level() -> u8 {
    1
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    30002
}
fn default_width() -> u16 {
    800
}
fn default_height() -> u16 {
    600
}
fn default_refresh_hz() -> u32 {
    60
}
fn default_placeholder_frames() -> u64 {
    5
}
fn default_fps_report_interval() -> u64 {
    60
}
fn default_write_queue_limit() -> usize {
    64
}
fn default_initial_ms() -> u64 {
    500
}
fn default_max_ms() -> u64 {
    30_000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            diagnostic_level: default_diagnostic_level(),
            endpoint: EndpointConfig::default(),
            display: DisplayConfig::default(),
            pipeline: PipelineSettings::default(),
            network: NetworkConfig::default(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            refresh_hz: default_refresh_hz(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            fill_policy: FillPolicy::default(),
            placeholder_frames: default_placeholder_frames(),
            fps_report_interval: default_fps_report_interval(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            write_queue_limit: default_write_queue_limit(),
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
        }
    }
}

impl ClientConfig {
    /// The initial view size.
    pub fn view_size(&self) -> Size {
        Size::new(self.display.width, self.display.height)
    }

    /// Settings consumed by the application layer.
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            endpoint: Endpoint::new(self.endpoint.host.clone(), self.endpoint.port),
            pipeline: PipelineConfig {
                fill_policy: self.pipeline.fill_policy,
                placeholder_frames: self.pipeline.placeholder_frames,
                fps_report_interval: self.pipeline.fps_report_interval,
            },
            write_queue_limit: self.network.write_queue_limit,
            diagnostic_level: self.diagnostic_level,
            reconnect: self.reconnect.enabled.then(|| ReconnectPolicy {
                initial: Duration::from_millis(self.reconnect.initial_ms),
                max: Duration::from_millis(self.reconnect.max_ms.max(self.reconnect.initial_ms)),
            }),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Picks the config path: `THINVIEW_CONFIG` first, then the first CLI argument.
pub fn config_path_from(env_value: Option<String>, mut args: impl Iterator<Item = String>) -> Option<PathBuf> {
    env_value
        .filter(|v| !v.is_empty())
        .or_else(|| args.next())
        .map(PathBuf::from)
}

/// Loads `ClientConfig` from `path`, returning defaults if the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ClientConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("thinview-config-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_default_config_targets_loopback_30002() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.endpoint.host, "127.0.0.1");
        assert_eq!(cfg.endpoint.port, 30002);
        assert_eq!(cfg.view_size(), Size::new(800, 600));
        assert_eq!(cfg.pipeline.fill_policy, FillPolicy::Accumulate);
        assert!(!cfg.reconnect.enabled);
    }

    #[test]
    fn test_partial_toml_overrides_only_named_fields() {
        // Arrange
        let text = r#"
            diagnostic_level = 5
            [pipeline]
            fill_policy = "first_response"
            [reconnect]
            enabled = true
        "#;

        // Act
        let cfg: ClientConfig = toml::from_str(text).unwrap();

        // Assert
        assert_eq!(cfg.diagnostic_level, 5);
        assert_eq!(cfg.pipeline.fill_policy, FillPolicy::FirstResponse);
        assert_eq!(cfg.pipeline.placeholder_frames, 5);
        assert!(cfg.reconnect.enabled);
        assert_eq!(cfg.reconnect.initial_ms, 500);
        assert_eq!(cfg.endpoint.port, 30002);
    }

    #[test]
    fn test_controller_config_reconnect_only_when_enabled() {
        let mut cfg = ClientConfig::default();
        assert!(cfg.controller_config().reconnect.is_none());

        cfg.reconnect.enabled = true;
        let policy = cfg.controller_config().reconnect.unwrap();
        assert_eq!(policy.initial, Duration::from_millis(500));
        assert_eq!(policy.max, Duration::from_secs(30));
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let cfg = load_config(&temp_path("does-not-exist.toml")).unwrap();
        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let path = temp_path("malformed.toml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "diagnostic_level = \"loud\"").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_existing_file_reads_every_section() {
        // Arrange
        let path = temp_path("full.toml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            "log_level = \"debug\"\n\
             [endpoint]\nport = 40000\n\
             [display]\nwidth = 1024\n\
             [network]\nwrite_queue_limit = 8\n",
        )
        .unwrap();

        // Act
        let cfg = load_config(&path).unwrap();

        // Assert
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.endpoint.port, 40000);
        assert_eq!(cfg.view_size(), Size::new(1024, 600));
        assert_eq!(cfg.controller_config().write_queue_limit, 8);
    }

    #[test]
    fn test_config_path_prefers_environment() {
        let args = vec!["from-args.toml".to_string()];
        assert_eq!(
            config_path_from(Some("from-env.toml".into()), args.clone().into_iter()),
            Some(PathBuf::from("from-env.toml"))
        );
        assert_eq!(
            config_path_from(None, args.into_iter()),
            Some(PathBuf::from("from-args.toml"))
        );
        assert_eq!(config_path_from(None, std::iter::empty()), None);
    }
}
