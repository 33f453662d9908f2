//! Configuration loading for linksync.
//!
//! Configuration is loaded from a TOML file (default: `linksync.toml` in the
//! data directory). Every section and field is optional.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use sync_store::StorageConfig;

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Dispatcher configuration.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Outbox transport configuration.
    #[serde(default)]
    pub outbox: OutboxConfig,
}

/// Dispatcher configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Triggers buffered before senders wait (default: 64).
    #[serde(default = "default_trigger_buffer")]
    pub trigger_buffer: usize,
}

/// Outbox transport configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OutboxConfig {
    /// Directory payloads are spooled to (default: outbox).
    #[serde(default = "default_outbox_directory")]
    pub directory: PathBuf,
}

fn default_trigger_buffer() -> usize {
    64
}

fn default_outbox_directory() -> PathBuf {
    PathBuf::from("outbox")
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            trigger_buffer: default_trigger_buffer(),
        }
    }
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            directory: default_outbox_directory(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Resolve relative paths against `base`.
    pub fn with_base_dir(mut self, base: &Path) -> Self {
        if self.storage.database.is_relative() {
            self.storage.database = base.join(&self.storage.database);
        }
        if self.outbox.directory.is_relative() {
            self.outbox.directory = base.join(&self.outbox.directory);
        }
        self
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.storage.database, PathBuf::from("linksync.db"));
        assert_eq!(config.dispatch.trigger_buffer, 64);
        assert_eq!(config.outbox.directory, PathBuf::from("outbox"));
    }

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
[storage]
database = "/data/linksync.db"
max_connections = 2

[dispatch]
trigger_buffer = 8

[outbox]
directory = "/var/spool/linksync"
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.storage.database, PathBuf::from("/data/linksync.db"));
        assert_eq!(config.storage.max_connections, 2);
        assert_eq!(config.storage.busy_timeout_secs, 5);
        assert_eq!(config.dispatch.trigger_buffer, 8);
        assert_eq!(config.outbox.directory, PathBuf::from("/var/spool/linksync"));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.dispatch.trigger_buffer, 64);
        assert_eq!(config.storage.max_connections, 4);
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let toml = r#"
[outbox]
directory = "/abs/outbox"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let config = config.with_base_dir(Path::new("/home/me/.linksync"));

        assert_eq!(
            config.storage.database,
            PathBuf::from("/home/me/.linksync/linksync.db")
        );
        assert_eq!(config.outbox.directory, PathBuf::from("/abs/outbox"));
    }

    #[test]
    fn from_file_reports_missing_file() {
        let err = Config::from_file(Path::new("/nonexistent/linksync.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn from_file_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("linksync.toml");
        std::fs::write(&path, "[dispatch]\ntrigger_buffer = \"lots\"\n").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }
}
