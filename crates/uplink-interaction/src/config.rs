//! Backend endpoint configuration.
//!
//! Loaded from `~/.config/uplink/config.toml` when the file exists; the
//! `UPLINK_BACKEND_URL` environment variable overrides the endpoint either
//! way. A missing file yields the defaults, a present-but-broken file is an
//! error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Address of the coordination service's chat endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/api/chat";

/// Environment variable overriding the configured endpoint.
pub const ENDPOINT_ENV_VAR: &str = "UPLINK_BACKEND_URL";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur while loading the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// How to reach the agent backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl BackendConfig {
    /// Loads the config from the default location and applies the
    /// environment override.
    ///
    /// # Errors
    ///
    /// Returns an error only when a config file exists and cannot be read
    /// or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let config = match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };

        Ok(config.apply_endpoint_override(endpoint_from_env()))
    }

    /// Reads and parses one specific TOML file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `~/.config/uplink/config.toml` on the current platform.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("uplink").join("config.toml"))
    }

    /// The request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn apply_endpoint_override(mut self, endpoint: Option<String>) -> Self {
        if let Some(endpoint) = endpoint {
            tracing::debug!("[BackendConfig] Endpoint overridden from environment");
            self.endpoint = endpoint;
        }
        self
    }
}

fn endpoint_from_env() -> Option<String> {
    std::env::var(ENDPOINT_ENV_VAR)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = BackendConfig::default();
        assert_eq!(config.endpoint, "http://127.0.0.1:5000/api/chat");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_load_from_full_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "endpoint = \"http://backend:8080/api/chat\"").unwrap();
        writeln!(file, "timeout_secs = 5").unwrap();

        let config = BackendConfig::load_from(file.path()).unwrap();
        assert_eq!(config.endpoint, "http://backend:8080/api/chat");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_load_from_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timeout_secs = 90").unwrap();

        let config = BackendConfig::load_from(file.path()).unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.timeout_secs, 90);
    }

    #[test]
    fn test_load_from_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = BackendConfig::load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_from_broken_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "endpoint = [not toml").unwrap();

        let err = BackendConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_endpoint_override_wins() {
        let config = BackendConfig::default()
            .apply_endpoint_override(Some("http://elsewhere:9999/api/chat".to_string()));
        assert_eq!(config.endpoint, "http://elsewhere:9999/api/chat");

        let untouched = BackendConfig::default().apply_endpoint_override(None);
        assert_eq!(untouched.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = BackendConfig {
            endpoint: "http://10.0.0.2:5000/api/chat".to_string(),
            timeout_secs: 12,
        };

        let rendered = toml::to_string(&config).unwrap();
        let parsed: BackendConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
