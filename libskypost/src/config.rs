//! Configuration management for Skypost

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

pub const DEFAULT_PDS_URL: &str = "https://bsky.social";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_STORE_PATH: &str = "~/.local/share/skypost/sessions";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the PDS; XRPC paths are appended under `/xrpc/`
    pub pds_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            pds_url: DEFAULT_PDS_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding `auth_response_<handle>.json` files
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_STORE_PATH.to_string(),
        }
    }
}

impl StoreConfig {
    /// Store directory with `~` expanded
    pub fn expand_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).to_string())
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// A missing config file is not an error; defaults are used instead.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        if !config_path.exists() {
            tracing::debug!("No config file at {:?}, using defaults", config_path);
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        if let Err(e) = url::Url::parse(&self.service.pds_url) {
            return Err(ConfigError::InvalidValue {
                field: "service.pds_url".to_string(),
                reason: e.to_string(),
            }
            .into());
        }

        if self.service.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "service.timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            }
            .into());
        }

        if self.store.path.trim().is_empty() {
            return Err(ConfigError::MissingField("store.path".to_string()).into());
        }

        Ok(())
    }
}

/// Resolve the configuration file path following XDG Base Directory conventions
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("SKYPOST_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("skypost").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SkypostError;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.service.pds_url, "https://bsky.social");
        assert_eq!(config.service.timeout(), Duration::from_secs(10));
        assert_eq!(config.store.path, DEFAULT_STORE_PATH);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[service]
pds_url = "http://127.0.0.1:2583"
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.service.pds_url, "http://127.0.0.1:2583");
        assert_eq!(config.service.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.store, StoreConfig::default());
    }

    #[test]
    fn test_load_rejects_bad_url() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[service]\npds_url = \"not a url\"\n").unwrap();

        match Config::load_from_path(&path) {
            Err(SkypostError::Config(ConfigError::InvalidValue { field, .. })) => {
                assert_eq!(field, "service.pds_url");
            }
            other => panic!("Expected invalid value error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_rejects_zero_timeout() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[service]\ntimeout_secs = 0\n").unwrap();

        assert!(Config::load_from_path(&path).is_err());
    }

    #[test]
    fn test_load_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[service\n").unwrap();

        match Config::load_from_path(&path) {
            Err(SkypostError::Config(ConfigError::ParseError(_))) => {}
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_store_path_tilde_expansion() {
        let store = StoreConfig {
            path: "~/sessions".to_string(),
        };
        let expanded = store.expand_path();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.ends_with("sessions"));
    }

    #[test]
    #[serial]
    fn test_resolve_config_path_env_override() {
        std::env::set_var("SKYPOST_CONFIG", "/tmp/skypost-test/config.toml");
        let path = resolve_config_path().unwrap();
        std::env::remove_var("SKYPOST_CONFIG");

        assert_eq!(path, PathBuf::from("/tmp/skypost-test/config.toml"));
    }

    #[test]
    #[serial]
    fn test_load_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.toml");
        std::env::set_var("SKYPOST_CONFIG", &path);
        let config = Config::load();
        std::env::remove_var("SKYPOST_CONFIG");

        assert_eq!(config.unwrap(), Config::default());
    }
}
