//! Configuration loading using figment
//!
//! Sources in precedence order (later sources override earlier ones):
//! 1. Defaults
//! 2. `crm-kanban.toml`, `crm-kanban.yaml` or `crm-kanban.yml` in the search
//!    directory, or the single file given with [`ConfigProvider::with_file`]
//! 3. `CRM_KANBAN_*` environment variables (`CRM_KANBAN_API_URL`, ...)
//! 4. Explicit overrides, e.g. from command-line flags

use crate::error::ConfigError;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, trace};

/// Result type for configuration loading
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "CRM_KANBAN_";

/// File stem searched for in the search directory
pub const CONFIG_FILE_STEM: &str = "crm-kanban";

/// Settings for talking to the backend and polling it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KanbanConfig {
    /// Base URL of the CRM backend, without the `/api` suffix
    pub api_url: String,
    /// Board sync period
    pub poll_interval_ms: u64,
    /// Per-request timeout
    pub request_timeout_ms: u64,
    /// Recorded as the actor of activity log entries
    pub actor: Option<String>,
}

impl Default for KanbanConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000".to_string(),
            poll_interval_ms: 1000,
            request_timeout_ms: 10_000,
            actor: None,
        }
    }
}

impl KanbanConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Reject values that would make the client unusable
    pub fn validate(&self) -> ConfigResult<()> {
        let url = self.api_url.trim();
        if url.is_empty() {
            return Err(ConfigError::invalid_value("api_url", "must not be empty"));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::invalid_value(
                "api_url",
                format!("'{}' is not an http(s) URL", url),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::invalid_value("poll_interval_ms", "must be greater than zero"));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "request_timeout_ms",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Builds a [`KanbanConfig`] from all sources
///
/// Nothing is cached; every [`load`](Self::load) reads the sources afresh.
#[derive(Debug, Clone, Default)]
pub struct ConfigProvider {
    search_dir: Option<PathBuf>,
    file: Option<PathBuf>,
    overrides: Vec<(&'static str, String)>,
}

impl ConfigProvider {
    /// Create a provider searching the current directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Search `dir` instead of the current directory
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dir = Some(dir.into());
        self
    }

    /// Use exactly this file; it must exist
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Override the backend URL above every other source
    pub fn with_api_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.overrides.push(("api_url", url));
        }
        self
    }

    /// Load, merge and validate
    pub fn load(&self) -> ConfigResult<KanbanConfig> {
        debug!("Loading kanban configuration");
        let config: KanbanConfig = self.build_figment()?.extract()?;
        config.validate()?;
        debug!(api_url = %config.api_url, poll_ms = config.poll_interval_ms, "configuration loaded");
        Ok(config)
    }

    fn build_figment(&self) -> ConfigResult<Figment> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(KanbanConfig::default()))
            .merge(self.load_config_files()?)
            .merge(Env::prefixed(ENV_PREFIX).map(|key| key.as_str().to_lowercase().into()));

        for (key, value) in &self.overrides {
            figment = figment.merge(Serialized::default(key, value));
        }
        Ok(figment)
    }

    fn load_config_files(&self) -> ConfigResult<Figment> {
        if let Some(path) = &self.file {
            if !path.is_file() {
                return Err(ConfigError::FileNotFound { path: path.clone() });
            }
            return load_config_file(path);
        }

        let dir = self.search_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        let mut figment = Figment::new();
        for ext in ["toml", "yaml", "yml"] {
            let path = dir.join(format!("{}.{}", CONFIG_FILE_STEM, ext));
            if path.is_file() {
                trace!(path = %path.display(), "Loading config file");
                figment = figment.merge(load_config_file(&path)?);
            }
        }
        Ok(figment)
    }
}

/// Load a single configuration file based on its extension
fn load_config_file(path: &Path) -> ConfigResult<Figment> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => Ok(Figment::from(Toml::file(path))),
        Some("yaml") | Some("yml") => Ok(Figment::from(Yaml::file(path))),
        Some("json") => Ok(Figment::from(Json::file(path))),
        _ => Err(ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn clear_env() {
        for key in ["API_URL", "POLL_INTERVAL_MS", "REQUEST_TIMEOUT_MS", "ACTOR"] {
            std::env::remove_var(format!("{}{}", ENV_PREFIX, key));
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let temp = TempDir::new().unwrap();
        let config = ConfigProvider::new().in_dir(temp.path()).load().unwrap();
        assert_eq!(config, KanbanConfig::default());
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    #[serial]
    fn test_toml_file_in_dir() {
        clear_env();
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("crm-kanban.toml"),
            "api_url = \"https://crm.example.com\"\npoll_interval_ms = 2500\n",
        )
        .unwrap();

        let config = ConfigProvider::new().in_dir(temp.path()).load().unwrap();
        assert_eq!(config.api_url, "https://crm.example.com");
        assert_eq!(config.poll_interval_ms, 2500);
        assert_eq!(config.request_timeout_ms, 10_000);
    }

    #[test]
    #[serial]
    fn test_yaml_overrides_toml() {
        clear_env();
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("crm-kanban.toml"), "actor = \"toml\"\n").unwrap();
        fs::write(temp.path().join("crm-kanban.yaml"), "actor: yaml\n").unwrap();

        let config = ConfigProvider::new().in_dir(temp.path()).load().unwrap();
        assert_eq!(config.actor.as_deref(), Some("yaml"));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file_and_flag_overrides_env() {
        clear_env();
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("crm-kanban.toml"), "request_timeout_ms = 500\n").unwrap();
        std::env::set_var("CRM_KANBAN_REQUEST_TIMEOUT_MS", "750");
        std::env::set_var("CRM_KANBAN_API_URL", "http://env:1");

        let config = ConfigProvider::new()
            .in_dir(temp.path())
            .with_api_url(Some("http://flag:2".into()))
            .load()
            .unwrap();
        assert_eq!(config.request_timeout_ms, 750);
        assert_eq!(config.api_url, "http://flag:2");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_explicit_file_must_exist() {
        clear_env();
        let temp = TempDir::new().unwrap();
        let err = ConfigProvider::new()
            .with_file(temp.path().join("missing.toml"))
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));

        let json_path = temp.path().join("board.json");
        fs::write(&json_path, r#"{"poll_interval_ms": 3000}"#).unwrap();
        let config = ConfigProvider::new().with_file(&json_path).load().unwrap();
        assert_eq!(config.poll_interval_ms, 3000);
    }

    #[test]
    #[serial]
    fn test_validation() {
        clear_env();
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("crm-kanban.toml"), "poll_interval_ms = 0\n").unwrap();
        let err = ConfigProvider::new().in_dir(temp.path()).load().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "poll_interval_ms"));

        let bad_url = KanbanConfig {
            api_url: "localhost:5000".into(),
            ..KanbanConfig::default()
        };
        assert!(bad_url.validate().is_err());
    }
}
