use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::sync::DEFAULT_BASE_URL;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the SQLite database
    pub database_path: ConfigValue<PathBuf>,
    /// Base URL of the remote API, resources are joined onto it
    pub api_base_url: ConfigValue<String>,
    /// Run the one-time preload before commands
    pub preload: ConfigValue<bool>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    api_base_url: Option<String>,
    preload: Option<bool>,
}

pub const ENV_DATABASE_PATH: &str = "TRAVELOG_DATABASE_PATH";
pub const ENV_API_URL: &str = "TRAVELOG_API_URL";
pub const ENV_PRELOAD: &str = "TRAVELOG_PRELOAD";

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with_env(config_path, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`], reading overrides through `env` instead of
    /// the process environment.
    pub fn load_with_env<F>(config_path: Option<PathBuf>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut database_path = ConfigValue::new(
            Self::default_data_dir().join("travelog.db"),
            ConfigSource::Default,
        );
        let mut api_base_url =
            ConfigValue::new(DEFAULT_BASE_URL.to_string(), ConfigSource::Default);
        let mut preload = ConfigValue::new(true, ConfigSource::Default);
        let mut config_file = None;

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            let file_config: ConfigFile =
                serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
                    path: path.clone(),
                    source,
                })?;

            config_file = Some(path.clone());

            if let Some(db_path) = file_config.database_path {
                // Relative paths are relative to the config file's directory
                let resolved_path = if db_path.is_relative() {
                    path.parent().map(|p| p.join(&db_path)).unwrap_or(db_path)
                } else {
                    db_path
                };
                database_path = ConfigValue::new(resolved_path, ConfigSource::File);
            }
            if let Some(url) = file_config.api_base_url {
                api_base_url = ConfigValue::new(url, ConfigSource::File);
            }
            if let Some(enabled) = file_config.preload {
                preload = ConfigValue::new(enabled, ConfigSource::File);
            }
        }

        if let Some(db_path) = env(ENV_DATABASE_PATH) {
            database_path = ConfigValue::new(PathBuf::from(db_path), ConfigSource::Environment);
        }
        if let Some(url) = env(ENV_API_URL) {
            api_base_url = ConfigValue::new(url, ConfigSource::Environment);
        }
        if let Some(raw) = env(ENV_PRELOAD) {
            let enabled = parse_flag(&raw).ok_or_else(|| ConfigError::InvalidEnv {
                key: ENV_PRELOAD,
                value: raw.clone(),
            })?;
            preload = ConfigValue::new(enabled, ConfigSource::Environment);
        }

        Ok(Self {
            database_path,
            api_base_url,
            preload,
            config_file,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/travelog/
    /// - macOS: ~/Library/Application Support/travelog/
    /// - Windows: %APPDATA%/travelog/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("travelog")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/travelog/
    /// - macOS: ~/Library/Application Support/travelog/
    /// - Windows: %APPDATA%/travelog/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("travelog")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Invalid value '{value}' for {key}: expected true or false")]
    InvalidEnv { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load_with_env(Some(config_path), no_env).unwrap();
        assert!(config
            .database_path
            .value
            .to_string_lossy()
            .contains("travelog.db"));
        assert_eq!(config.database_path.source, ConfigSource::Default);
        assert_eq!(config.api_base_url.value, DEFAULT_BASE_URL);
        assert!(config.preload.value);
        assert_eq!(config.preload.source, ConfigSource::Default);
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "database_path: /custom/path/db.sqlite").unwrap();
        writeln!(file, "api_base_url: http://localhost:8090/").unwrap();
        writeln!(file, "preload: false").unwrap();

        let config = Config::load_with_env(Some(config_path.clone()), no_env).unwrap();
        assert_eq!(
            config.database_path.value,
            PathBuf::from("/custom/path/db.sqlite")
        );
        assert_eq!(config.database_path.source, ConfigSource::File);
        assert_eq!(config.api_base_url.value, "http://localhost:8090/");
        assert_eq!(config.api_base_url.source, ConfigSource::File);
        assert!(!config.preload.value);
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_relative_database_path_resolves_against_config_dir() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "database_path: data/trips.db").unwrap();

        let config = Config::load_with_env(Some(config_path), no_env).unwrap();
        assert_eq!(
            config.database_path.value,
            temp_dir.path().join("data/trips.db")
        );
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "api_base_url: http://fromfile/").unwrap();
        writeln!(file, "preload: true").unwrap();

        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_API_URL, "http://fromenv/"),
            (ENV_PRELOAD, "off"),
            (ENV_DATABASE_PATH, "/env/travelog.db"),
        ]);
        let config = Config::load_with_env(Some(config_path), |key| {
            env.get(key).map(|v| v.to_string())
        })
        .unwrap();

        assert_eq!(config.api_base_url.value, "http://fromenv/");
        assert_eq!(config.api_base_url.source, ConfigSource::Environment);
        assert!(!config.preload.value);
        assert_eq!(config.preload.source, ConfigSource::Environment);
        assert_eq!(
            config.database_path.value,
            PathBuf::from("/env/travelog.db")
        );
    }

    #[test]
    fn test_invalid_preload_env() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let result = Config::load_with_env(Some(config_path), |key| {
            (key == ENV_PRELOAD).then(|| "maybe".to_string())
        });
        let err = result.unwrap_err();
        assert!(err.to_string().contains(ENV_PRELOAD));
        assert!(err.to_string().contains("maybe"));
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load_with_env(Some(config_path), no_env);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_partial_file_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "preload: false").unwrap();

        let config = Config::load_with_env(Some(config_path), no_env).unwrap();
        assert_eq!(config.database_path.source, ConfigSource::Default);
        assert_eq!(config.api_base_url.source, ConfigSource::Default);
        assert_eq!(config.preload.source, ConfigSource::File);
    }
}
