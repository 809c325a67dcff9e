//! Client configuration
//!
//! Loaded in three layers: defaults, then an optional TOML or JSON file
//! (chosen by extension), then `VOUCH_*` environment variables. The result
//! is validated before use.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vouch_app::SessionSettings;

use crate::account::AccountConfig;

/// Name of the preferences file inside the storage directory.
pub const PREFERENCES_FILE: &str = "preferences.json";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "VOUCH_";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or type error
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON syntax or type error
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// File extension is neither `toml` nor `json`
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(PathBuf),

    /// A value is out of range or unparseable
    #[error("invalid value for {key}: {reason}")]
    Invalid {
        /// Offending key
        key: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Identity SDK environment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Live network
    Production,
    /// Test network
    #[default]
    Sandbox,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => f.write_str("production"),
            Self::Sandbox => f.write_str("sandbox"),
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "sandbox" => Ok(Self::Sandbox),
            other => Err(ConfigError::Invalid {
                key: "environment",
                reason: format!("expected production or sandbox, got {other:?}"),
            }),
        }
    }
}

/// Client configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Durable account storage and preferences directory
    pub storage_path: PathBuf,
    /// SDK environment
    pub environment: Environment,
    /// Connection attempt timeout in seconds
    pub connect_timeout_secs: u64,
    /// Toast display time in milliseconds
    pub toast_duration_ms: u64,
    /// Default log filter
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("./.vouch"),
            environment: Environment::default(),
            connect_timeout_secs: 30,
            toast_duration_ms: 3000,
            log_level: "info".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load all layers. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) if path.exists() => Self::load_from_file(path)?,
            _ => Self::default(),
        };
        config.merge_with_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML or JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Overlay `VOUCH_*` variables from the process environment.
    pub fn merge_with_env(&mut self) -> Result<(), ConfigError> {
        self.merge_with_vars(std::env::vars())
    }

    /// Overlay `VOUCH_*` variables from `vars`. Unknown keys are ignored.
    pub fn merge_with_vars<I, K, V>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref();
            match name {
                "STORAGE_PATH" => self.storage_path = PathBuf::from(value),
                "ENVIRONMENT" => self.environment = value.parse()?,
                "CONNECT_TIMEOUT_SECS" => {
                    self.connect_timeout_secs = parse_number("connect_timeout_secs", value)?;
                }
                "TOAST_DURATION_MS" => {
                    self.toast_duration_ms = parse_number("toast_duration_ms", value)?;
                }
                "LOG_LEVEL" => self.log_level = value.to_string(),
                _ => {}
            }
        }
        Ok(())
    }

    /// Reject values the client cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "connect_timeout_secs",
                reason: "must be greater than zero".into(),
            });
        }
        if self.toast_duration_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "toast_duration_ms",
                reason: "must be greater than zero".into(),
            });
        }
        if self.storage_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                key: "storage_path",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Path of the preferences file.
    pub fn preferences_path(&self) -> PathBuf {
        self.storage_path.join(PREFERENCES_FILE)
    }

    /// Settings for starting the identity SDK.
    pub fn account_config(&self) -> AccountConfig {
        AccountConfig {
            storage_path: self.storage_path.clone(),
            environment: self.environment,
        }
    }

    /// Timings for the session state machine.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            toast_duration: Duration::from_millis(self.toast_duration_ms),
        }
    }
}

fn parse_number(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|e| ConfigError::Invalid {
        key,
        reason: format!("{value:?}: {e}"),
    })
}
