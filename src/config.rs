//! Runtime configuration read from `DIETWISE_*` environment variables.

use std::env;
use std::path::PathBuf;

use crate::adapters::forest::{SignaturePolicy, DEFAULT_MODEL_FILE};

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// File when stdout is a terminal (the TUI owns it), stdout otherwise.
    Auto,
    File,
    Stdout,
}

impl LogMode {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(Self::Auto),
            "file" => Ok(Self::File),
            "stdout" => Ok(Self::Stdout),
            other => Err(ConfigError::InvalidLogMode(other.to_string())),
        }
    }

    /// Resolve `Auto` against whether stdout is interactive.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

/// Logging controls.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub mode: LogMode,
    pub file: PathBuf,
}

/// Model artifact location and verification.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub path: PathBuf,
    pub signature: SignaturePolicy,
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub log: LogConfig,
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError` for unparseable values or an unreadable key file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns `ConfigError` for unparseable values or an unreadable key file.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = lookup("DIETWISE_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_model_path);

        let require_signature = lookup("DIETWISE_REQUIRE_SIGNED_MODEL")
            .map(|v| parse_bool(&v))
            .unwrap_or(false);

        let verifying_key_b64 = match lookup("DIETWISE_MODEL_SIGNING_PUBKEY_B64_FILE") {
            Some(file) => {
                let key = std::fs::read_to_string(file.trim()).map_err(|source| {
                    ConfigError::KeyFile {
                        path: PathBuf::from(file.trim()),
                        source,
                    }
                })?;
                Some(key.trim().to_string())
            }
            None => lookup("DIETWISE_MODEL_SIGNING_PUBKEY_B64").map(|v| v.trim().to_string()),
        };

        let mode = match lookup("DIETWISE_LOG_MODE") {
            Some(v) => LogMode::parse(&v)?,
            None => LogMode::Auto,
        };
        let file = lookup("DIETWISE_LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("dietwise.log"));

        Ok(Self {
            model: ModelConfig {
                path,
                signature: SignaturePolicy {
                    require_signature,
                    verifying_key_b64,
                },
            },
            log: LogConfig { mode, file },
        })
    }
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models").join(DEFAULT_MODEL_FILE)
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "yes" | "YES")
}

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DIETWISE_LOG_MODE must be auto, file or stdout (got {0:?})")]
    InvalidLogMode(String),

    #[error("failed reading verifying key file {path:?}: {source}")]
    KeyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
