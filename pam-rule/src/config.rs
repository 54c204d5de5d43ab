//! Decoder configuration types and loading.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::rule::ControlMode;

/// Default location of the decoder configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/pam-rule/config.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid value for {var}: \"{value}\" (expected legacy or strict)")]
    InvalidMode { var: &'static str, value: String },
}

/// How rules are decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Control flag decoder; `legacy` keeps existing configuration corpora
    /// decoding exactly as before
    pub control_mode: ControlMode,
}

impl DecoderConfig {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific path.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: DecoderConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    ///
    /// - `PAM_RULE_CONFIG`: path to a YAML config file
    /// - `PAM_RULE_CONTROL_MODE`: `legacy` or `strict`
    ///
    /// Falls back to the default location, then to defaults if that file is absent.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var("PAM_RULE_CONFIG") {
            return Self::load_from(&path);
        }

        if let Ok(mode) = std::env::var("PAM_RULE_CONTROL_MODE") {
            let control_mode = match mode.as_str() {
                "legacy" => ControlMode::Legacy,
                "strict" => ControlMode::Strict,
                _ => {
                    return Err(ConfigError::InvalidMode {
                        var: "PAM_RULE_CONTROL_MODE",
                        value: mode,
                    })
                }
            };
            return Ok(Self { control_mode });
        }

        match Self::load() {
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }
}
