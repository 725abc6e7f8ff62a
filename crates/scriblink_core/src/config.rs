//! Core runtime configuration.
//!
//! # Responsibility
//! - Load logging level and summary validation rules from a JSON file.
//!
//! # Invariants
//! - Every field is optional in the file and falls back to its default.
//! - A loaded config has already passed `CoreConfig::validate`.

use crate::logging::{default_log_level, normalize_level};
use crate::summary::rules::{RulesError, SummaryRules};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Runtime configuration consumed by core callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    pub summary_rules: SummaryRules,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            summary_rules: SummaryRules::default(),
        }
    }
}

impl CoreConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(value: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(value).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_level(&self.log_level).map_err(ConfigError::InvalidLogLevel)?;
        self.summary_rules
            .validate()
            .map_err(ConfigError::InvalidRules)
    }
}

/// Reads, parses and validates a JSON config file.
pub fn load_config(path: impl AsRef<Path>) -> Result<CoreConfig, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    CoreConfig::from_json_str(&raw)
}

/// Config loading failure.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    InvalidLogLevel(String),
    InvalidRules(RulesError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
            Self::InvalidRules(err) => write!(f, "invalid summary_rules: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::InvalidLogLevel(_) => None,
            Self::InvalidRules(err) => Some(err),
        }
    }
}
