use std::path::Path;
use std::time::Duration;

use keyrot::{KeyrotError, ManagerConfig};
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading the YAML configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(#[from] KeyrotError),
}

/// Key rotation settings as read from YAML. Missing fields fall back to the
/// library defaults.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct KeyrotConfig {
    pub duration_secs: Option<u64>,
    pub limit: Option<usize>,
    pub bits: Option<usize>,
    pub grace_ms: Option<u64>,
}

impl KeyrotConfig {
    /// Read and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        // An empty document means "all defaults".
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: KeyrotConfig = serde_yaml::from_str(contents)?;
        config.manager_config().validate()?;
        Ok(config)
    }

    pub fn manager_config(&self) -> ManagerConfig {
        let mut config = ManagerConfig::default();
        if let Some(secs) = self.duration_secs {
            config = config.with_duration(Duration::from_secs(secs));
        }
        if let Some(limit) = self.limit {
            config = config.with_limit(limit);
        }
        if let Some(bits) = self.bits {
            config = config.with_bits(bits);
        }
        if let Some(ms) = self.grace_ms {
            config = config.with_grace(Duration::from_millis(ms));
        }
        config
    }
}
