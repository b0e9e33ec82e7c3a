//! Bot configuration loaded from YAML.
//!
//! # Invariants
//! - `storage_path` and `log_dir` must be present and non-empty.
//! - Optional keys fall back to documented defaults.

use crate::logging::default_log_level;
use crate::time::zone::DEFAULT_ZONE_NAME;
use log::info;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Default config file looked up by the CLI.
pub const DEFAULT_CONFIG_FILE: &str = "prod.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default = "default_env")]
    pub env: String,
    #[serde(default)]
    pub storage_path: PathBuf,
    #[serde(default)]
    pub log_dir: String,
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: std::io::Error },
    Parse(serde_yaml::Error),
    MissingField(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "error reading config file `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "error parsing config file: {err}"),
            Self::MissingField(field) => write!(f, "{field} is required in config"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::MissingField(_) => None,
        }
    }
}

impl Config {
    /// Reads and validates a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&raw)?;
        info!(
            "event=config_load module=config status=ok file={} env={}",
            path.display(),
            config.env
        );
        Ok(config)
    }

    /// Parses and validates YAML text.
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Effective log level: configured value or the build-mode default.
    pub fn effective_log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("storage_path"));
        }
        if self.log_dir.trim().is_empty() {
            return Err(ConfigError::MissingField("log_dir"));
        }
        Ok(())
    }
}

fn default_env() -> String {
    "local".to_string()
}

fn default_timezone() -> String {
    DEFAULT_ZONE_NAME.to_string()
}
