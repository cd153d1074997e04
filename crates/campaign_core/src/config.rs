//! Runtime configuration for the campaign core.
//!
//! # Responsibility
//! - Layer built-in defaults, an optional JSON file and `CAMPAIGN_*`
//!   environment variables into one `CoreConfig`.
//!
//! # Invariants
//! - Precedence, highest first: environment, JSON file, defaults.
//! - Unknown JSON keys are rejected; unrelated `CAMPAIGN_*` variables are ignored.
//! - A named config file must exist.

use crate::logging::default_log_level;
use figment::providers::{Env, Format, Json, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Prefix of environment overrides, e.g. `CAMPAIGN_DB_PATH` -> `db_path`.
pub const ENV_PREFIX: &str = "CAMPAIGN_";
const ENV_KEYS: [&str; 3] = ["log_level", "log_dir", "db_path"];

/// Errors while loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Extraction or merge failure from any layer.
    Figment(Box<figment::Error>),
    MissingFile(PathBuf),
    InvalidValue {
        field: &'static str,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Figment(err) => write!(f, "configuration error: {err}"),
            Self::MissingFile(path) => {
                write!(f, "config file `{}` does not exist", path.display())
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "invalid configuration value for `{field}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Figment(err) => Some(err.as_ref()),
            Self::MissingFile(_) | Self::InvalidValue { .. } => None,
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(value: figment::Error) -> Self {
        Self::Figment(Box::new(value))
    }
}

/// Core settings shared by the CLI and embedders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub log_level: String,
    /// Absolute directory for rolling log files; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    /// SQLite database file; an in-memory database is used when unset.
    pub db_path: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            log_dir: None,
            db_path: None,
        }
    }
}

impl CoreConfig {
    /// Loads all layers. `path` names the optional JSON file.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            if !path.is_file() {
                return Err(ConfigError::MissingFile(path.to_path_buf()));
            }
        }
        let config: Self = Self::figment(path).extract()?;
        config.validate()
    }

    /// Builds the provider chain without extracting it.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Json::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).only(&ENV_KEYS))
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "log_level",
                reason: "must not be blank".to_string(),
            });
        }
        if self
            .db_path
            .as_deref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            return Err(ConfigError::InvalidValue {
                field: "db_path",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(self)
    }
}
