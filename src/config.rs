//! Settings from an optional `lineage.toml`, overridden by CLI flags.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::reign;

pub const DEFAULT_CONFIG_FILE: &str = "lineage.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding monarchs.json and persons.json (or persons/).
    pub data_dir: PathBuf,
    /// Allowed difference in years between `ageAtDeath` and `died - born`.
    pub age_tolerance: i32,
    /// Evaluation date for living persons; today when unset.
    pub as_of: Option<NaiveDate>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            data_dir: PathBuf::from("data"),
            age_tolerance: 1,
            as_of: None,
        }
    }
}

impl Settings {
    /// Read `path`, or `lineage.toml` in the working directory if present.
    /// An explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Settings::default());
                }
                default
            }
        };
        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let settings = Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), ?settings, "loaded config");
        Ok(settings)
    }

    fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn evaluation_date(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(reign::today)
    }
}
