//! Store configuration.

use std::fs;
use std::path::{Path, PathBuf};

use formstore_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Environment variable read by [`StoreConfig::from_env`].
pub const BASE_DIR_ENV: &str = "FORMSTORE_BASE_DIR";

/// Where a [`DataStore`](crate::DataStore) keeps uploaded file bytes.
///
/// ```json
/// { "baseDir": "/var/lib/forms/files" }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    pub base_dir: PathBuf,
}

impl StoreConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: StoreConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json_str(&contents)
    }

    /// Read [`BASE_DIR_ENV`] from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Read [`BASE_DIR_ENV`] through `lookup`.
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_dir = lookup(BASE_DIR_ENV).ok_or_else(|| Error::Config {
            message: format!("{} is not set", BASE_DIR_ENV),
        })?;
        let config = Self::new(base_dir);
        config.validate()?;
        Ok(config)
    }

    /// The base directory must be non-empty. Its existence is not checked.
    pub fn validate(&self) -> Result<()> {
        if self.base_dir.as_os_str().is_empty() {
            return Err(Error::Config {
                message: "base directory is empty".to_string(),
            });
        }
        Ok(())
    }
}
