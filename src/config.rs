//! Operator configuration
//!
//! Loaded from `~/.usagedash/config.json` unless a path is given. Every field
//! is optional:
//!
//! ```json
//! {
//!   "data_dir": "/srv/usagedash/store",
//!   "excluded_users": ["Internal QA", "Demo Account"],
//!   "cache_ttl_secs": 600
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::services::ExclusionList;
use crate::types::{DashError, Result};

/// Default lifetime of cached query results (10 minutes)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DashConfig {
    /// Root of the JSON document store; defaults to `~/.usagedash/store`
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Display names left out of population rollups
    #[serde(default)]
    pub excluded_users: Vec<String>,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            excluded_users: Vec::new(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl DashConfig {
    /// `~/.usagedash`
    pub fn home_dir() -> Result<PathBuf> {
        let base_dirs = BaseDirs::new()
            .ok_or_else(|| DashError::Config("Cannot determine home directory".into()))?;
        Ok(base_dirs.home_dir().join(".usagedash"))
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("config.json"))
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    debug!(path = %path.display(), "no config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DashError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| DashError::Config(format!("invalid {}: {}", path.display(), e)))
    }

    pub fn exclusions(&self) -> ExclusionList {
        ExclusionList::new(self.excluded_users.iter().cloned())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Configured store directory, or `~/.usagedash/store`
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::home_dir()?.join("store")),
        }
    }
}
