//! QueueConfig - TOML で読み込む queue 設定

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Queue configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Queue identity, reported in `QueueStatus` and used as the storage
    /// sub-directory.
    #[serde(default = "default_site_id")]
    pub site_id: String,

    /// Root directory for file-backed storage.
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,

    /// Start a pass right after `add_task` once this many tasks are pending.
    #[serde(default = "default_min_tasks_to_run")]
    pub min_tasks_to_run: usize,

    /// Otherwise run once after this delay.
    #[serde(default = "default_run_delay_secs")]
    pub run_delay_secs: u64,

    /// Tasks older than this are discarded by expiry cleanup.
    #[serde(default = "default_expired_task_max_age_secs")]
    pub expired_task_max_age_secs: u64,
}

fn default_site_id() -> String {
    "default".to_string()
}

fn default_min_tasks_to_run() -> usize {
    1
}

fn default_run_delay_secs() -> u64 {
    30
}

fn default_expired_task_max_age_secs() -> u64 {
    3 * 24 * 60 * 60
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            site_id: default_site_id(),
            storage_dir: None,
            min_tasks_to_run: default_min_tasks_to_run(),
            run_delay_secs: default_run_delay_secs(),
            expired_task_max_age_secs: default_expired_task_max_age_secs(),
        }
    }
}

impl QueueConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: QueueConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site_id.trim().is_empty() {
            return Err(ConfigError::Invalid("site_id must not be empty".into()));
        }
        if self.site_id.contains(['/', '\\']) || self.site_id == "." || self.site_id == ".." {
            return Err(ConfigError::Invalid(format!(
                "site_id '{}' is not usable as a directory name",
                self.site_id
            )));
        }
        if self.min_tasks_to_run == 0 {
            return Err(ConfigError::Invalid("min_tasks_to_run must be at least 1".into()));
        }
        Ok(())
    }

    pub fn run_delay(&self) -> Duration {
        Duration::from_secs(self.run_delay_secs)
    }

    pub fn expired_task_max_age(&self) -> Duration {
        Duration::from_secs(self.expired_task_max_age_secs)
    }

    /// Directory holding this site's queue files, when file storage is configured.
    pub fn queue_dir(&self) -> Option<PathBuf> {
        self.storage_dir
            .as_ref()
            .map(|root| root.join(&self.site_id).join("queue"))
    }
}
