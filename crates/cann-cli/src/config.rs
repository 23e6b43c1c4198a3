//! Configuration management for the cann CLI

use anyhow::Context;
use cann_runtime::{Consistency, IdleStrategy, SchedulerConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CliError, CliResult};

/// Global CLI configuration, read from `~/.config/cann/config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Default logging filter, overridden by `RUST_LOG`
    pub log_level: Option<String>,

    /// Default scheduler settings for `run` and `bench`
    pub scheduler: SchedulerConfig,
}

impl CliConfig {
    /// Load configuration from file, falling back to defaults if absent
    pub fn load_from_file(path: &Path) -> CliResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            toml::from_str(&content).map_err(|e| {
                CliError::config(format!("Invalid config file {}: {}", path.display(), e))
            })
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &Path) -> CliResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CliError::config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> CliResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CliError::config("Could not determine config directory"))?;
        Ok(config_dir.join("cann").join("config.toml"))
    }

    /// Load from an explicit path, or from the default location when one exists
    pub fn resolve(explicit: Option<&Path>) -> CliResult<Self> {
        match explicit {
            Some(path) if !path.exists() => Err(CliError::config(format!(
                "Config file {} does not exist",
                path.display()
            ))),
            Some(path) => Self::load_from_file(path),
            None => match Self::default_config_path() {
                Ok(path) => Self::load_from_file(&path),
                Err(_) => Ok(Self::default()),
            },
        }
    }

    /// Scheduler settings with command-line overrides applied
    pub fn scheduler(
        &self,
        workers: Option<usize>,
        consistency: Option<Consistency>,
        idle: Option<IdleStrategy>,
    ) -> SchedulerConfig {
        SchedulerConfig {
            workers: workers.unwrap_or(self.scheduler.workers),
            consistency: consistency.unwrap_or(self.scheduler.consistency),
            idle: idle.unwrap_or(self.scheduler.idle),
        }
    }
}
