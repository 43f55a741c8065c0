//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::{SplitterConfig, CONFIG_FILE};
use crate::error::ApiError;
use std::path::{Path, PathBuf};

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Path of the project config file
    pub fn project_config_path(project_root: &Path) -> PathBuf {
        project_root.join(CONFIG_FILE)
    }

    /// Load configuration from the project file and environment.
    pub fn load(project_root: &Path) -> Result<SplitterConfig, ApiError> {
        Ok(MergeService::load(project_root)?)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<SplitterConfig, ApiError> {
        Ok(MergeService::load_from_file(path)?)
    }

    /// Persist configuration to the project file, pretty-printed.
    pub fn save(project_root: &Path, config: &SplitterConfig) -> Result<PathBuf, ApiError> {
        let path = Self::project_config_path(project_root);
        Self::save_to(&path, config)?;
        Ok(path)
    }

    /// Persist configuration to an explicit file, pretty-printed.
    pub fn save_to(path: &Path, config: &SplitterConfig) -> Result<(), ApiError> {
        let json = serde_json::to_string_pretty(config)
            .map_err(|e| ApiError::ConfigError(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, json).map_err(|e| {
            ApiError::ConfigError(format!(
                "Failed to write config to {}: {}",
                path.display(),
                e
            ))
        })
    }
}
