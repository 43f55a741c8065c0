//! MergeService: orchestrates sources and deserializes to SplitterConfig.

use crate::config::sources::{environment, project_file};
use crate::config::SplitterConfig;
use config::{Config, ConfigError};
use std::path::Path;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Load config from the project root.
    /// Precedence: struct defaults (lowest) -> project file -> environment (highest).
    pub fn load(project_root: &Path) -> Result<SplitterConfig, ConfigError> {
        let builder = Config::builder();
        let builder = project_file::add_to_builder(builder, project_root);
        let builder = environment::add_to_builder(builder);

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load config from a specific file with environment overlay.
    pub fn load_from_file(path: &Path) -> Result<SplitterConfig, ConfigError> {
        let builder = Config::builder();
        let builder = project_file::add_file_to_builder(builder, path, true);
        let builder = environment::add_to_builder(builder);

        let config = builder.build()?;
        config.try_deserialize()
    }
}
