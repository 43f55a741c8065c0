//! Configuration
//!
//! Settings live in `<project root>/.config.flow-splitter.json`, overlaid by
//! `FLOW_SPLITTER__*` environment variables.

mod facade;
pub mod merge;
pub mod sources;

pub use facade::ConfigLoader;

use crate::flow::FileFormat;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project-relative config file name
pub const CONFIG_FILE: &str = ".config.flow-splitter.json";

fn default_destination_folder() -> PathBuf {
    PathBuf::from("src")
}

fn default_true() -> bool {
    true
}

/// Splitter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitterConfig {
    /// Entity file format: yaml or json
    #[serde(
        rename = "fileFormat",
        alias = "fileformat",
        alias = "file_format",
        default
    )]
    pub file_format: FileFormat,

    /// Root of the split tree, relative to the project root
    #[serde(
        rename = "destinationFolder",
        alias = "destinationfolder",
        alias = "destination_folder",
        default = "default_destination_folder"
    )]
    pub destination_folder: PathBuf,

    /// Gates extraction and restoration of code fields
    #[serde(
        rename = "extractFunctionsTemplates",
        alias = "extractfunctionstemplates",
        alias = "extract_functions_templates",
        default = "default_true"
    )]
    pub extract_functions_templates: bool,

    /// Tab ids in document order, maintained by the flow-set manager
    #[serde(
        rename = "tabsOrder",
        alias = "tabsorder",
        alias = "tabs_order",
        default
    )]
    pub tabs_order: Vec<String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            file_format: FileFormat::default(),
            destination_folder: default_destination_folder(),
            extract_functions_templates: default_true(),
            tabs_order: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SplitterConfig {
    /// Absolute destination folder for a project root
    pub fn destination_dir(&self, project_root: &Path) -> PathBuf {
        if self.destination_folder.is_absolute() {
            self.destination_folder.clone()
        } else {
            project_root.join(&self.destination_folder)
        }
    }
}
