//! Structured-document codec for entity files.

use crate::types::NodeRecord;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// On-disk format of entity files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    #[default]
    Yaml,
    Json,
}

impl FileFormat {
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Yaml => "yaml",
            FileFormat::Json => "json",
        }
    }

    /// Format implied by a path's extension, if it is one we write
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Some(FileFormat::Yaml),
            Some("json") => Some(FileFormat::Json),
            _ => None,
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Contents of a tab or subflow file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDocument {
    pub entity: NodeRecord,
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
}

/// Contents of the config-node file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigNodesDocument {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
}

pub fn encode<T: Serialize>(format: FileFormat, value: &T) -> Result<String, String> {
    match format {
        FileFormat::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
        FileFormat::Json => serde_json::to_string_pretty(value)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| e.to_string()),
    }
}

pub fn decode<T: DeserializeOwned>(format: FileFormat, text: &str) -> Result<T, String> {
    match format {
        FileFormat::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
        FileFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
    }
}
