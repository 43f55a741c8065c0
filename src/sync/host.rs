//! Host runtime capability.
//!
//! The host hands this crate its flows on start and takes the rebuilt
//! document back on reload. `load_flows` returns once the host has consumed
//! the document, so no temporary monolithic file needs to be timed out.

use crate::error::ApiError;
use crate::flow::MonolithDocument;
use crate::types::NodeRecord;
use std::path::{Path, PathBuf};
use tracing::info;

pub trait HostRuntime: Send + Sync {
    fn load_flows(&self, flows: &MonolithDocument) -> Result<(), ApiError>;
}

/// Host that persists the monolithic document as a JSON flows file
#[derive(Debug, Clone)]
pub struct FlowsFileHost {
    path: PathBuf,
}

impl FlowsFileHost {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HostRuntime for FlowsFileHost {
    fn load_flows(&self, flows: &MonolithDocument) -> Result<(), ApiError> {
        let json = serde_json::to_string_pretty(flows).map_err(|e| ApiError::Codec {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&self.path, json)
            .map_err(|e| crate::error::StorageError::io(&self.path, e))?;
        info!(path = %self.path.display(), nodes = flows.len(), "Wrote flows file");
        Ok(())
    }
}

/// Read a flows file; a missing or blank file is an empty document
pub fn read_flows_file(path: &Path) -> Result<MonolithDocument, ApiError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = std::fs::read_to_string(path).map_err(|e| crate::error::StorageError::io(path, e))?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str::<Vec<NodeRecord>>(&text).map_err(|e| ApiError::Codec {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
