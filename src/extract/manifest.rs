//! Manifest Store
//!
//! The sidecar `.manifest.json` maps node ids to the side files written for
//! them in the last extraction pass. Restoration resolves files through it
//! and never from current node names.

use super::files::FileAccess;
use crate::error::{ManifestError, StorageError};
use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = ".manifest.json";

pub const SCRIPT_EXT: &str = ".js";
pub const MARKUP_EXT: &str = ".vue";
pub const INITIALIZE_SUFFIX: &str = ".initialize.js";
pub const FINALIZE_SUFFIX: &str = ".finalize.js";
pub const INFO_SUFFIX: &str = ".info.md";

/// Every name an entry's `fileName` can expand to on disk
pub const SIDE_FILE_SUFFIXES: [&str; 5] = [
    SCRIPT_EXT,
    MARKUP_EXT,
    INITIALIZE_SUFFIX,
    FINALIZE_SUFFIX,
    INFO_SUFFIX,
];

/// Extensions the reconciler considers as extracted artifacts
pub const MANAGED_EXTENSIONS: [&str; 3] = [".vue", ".js", ".md"];

/// What one extraction pass wrote for one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub node_id: NodeId,
    #[serde(default)]
    pub name: Option<String>,
    pub sanitized_name: String,
    pub file_name: String,
    #[serde(default)]
    pub is_markup: bool,
    #[serde(default)]
    pub is_script: bool,
    #[serde(default)]
    pub has_code: bool,
    #[serde(default)]
    pub has_initialize: bool,
    #[serde(default)]
    pub has_finalize: bool,
    #[serde(default)]
    pub has_info: bool,
}

impl ManifestEntry {
    pub fn code_file(&self) -> String {
        let ext = if self.is_markup { MARKUP_EXT } else { SCRIPT_EXT };
        format!("{}{}", self.file_name, ext)
    }

    pub fn initialize_file(&self) -> String {
        format!("{}{}", self.file_name, INITIALIZE_SUFFIX)
    }

    pub fn finalize_file(&self) -> String {
        format!("{}{}", self.file_name, FINALIZE_SUFFIX)
    }

    pub fn info_file(&self) -> String {
        format!("{}{}", self.file_name, INFO_SUFFIX)
    }

    /// Side files this entry vouches for
    pub fn expected_files(&self) -> Vec<String> {
        let mut files = Vec::with_capacity(4);
        if self.has_code {
            files.push(self.code_file());
        }
        if self.has_initialize {
            files.push(self.initialize_file());
        }
        if self.has_finalize {
            files.push(self.finalize_file());
        }
        if self.has_info {
            files.push(self.info_file());
        }
        files
    }
}

/// Node id → entry, ordered so that rewrites of an unchanged entity are byte-identical
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    pub entries: BTreeMap<NodeId, ManifestEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: ManifestEntry) {
        self.entries.insert(entry.node_id.clone(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.values()
    }

    /// Exact filenames every entry claims; anything else in the directory is an orphan
    pub fn expected_files(&self) -> HashSet<String> {
        self.iter().flat_map(ManifestEntry::expected_files).collect()
    }
}

pub fn manifest_path(directory: &Path) -> PathBuf {
    directory.join(MANIFEST_FILE)
}

/// Reads and writes manifests through a [`FileAccess`]
pub struct ManifestStore<'a> {
    files: &'a dyn FileAccess,
}

impl<'a> ManifestStore<'a> {
    pub fn new(files: &'a dyn FileAccess) -> Self {
        Self { files }
    }

    /// Full overwrite, pretty-printed
    pub fn write(&self, directory: &Path, manifest: &Manifest) -> Result<(), StorageError> {
        let path = manifest_path(directory);
        let json = serde_json::to_string_pretty(manifest)
            .map_err(|e| StorageError::io(&path, std::io::Error::other(e)))?;
        self.files.write(&path, &json)
    }

    /// `Ok(None)` when the directory was never extracted
    pub fn read(&self, directory: &Path) -> Result<Option<Manifest>, ManifestError> {
        let path = manifest_path(directory);
        if !self.files.exists(&path) {
            return Ok(None);
        }
        let content = self.files.read_to_string(&path)?;
        let manifest = serde_json::from_str(&content)
            .map_err(|source| ManifestError::Malformed { path, source })?;
        Ok(Some(manifest))
    }

    pub fn remove(&self, directory: &Path) -> Result<bool, StorageError> {
        let path = manifest_path(directory);
        if !self.files.exists(&path) {
            return Ok(false);
        }
        self.files.remove_file(&path)?;
        Ok(true)
    }
}
