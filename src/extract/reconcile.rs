//! Orphan Reconciler
//!
//! Removes artifacts whose owner no longer exists: side files of nodes that
//! dropped out of a manifest, extraction directories of deleted entities and
//! entity files left behind by a rename. Every operation is idempotent and a
//! failed delete is logged and skipped.

use super::files::FileAccess;
use super::manifest::{Manifest, MANAGED_EXTENSIONS, MANIFEST_FILE};
use crate::error::StorageError;
use crate::flow::manager::scan_entity_files;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct OrphanReconciler<'a> {
    files: &'a dyn FileAccess,
}

impl<'a> OrphanReconciler<'a> {
    pub fn new(files: &'a dyn FileAccess) -> Self {
        Self { files }
    }

    /// Delete managed files in `directory` that `manifest` does not account for.
    ///
    /// Matching is exact on the full filename.
    pub fn collect_garbage(
        &self,
        directory: &Path,
        manifest: &Manifest,
    ) -> Result<Vec<PathBuf>, StorageError> {
        let expected = manifest.expected_files();
        let mut removed = Vec::new();
        for entry in self.files.list_dir(directory)? {
            if entry.is_dir {
                continue;
            }
            let Some(name) = entry.file_name() else {
                continue;
            };
            if name == MANIFEST_FILE
                || !MANAGED_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
                || expected.contains(name)
            {
                continue;
            }
            if self.remove_file(&entry.path) {
                removed.push(entry.path);
            }
        }
        Ok(removed)
    }

    /// Delete subdirectories of `category_root` not named after a live entity
    pub fn remove_orphan_dirs(
        &self,
        category_root: &Path,
        live_basenames: &HashSet<String>,
    ) -> Result<Vec<PathBuf>, StorageError> {
        let mut removed = Vec::new();
        for entry in self.files.list_dir(category_root)? {
            if !entry.is_dir {
                continue;
            }
            if entry.file_name().is_some_and(|n| live_basenames.contains(n)) {
                continue;
            }
            if self.remove_dir(&entry.path) {
                removed.push(entry.path);
            }
        }
        Ok(removed)
    }

    /// Delete entity files (and their extraction directories) whose entity
    /// will now be written under a different basename.
    ///
    /// `planned` maps entity id to the basename it is about to be written as;
    /// `extension` is the entity-file extension of this pass.
    pub fn remove_renamed_entities(
        &self,
        category_root: &Path,
        planned: &HashMap<String, String>,
        extension: &str,
    ) -> Result<Vec<PathBuf>, StorageError> {
        let mut removed = Vec::new();
        for file in scan_entity_files(self.files, category_root)? {
            let Some(new_stem) = file.entity_id.as_ref().and_then(|id| planned.get(id)) else {
                continue;
            };
            let same_ext = file
                .path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == extension);
            if *new_stem == file.stem && same_ext {
                continue;
            }
            if self.remove_file(&file.path) {
                removed.push(file.path.clone());
            }
            // Only the stem names the directory; a format switch keeps it.
            if *new_stem != file.stem {
                let old_dir = category_root.join(&file.stem);
                if self.files.is_dir(&old_dir) && self.remove_dir(&old_dir) {
                    removed.push(old_dir);
                }
            }
        }
        Ok(removed)
    }

    /// Remove `directory` if nothing is left in it
    pub fn remove_if_empty(&self, directory: &Path) -> Result<bool, StorageError> {
        if !self.files.is_dir(directory) || !self.files.list_dir(directory)?.is_empty() {
            return Ok(false);
        }
        self.files.remove_dir_all(directory)?;
        Ok(true)
    }

    fn remove_file(&self, path: &Path) -> bool {
        match self.files.remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), "Removed orphaned file");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to remove orphaned file");
                false
            }
        }
    }

    fn remove_dir(&self, path: &Path) -> bool {
        match self.files.remove_dir_all(path) {
            Ok(()) => {
                debug!(path = %path.display(), "Removed orphaned directory");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to remove orphaned directory");
                false
            }
        }
    }
}
