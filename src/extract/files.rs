//! Filesystem port used by the extraction engine and reconciler.

use crate::error::StorageError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[cfg(windows)]
const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
const LINE_ENDING: &str = "\n";

/// Convert `\n` line endings to the host convention before writing
pub fn to_host_line_endings(text: &str) -> String {
    if LINE_ENDING == "\n" {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\n', LINE_ENDING)
}

/// Undo [`to_host_line_endings`] after reading
pub fn from_host_line_endings(text: &str) -> String {
    if LINE_ENDING == "\n" {
        return text.to_string();
    }
    text.replace(LINE_ENDING, "\n")
}

/// One child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

impl DirEntry {
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

/// File operations the sync engine needs
pub trait FileAccess: Send + Sync {
    fn read_to_string(&self, path: &Path) -> Result<String, StorageError>;
    fn write(&self, path: &Path, contents: &str) -> Result<(), StorageError>;
    fn remove_file(&self, path: &Path) -> Result<(), StorageError>;
    fn remove_dir_all(&self, path: &Path) -> Result<(), StorageError>;
    fn create_dir_all(&self, path: &Path) -> Result<(), StorageError>;
    /// Immediate children only; a missing directory lists as empty
    fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>, StorageError>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
}

/// [`FileAccess`] backed by the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileAccess;

impl LocalFileAccess {
    pub fn new() -> Self {
        Self
    }
}

impl FileAccess for LocalFileAccess {
    fn read_to_string(&self, path: &Path) -> Result<String, StorageError> {
        std::fs::read_to_string(path).map_err(|e| StorageError::io(path, e))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), StorageError> {
        std::fs::write(path, contents).map_err(|e| StorageError::io(path, e))
    }

    fn remove_file(&self, path: &Path) -> Result<(), StorageError> {
        std::fs::remove_file(path).map_err(|e| StorageError::io(path, e))
    }

    fn remove_dir_all(&self, path: &Path) -> Result<(), StorageError> {
        std::fs::remove_dir_all(path).map_err(|e| StorageError::io(path, e))
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), StorageError> {
        std::fs::create_dir_all(path).map_err(|e| StorageError::io(path, e))
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>, StorageError> {
        if !path.is_dir() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                let err = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
                StorageError::io(path, err)
            })?;
            entries.push(DirEntry {
                path: entry.path().to_path_buf(),
                is_dir: entry.file_type().is_dir(),
            });
        }
        Ok(entries)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}
