//! Error types
//!
//! Storage errors cover single-file I/O and are recovered from per item.
//! Manifest errors mean "treat as never extracted". API errors are fatal to
//! the pass that raised them.

use std::path::PathBuf;
use thiserror::Error;

/// Filesystem errors scoped to a single path
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path is not valid UTF-8: {0:?}")]
    InvalidPath(PathBuf),
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Manifest read failures
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Malformed manifest {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors surfaced by passes, the reload endpoint and the CLI
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    StorageError(#[from] StorageError),

    #[error(transparent)]
    ManifestError(#[from] ManifestError),

    #[error("Codec error in {path}: {message}")]
    Codec { path: PathBuf, message: String },

    #[error("Flow-set manager failed: {0}")]
    Collaborator(String),

    #[error("Host runtime rejected flows: {0}")]
    Host(String),

    #[error("Extraction directory {path} could not be created: {source}")]
    ExtractionDirectory {
        path: PathBuf,
        #[source]
        source: StorageError,
    },
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
