//! Error types for scanning and aggregation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal errors that abort a run.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// The aggregation tree rejected a record.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Invariant violations raised while ingesting traversal records.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    /// The record's owning directory is not below the scan root.
    #[error("{} is not inside the scan root {}", path.display(), root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    /// The upward walk did not reach the root within the expected number of steps.
    #[error("parent walk for {} did not reach the root after {steps} steps", path.display())]
    UnterminatedWalk { path: PathBuf, steps: usize },

    /// More directories than node ids can address.
    #[error("too many directories to track {}", path.display())]
    TooManyNodes { path: PathBuf },
}

/// Kind of a per-entry traversal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Permission was denied.
    PermissionDenied,
    /// Entry vanished between listing and inspection.
    NotFound,
    /// Error reading a directory.
    ReadError,
    /// Error reading metadata.
    MetadataError,
    /// Symbolic link cycle.
    SymlinkLoop,
}

/// Non-fatal error attached to a single traversal entry.
///
/// These are counted on every aggregate above the entry instead of
/// aborting the scan.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{}: {message}", path.display())]
pub struct EntryError {
    /// Path where the error occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of error.
    pub kind: ErrorKind,
}

impl EntryError {
    /// Create a new entry error.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create an entry error from an I/O error, classifying by its kind.
    pub fn from_io(path: impl Into<PathBuf>, error: &std::io::Error, fallback: ErrorKind) -> Self {
        let kind = match error.kind() {
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            _ => fallback,
        };
        Self::new(path, error.to_string(), kind)
    }

    /// Create a permission denied error.
    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Permission denied: {}", path.display()),
            path,
            kind: ErrorKind::PermissionDenied,
        }
    }
}
