//! Watcher error types.

use std::path::PathBuf;

/// Errors that can occur while discovering or tailing log files.
#[derive(thiserror::Error, Debug)]
pub enum WatcherError {
    /// Configured log path does not exist.
    #[error("Log directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    /// Configured log path is a file, a directory was expected.
    #[error("Log path is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Log directory contains no candidate log files.
    #[error("No log files found in {0}")]
    NoLogFiles(PathBuf),

    /// Tailed file was deleted.
    #[error("Tailed file deleted: {0}")]
    FileDeleted(PathBuf),

    /// Permission denied accessing file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Tail task panicked or was aborted.
    #[error("Tail task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatcherError {
    /// Whether the error is a configuration problem rather than a transient one.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DirectoryNotFound(_) | Self::NotADirectory(_) | Self::NoLogFiles(_)
        )
    }
}
