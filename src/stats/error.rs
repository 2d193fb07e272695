//! Statistics store error types.

use std::path::PathBuf;

/// Errors from the interview statistics store.
#[derive(thiserror::Error, Debug)]
pub enum StatsError {
    /// Failed to open or create database.
    #[error("Failed to open interview database at {path}: {source}")]
    DatabaseOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A statement against the interview tables failed.
    #[error("Interview query failed: {0}")]
    Query(#[from] rusqlite::Error),

    /// The blocking database task panicked or was cancelled before replying.
    #[error("Database task ended before replying")]
    TaskCancelled,

    /// The database's parent directory could not be created.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
