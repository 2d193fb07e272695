//! One rotation scanner per watched directory.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::watcher::{
    validate_log_dir, LineHandler, RotationScanner, WatcherError, DEFAULT_SCAN_INTERVAL,
    DEFAULT_TAIL_INTERVAL,
};

/// Error type for multi-directory monitoring.
#[derive(thiserror::Error, Debug)]
pub enum MonitorError {
    /// No directories were configured.
    #[error("No log directories configured")]
    NoDirectories,

    /// A configured directory is unusable.
    #[error("Invalid log directory: {0}")]
    InvalidDirectory(#[source] WatcherError),

    /// Every directory unit stopped with an error.
    #[error("All {0} log directories failed")]
    AllFailed(usize),
}

/// How one directory unit ended.
#[derive(Debug)]
pub struct DirectoryResult {
    pub dir: PathBuf,
    pub result: Result<(), WatcherError>,
}

/// Runs a [`RotationScanner`] per directory, isolated from each other.
pub struct Monitor {
    dirs: Vec<PathBuf>,
    handler: Arc<dyn LineHandler>,
    scan_interval: Duration,
    tail_interval: Duration,
}

impl Monitor {
    /// Create a monitor feeding every directory's lines to `handler`.
    #[must_use]
    pub fn new(dirs: Vec<PathBuf>, handler: Arc<dyn LineHandler>) -> Self {
        Self {
            dirs,
            handler,
            scan_interval: DEFAULT_SCAN_INTERVAL,
            tail_interval: DEFAULT_TAIL_INTERVAL,
        }
    }

    /// Override the directory scan and file poll intervals.
    #[must_use]
    pub fn with_intervals(mut self, scan_interval: Duration, tail_interval: Duration) -> Self {
        self.scan_interval = scan_interval;
        self.tail_interval = tail_interval;
        self
    }

    /// Get the watched directories.
    #[must_use]
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Check every directory exists and is a directory.
    ///
    /// # Errors
    ///
    /// Returns the first invalid directory.
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.dirs.is_empty() {
            return Err(MonitorError::NoDirectories);
        }
        for dir in &self.dirs {
            validate_log_dir(dir).map_err(MonitorError::InvalidDirectory)?;
        }
        Ok(())
    }

    /// Run all directory units until `shutdown` is cancelled or every unit
    /// has stopped.
    ///
    /// A unit that fails is logged and the others keep running.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories are invalid or every unit failed.
    pub async fn run(self, shutdown: CancellationToken) -> Result<Vec<DirectoryResult>, MonitorError> {
        self.validate()?;

        let mut join_set = JoinSet::new();
        for dir in &self.dirs {
            let scanner = RotationScanner::new(dir.clone(), Arc::clone(&self.handler))
                .with_intervals(self.scan_interval, self.tail_interval);
            let token = shutdown.child_token();
            let dir = dir.clone();
            join_set.spawn(async move {
                let result = scanner.run(token).await;
                DirectoryResult { dir, result }
            });
        }
        tracing::info!(count = self.dirs.len(), "Monitoring log directories");

        let mut results = Vec::with_capacity(self.dirs.len());
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(done) => {
                    match &done.result {
                        Ok(()) => tracing::info!(dir = %done.dir.display(), "Directory unit stopped"),
                        Err(e) => {
                            tracing::error!(dir = %done.dir.display(), error = %e, "Directory unit failed");
                        }
                    }
                    results.push(done);
                }
                Err(e) => {
                    tracing::error!(error = %WatcherError::TaskFailed(e), "Directory unit aborted");
                }
            }
        }

        let failed = self.dirs.len() - results.iter().filter(|r| r.result.is_ok()).count();
        if failed == self.dirs.len() && !shutdown.is_cancelled() {
            return Err(MonitorError::AllFailed(failed));
        }
        Ok(results)
    }
}
