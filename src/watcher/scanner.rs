//! Rotation-aware directory scanner.
//!
//! Follows the newest log file in a directory and hands each line to a
//! [`LineHandler`], swapping tailers when the chat client rotates logs.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::discovery::{channel_for_log, find_latest_log, validate_log_dir, LogFile};
use super::error::WatcherError;
use super::tailer::{LogTailer, TailCursor, DEFAULT_TAIL_INTERVAL};

/// Default delay between directory scans.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_millis(500);

/// The log file a tail unit is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSource {
    /// Path of the tailed file.
    pub path: PathBuf,
    /// Channel identifier derived once for this file.
    pub channel: String,
}

impl LogSource {
    /// Build a source for a log path, deriving its channel.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        let channel = channel_for_log(&path);
        Self { path, channel }
    }
}

/// Consumer of tailed lines.
#[async_trait]
pub trait LineHandler: Send + Sync {
    /// Handle one complete line from `source`.
    async fn handle_line(&self, line: &str, source: &LogSource);
}

/// A running tailer task bound to one file.
struct TailUnit {
    source: Arc<LogSource>,
    cancel: CancellationToken,
    handle: JoinHandle<(TailCursor, Result<(), WatcherError>)>,
}

/// Where a new tail unit starts reading.
#[derive(Debug, Clone, Copy)]
enum StartAt {
    /// Replay the last complete line, then follow.
    Replay,
    /// Only lines appended from now on.
    End,
    /// Continue where a previous unit on the same file stopped.
    Cursor(TailCursor),
}

impl TailUnit {
    fn spawn(
        source: LogSource,
        start: StartAt,
        handler: Arc<dyn LineHandler>,
        tail_interval: Duration,
        parent: &CancellationToken,
    ) -> Self {
        let cancel = parent.child_token();
        let path = source.path.clone();
        let tailer = match start {
            StartAt::Replay => LogTailer::new(path, cancel.clone()),
            StartAt::End => LogTailer::from_end(path, cancel.clone()),
            StartAt::Cursor(cursor) => LogTailer::resume(path, cancel.clone(), cursor),
        }
        .with_poll_interval(tail_interval);

        tracing::info!(
            path = %source.path.display(),
            channel = %source.channel,
            ?start,
            "Tailing log"
        );

        let source = Arc::new(source);
        let task_source = Arc::clone(&source);
        let handle = tokio::spawn(async move { run_unit(tailer, &task_source, handler).await });

        Self {
            source,
            cancel,
            handle,
        }
    }

    fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel the unit and wait until it has fully terminated.
    ///
    /// Returns the cursor it stopped at, unless the task was aborted.
    async fn stop(self) -> Option<TailCursor> {
        self.cancel.cancel();
        match self.handle.await {
            Ok((cursor, Ok(()))) => {
                tracing::debug!(path = %self.source.path.display(), "Tail unit stopped");
                Some(cursor)
            }
            Ok((cursor, Err(e))) => {
                tracing::warn!(
                    path = %self.source.path.display(),
                    offset = cursor.offset,
                    error = %e,
                    "Tail unit ended with error"
                );
                Some(cursor)
            }
            Err(e) => {
                tracing::error!(
                    path = %self.source.path.display(),
                    error = %WatcherError::TaskFailed(e),
                    "Tail unit aborted"
                );
                None
            }
        }
    }
}

async fn run_unit(
    mut tailer: LogTailer,
    source: &LogSource,
    handler: Arc<dyn LineHandler>,
) -> (TailCursor, Result<(), WatcherError>) {
    while let Some(item) = tailer.next_line().await {
        let line = match item {
            Ok(line) => line,
            Err(e) => return (*tailer.cursor(), Err(e)),
        };
        tracing::trace!(channel = %source.channel, line = %line, "Line");
        handler.handle_line(&line, source).await;
    }
    (*tailer.cursor(), Ok(()))
}

/// Watches one directory and keeps exactly one tail unit on its newest file.
pub struct RotationScanner {
    dir: PathBuf,
    handler: Arc<dyn LineHandler>,
    scan_interval: Duration,
    tail_interval: Duration,
}

impl RotationScanner {
    /// Create a scanner for `dir` feeding lines to `handler`.
    #[must_use]
    pub fn new(dir: PathBuf, handler: Arc<dyn LineHandler>) -> Self {
        Self {
            dir,
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

    /// Get the watched directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// A newer file stops and joins the running unit before a new one is
    /// started, so lines are never attributed to the wrong channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory is invalid or holds no log files.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), WatcherError> {
        validate_log_dir(&self.dir)?;
        tracing::info!(dir = %self.dir.display(), "Watching logs");

        let mut active = find_latest_log(&self.dir)?;
        let mut unit = self.spawn_unit(&active, StartAt::Replay, &shutdown);

        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    unit.stop().await;
                    tracing::info!(dir = %self.dir.display(), "Scanner stopped");
                    return Ok(());
                }
                () = tokio::time::sleep(self.scan_interval) => {}
            }

            let latest = match find_latest_log(&self.dir) {
                Ok(latest) => latest,
                Err(e) if e.is_fatal() => {
                    unit.stop().await;
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(dir = %self.dir.display(), error = %e, "Directory scan failed");
                    continue;
                }
            };

            if latest.path != active.path {
                tracing::info!(
                    dir = %self.dir.display(),
                    old = %active.path.display(),
                    new = %latest.path.display(),
                    "Newer log found"
                );
                unit.stop().await;
                active = latest;
                unit = self.spawn_unit(&active, StartAt::Replay, &shutdown);
            } else if unit.is_finished() {
                // Same file, but its tailer gave up. Pick up where it stopped.
                let start = unit.stop().await.map_or(StartAt::End, StartAt::Cursor);
                active = latest;
                unit = self.spawn_unit(&active, start, &shutdown);
            }
        }
    }

    fn spawn_unit(&self, log: &LogFile, start: StartAt, shutdown: &CancellationToken) -> TailUnit {
        TailUnit::spawn(
            LogSource::new(log.path.clone()),
            start,
            Arc::clone(&self.handler),
            self.tail_interval,
            shutdown,
        )
    }
}
