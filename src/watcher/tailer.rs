//! Incremental log file tailer.
//!
//! Streams complete lines from a chat log as they are appended, starting
//! from the end of the file.

use std::collections::VecDeque;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::sync::CancellationToken;

use super::error::WatcherError;

/// Default delay between polls for appended content.
pub const DEFAULT_TAIL_INTERVAL: Duration = Duration::from_millis(100);

/// Block size used when scanning backwards for the last line.
const BACKWARD_BLOCK_SIZE: u64 = 4096;

/// Read position of a tailer within its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailCursor {
    /// Number of bytes consumed from the file.
    pub offset: u64,
    /// Replay the last complete line on startup. Cleared once used.
    pub replay_last_line: bool,
}

/// Polling tailer that yields each appended line exactly once.
///
/// On startup the most recent complete line is yielded (when replay is
/// enabled) so callers can seed state without reading the whole file.
/// Afterwards only lines completed after startup are yielded.
#[derive(Debug)]
pub struct LogTailer {
    path: PathBuf,
    cursor: TailCursor,
    started: bool,
    finished: bool,
    /// Bytes of a line that has not been newline-terminated yet.
    pending: Vec<u8>,
    ready: VecDeque<String>,
    poll_interval: Duration,
    cancel: CancellationToken,
}

impl LogTailer {
    /// Create a tailer that replays the last complete line first.
    #[must_use]
    pub fn new(path: PathBuf, cancel: CancellationToken) -> Self {
        Self::with_cursor(
            path,
            cancel,
            TailCursor {
                offset: 0,
                replay_last_line: true,
            },
        )
    }

    /// Create a tailer that only yields lines appended after startup.
    #[must_use]
    pub fn from_end(path: PathBuf, cancel: CancellationToken) -> Self {
        Self::with_cursor(
            path,
            cancel,
            TailCursor {
                offset: 0,
                replay_last_line: false,
            },
        )
    }

    /// Create a tailer that continues from a cursor left by an earlier tailer.
    ///
    /// Nothing is replayed. Lines completed after `cursor.offset` are yielded,
    /// and a file shorter than the offset is read from the start.
    #[must_use]
    pub fn resume(path: PathBuf, cancel: CancellationToken, cursor: TailCursor) -> Self {
        let mut tailer = Self::with_cursor(
            path,
            cancel,
            TailCursor {
                offset: cursor.offset,
                replay_last_line: false,
            },
        );
        tailer.started = true;
        tailer
    }

    fn with_cursor(path: PathBuf, cancel: CancellationToken, cursor: TailCursor) -> Self {
        Self {
            path,
            cursor,
            started: false,
            finished: false,
            pending: Vec::new(),
            ready: VecDeque::new(),
            poll_interval: DEFAULT_TAIL_INTERVAL,
            cancel,
        }
    }

    /// Set the delay between polls for appended content.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Get the path being tailed.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the current cursor.
    #[must_use]
    pub fn cursor(&self) -> &TailCursor {
        &self.cursor
    }

    /// Wait for the next complete line.
    ///
    /// Returns `None` once cancelled, and after an error has been yielded.
    /// Partial lines are never returned.
    pub async fn next_line(&mut self) -> Option<Result<String, WatcherError>> {
        if self.finished || self.cancel.is_cancelled() {
            self.finished = true;
            return None;
        }

        if !self.started {
            match self.start().await {
                Ok(Some(line)) => {
                    self.started = true;
                    return Some(Ok(line));
                }
                Ok(None) => self.started = true,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }

        loop {
            if self.cancel.is_cancelled() {
                self.finished = true;
                return None;
            }

            if let Some(line) = self.ready.pop_front() {
                return Some(Ok(line));
            }

            match self.read_appended().await {
                Ok(0) => {
                    tokio::select! {
                        () = self.cancel.cancelled() => {
                            self.finished = true;
                            return None;
                        }
                        () = tokio::time::sleep(self.poll_interval) => {}
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "Tail failed");
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }

    /// Convert the tailer into a stream of lines.
    pub fn into_stream(self) -> impl futures_core::Stream<Item = Result<String, WatcherError>> {
        futures_util::stream::unfold(self, |mut tailer| async move {
            tailer.next_line().await.map(|item| (item, tailer))
        })
    }

    /// Position the cursor after the last newline and pick up the replay line.
    async fn start(&mut self) -> Result<Option<String>, WatcherError> {
        let mut file = self.open().await?;
        let len = file.metadata().await?.len();
        let (offset, last_line) = locate_last_line(&mut file, len).await?;

        self.cursor.offset = offset;
        let replay = std::mem::replace(&mut self.cursor.replay_last_line, false);

        tracing::debug!(
            path = %self.path.display(),
            offset,
            replay,
            "Tailer started"
        );

        Ok(last_line.filter(|line| replay && !line.trim().is_empty()))
    }

    /// Read bytes appended since the last poll and split complete lines.
    ///
    /// Returns the number of new complete lines queued.
    async fn read_appended(&mut self) -> Result<usize, WatcherError> {
        let mut file = self.open().await?;
        let len = file.metadata().await?.len();

        if len < self.cursor.offset {
            tracing::warn!(
                path = %self.path.display(),
                old_offset = self.cursor.offset,
                new_len = len,
                "Log truncated, resetting offset to 0"
            );
            self.cursor.offset = 0;
            self.pending.clear();
        }

        if len == self.cursor.offset {
            return Ok(0);
        }

        file.seek(SeekFrom::Start(self.cursor.offset)).await?;
        let mut buf = Vec::new();
        let read = file.read_to_end(&mut buf).await?;
        self.cursor.offset += read as u64;
        self.pending.extend_from_slice(&buf);

        let mut queued = 0;
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = decode_line(&raw[..raw.len() - 1]);
            if line.trim().is_empty() {
                continue;
            }
            self.ready.push_back(line);
            queued += 1;
        }

        Ok(queued)
    }

    async fn open(&self) -> Result<File, WatcherError> {
        match File::open(&self.path).await {
            Ok(f) => Ok(f),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(WatcherError::FileDeleted(self.path.clone()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Err(WatcherError::PermissionDenied(self.path.clone()))
            }
            Err(e) => Err(WatcherError::Io(e)),
        }
    }
}

/// Scan backwards from `len` for the last newline-terminated line.
///
/// Returns the offset just past the last newline (0 if there is none) and
/// the content of the line it terminates.
async fn locate_last_line(
    file: &mut File,
    len: u64,
) -> Result<(u64, Option<String>), std::io::Error> {
    let mut tail: Vec<u8> = Vec::new();
    let mut start = len;

    loop {
        if let Some(last_nl) = tail.iter().rposition(|&b| b == b'\n') {
            let end_offset = start + last_nl as u64 + 1;
            if let Some(prev_nl) = tail[..last_nl].iter().rposition(|&b| b == b'\n') {
                return Ok((end_offset, Some(decode_line(&tail[prev_nl + 1..last_nl]))));
            }
            if start == 0 {
                return Ok((end_offset, Some(decode_line(&tail[..last_nl]))));
            }
        } else if start == 0 {
            return Ok((0, None));
        }

        let block = BACKWARD_BLOCK_SIZE.min(start);
        start -= block;
        file.seek(SeekFrom::Start(start)).await?;
        #[allow(clippy::cast_possible_truncation)]
        let mut chunk = vec![0; block as usize];
        file.read_exact(&mut chunk).await?;
        chunk.extend_from_slice(&tail);
        tail = chunk;
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let line = String::from_utf8_lossy(bytes);
    line.strip_suffix('\r').unwrap_or(&line).to_string()
}
