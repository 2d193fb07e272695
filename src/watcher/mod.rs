//! Watcher module for chat log directories.
//!
//! Provides log discovery, line tailing and rotation handoff.

mod discovery;
mod error;
mod scanner;
mod tailer;

pub use discovery::{
    channel_for_log, find_latest_log, validate_log_dir, LogFile, GENERIC_DIR_NAMES,
    IGNORED_FILENAMES, UNKNOWN_CHANNEL,
};
pub use error::WatcherError;
pub use scanner::{LineHandler, LogSource, RotationScanner, DEFAULT_SCAN_INTERVAL};
pub use tailer::{LogTailer, TailCursor, DEFAULT_TAIL_INTERVAL};
