//! Log file discovery utilities.
//!
//! Provides functions to validate watched directories, locate the log file
//! the chat client is currently writing to, and derive a channel name for it.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::error::WatcherError;

/// File names created by operating systems that are never chat logs.
pub const IGNORED_FILENAMES: &[&str] = &[".DS_Store", "thumbs.db"];

/// Directory names too generic to identify a channel.
pub const GENERIC_DIR_NAMES: &[&str] = &[".", "..", "logs", "Channels"];

/// Channel name used when nothing better can be derived.
pub const UNKNOWN_CHANNEL: &str = "unknown";

/// A log file together with the modification time it was selected by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    /// Path to the log file.
    pub path: PathBuf,
    /// Modification time observed during discovery.
    pub modified: SystemTime,
}

/// Check that a configured log path exists and is a directory.
///
/// # Errors
///
/// Returns `WatcherError::NotADirectory` if the path is a file and
/// `WatcherError::DirectoryNotFound` if it does not exist.
pub fn validate_log_dir(dir: &Path) -> Result<(), WatcherError> {
    if dir.is_file() {
        return Err(WatcherError::NotADirectory(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(WatcherError::DirectoryNotFound(dir.to_path_buf()));
    }
    Ok(())
}

/// Find the most recently modified log file in a directory.
///
/// Considers regular files only and skips [`IGNORED_FILENAMES`].
///
/// # Errors
///
/// Returns `WatcherError::NoLogFiles` if the directory holds no candidate
/// files, `WatcherError::DirectoryNotFound` if it vanished, or
/// `WatcherError::Io` if it cannot be read.
pub fn find_latest_log(dir: &Path) -> Result<LogFile, WatcherError> {
    let entries = std::fs::read_dir(dir).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => WatcherError::DirectoryNotFound(dir.to_path_buf()),
        _ => WatcherError::Io(e),
    })?;

    entries
        .filter_map(Result::ok)
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .map_or(true, |name| !IGNORED_FILENAMES.contains(&name))
        })
        .filter_map(|entry| {
            let path = entry.path();
            // Follow symlinks, a linked log is still a log.
            let metadata = std::fs::metadata(&path).ok()?;
            if !metadata.is_file() {
                return None;
            }
            let modified = metadata.modified().ok()?;
            Some(LogFile { path, modified })
        })
        .max_by_key(|log| log.modified)
        .ok_or_else(|| WatcherError::NoLogFiles(dir.to_path_buf()))
}

/// Derive the channel identifier for a log file.
///
/// Prefers the name of the parent directory. Generic names such as `logs`
/// fall back to the file name without extension, and `"unknown"` is used
/// when neither is available.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use interview_notify::watcher::channel_for_log;
///
/// assert_eq!(channel_for_log(Path::new("/irc/#red-invites/2024-05-01.log")), "#red-invites");
/// assert_eq!(channel_for_log(Path::new("/irc/logs/#red-invites.log")), "#red-invites");
/// ```
#[must_use]
pub fn channel_for_log(log_path: &Path) -> String {
    let parent = log_path
        .parent()
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .unwrap_or_default();

    if !parent.is_empty() && !GENERIC_DIR_NAMES.contains(&parent) {
        return parent.to_string();
    }

    log_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map_or_else(|| UNKNOWN_CHANNEL.to_string(), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_validate_log_dir_ok() {
        let temp_dir = TempDir::new().unwrap();
        assert!(validate_log_dir(temp_dir.path()).is_ok());
    }

    #[test]
    fn test_validate_log_dir_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("chat.log");
        std::fs::write(&file, "hello\n").unwrap();

        let result = validate_log_dir(&file);
        assert!(matches!(result, Err(WatcherError::NotADirectory(_))));
    }

    #[test]
    fn test_validate_log_dir_missing() {
        let result = validate_log_dir(Path::new("/tmp/nonexistent-irc-logs-12345"));
        assert!(matches!(result, Err(WatcherError::DirectoryNotFound(_))));
    }

    #[test]
    fn test_find_latest_log_empty_dir() {
        let temp_dir = TempDir::new().unwrap();
        let result = find_latest_log(temp_dir.path());
        assert!(matches!(result, Err(WatcherError::NoLogFiles(_))));
    }

    #[test]
    fn test_find_latest_log_ignores_os_artifacts() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(".DS_Store"), "x").unwrap();
        std::fs::write(temp_dir.path().join("thumbs.db"), "x").unwrap();

        let result = find_latest_log(temp_dir.path());
        assert!(matches!(result, Err(WatcherError::NoLogFiles(_))));
    }

    #[test]
    fn test_find_latest_log_skips_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("archive")).unwrap();
        let log = temp_dir.path().join("current.log");
        std::fs::write(&log, "line\n").unwrap();

        let result = find_latest_log(temp_dir.path()).unwrap();
        assert_eq!(result.path, log);
    }

    #[test]
    fn test_find_latest_log_multiple_files() {
        let temp_dir = TempDir::new().unwrap();

        let old_path = temp_dir.path().join("2024-01-01.log");
        std::fs::write(&old_path, "old\n").unwrap();

        // Wait a bit to ensure different mtime
        std::thread::sleep(std::time::Duration::from_millis(20));

        let new_path = temp_dir.path().join("2024-01-02.log");
        {
            let mut file = std::fs::File::create(&new_path).unwrap();
            writeln!(file, "new").unwrap();
        }

        let result = find_latest_log(temp_dir.path()).unwrap();
        assert_eq!(result.path, new_path);
    }

    #[test]
    fn test_find_latest_log_missing_dir() {
        let result = find_latest_log(Path::new("/tmp/nonexistent-irc-logs-67890"));
        assert!(matches!(result, Err(WatcherError::DirectoryNotFound(_))));
    }

    #[test]
    fn test_channel_from_parent_dir() {
        let path = Path::new("/home/user/irclogs/#red-interview/2024-05-01.log");
        assert_eq!(channel_for_log(path), "#red-interview");
    }

    #[test]
    fn test_channel_generic_parent_falls_back_to_stem() {
        assert_eq!(channel_for_log(Path::new("/var/logs/#red.log")), "#red");
        assert_eq!(channel_for_log(Path::new("/data/Channels/#ops.txt")), "#ops");
    }

    #[test]
    fn test_channel_no_parent_uses_stem() {
        assert_eq!(channel_for_log(Path::new("#red.log")), "#red");
    }

    #[test]
    fn test_channel_unknown() {
        assert_eq!(channel_for_log(Path::new("/")), UNKNOWN_CHANNEL);
        assert_eq!(channel_for_log(Path::new("")), UNKNOWN_CHANNEL);
    }
}
