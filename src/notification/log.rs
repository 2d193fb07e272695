//! Append-only text log of accepted notifications.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::error::NotificationError;
use super::transport::Priority;
use crate::detect::Category;

/// Format one log record.
///
/// ```
/// use chrono::{Local, TimeZone};
/// use interview_notify::detect::Category;
/// use interview_notify::notification::{format_record, Priority};
///
/// let at = Local.with_ymd_and_hms(2024, 3, 1, 9, 5, 0).unwrap();
/// let record = format_record(at, Category::Kick, Priority::Max, "Kicked", " line \n");
/// assert_eq!(
///     record,
///     "[2024-03-01 09:05:00] type=kick priority=5 title=Kicked\n  message: line\n"
/// );
/// ```
#[must_use]
pub fn format_record(
    at: DateTime<Local>,
    category: Category,
    priority: Priority,
    title: &str,
    body: &str,
) -> String {
    format!(
        "[{}] type={} priority={} title={}\n  message: {}\n",
        at.format("%Y-%m-%d %H:%M:%S"),
        category,
        priority,
        title,
        body.trim()
    )
}

/// Notification log file.
///
/// The file is opened, appended and closed on every write. Writes are
/// serialised so records never interleave.
#[derive(Debug)]
pub struct NotificationLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl NotificationLog {
    /// Create a log writing to `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Get the log path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record stamped with the current local time.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or written.
    pub async fn append(
        &self,
        category: Category,
        priority: Priority,
        title: &str,
        body: &str,
    ) -> Result<(), NotificationError> {
        let record = format_record(Local::now(), category, priority, title, body);

        let _guard = self.lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(record.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
