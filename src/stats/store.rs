//! `SQLite` interview history store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDateTime};
use rusqlite::{params, Connection, Row};
use tokio::sync::Mutex;

use super::error::StatsError;
use super::schema::{SCHEMA, TIMESTAMP_FORMAT};
use super::types::{pass_rate, round1, HourCount, InterviewRecord, QueueSample, RecordKind, Statistics};
use crate::analytics::StatsRecorder;
use crate::detect::Outcome;

const MAX_NAME_CHARS: usize = 100;
const MAX_MESSAGE_CHARS: usize = 500;

/// Returns the default path for the history database.
///
/// This is `~/.local/share/interview-notify/history.db` on Linux.
#[must_use]
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("interview-notify")
        .join("history.db")
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

fn timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Start of a window reaching `span` into the past. Spans beyond the
/// calendar range cover all history.
fn window_start(span: Duration) -> NaiveDateTime {
    now().checked_sub_signed(span).unwrap_or(NaiveDateTime::MIN)
}

fn to_sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn read_record(row: &Row<'_>) -> rusqlite::Result<InterviewRecord> {
    let kind: String = row.get(2)?;
    let kind = RecordKind::parse(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown event type: {kind}").into(),
        )
    })?;
    Ok(InterviewRecord {
        username: row.get(0)?,
        timestamp: row.get(1)?,
        kind,
        queue_length: row.get(3)?,
        channel: row.get(4)?,
        outcome_message: row.get(5)?,
    })
}

/// Persistent interview history.
///
/// Uses `SQLite` with blocking calls moved onto `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct InterviewStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl InterviewStore {
    /// Open a store at the specified path.
    ///
    /// Creates parent directories if they don't exist and initializes the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema cannot be applied.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StatsError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await.map_err(|source| {
                    StatsError::CreateDir {
                        path: parent.to_path_buf(),
                        source,
                    }
                })?;
            }
        }

        let path_clone = path.clone();
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection, StatsError> {
            let conn =
                Connection::open(&path_clone).map_err(|source| StatsError::DatabaseOpen {
                    path: path_clone,
                    source,
                })?;
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        })
        .await
        .map_err(|_| StatsError::TaskCancelled)??;

        tracing::debug!(path = %path.display(), "History database ready");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path),
        })
    }

    /// Open an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or the schema cannot be applied.
    pub async fn open_in_memory() -> Result<Self, StatsError> {
        let conn = tokio::task::spawn_blocking(|| -> Result<Connection, StatsError> {
            let conn = Connection::open_in_memory()?;
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        })
        .await
        .map_err(|_| StatsError::TaskCancelled)??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    /// Returns the path to the database, if opened from a file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn insert_interview(
        &self,
        username: &str,
        kind: RecordKind,
        queue_length: Option<u32>,
        channel: &str,
        message: Option<&str>,
        at: NaiveDateTime,
    ) -> Result<(), StatsError> {
        let username = truncate(username.trim(), MAX_NAME_CHARS);
        if username.is_empty() {
            tracing::warn!(kind = kind.as_str(), "Ignoring interview record without username");
            return Ok(());
        }
        let channel = (!channel.is_empty()).then(|| truncate(channel, MAX_NAME_CHARS));
        let message = message.map(|m| truncate(m, MAX_MESSAGE_CHARS));
        let timestamp = timestamp(at);

        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StatsError> {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT INTO interviews (username, timestamp, event_type, queue_length, channel, outcome_message)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![username, timestamp, kind.as_str(), queue_length, channel, message],
            )?;
            Ok(())
        })
        .await
        .map_err(|_| StatsError::TaskCancelled)?
    }

    async fn insert_snapshot(
        &self,
        queue_length: u32,
        channel: &str,
        at: NaiveDateTime,
    ) -> Result<(), StatsError> {
        let channel = (!channel.is_empty()).then(|| truncate(channel, MAX_NAME_CHARS));
        let timestamp = timestamp(at);

        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StatsError> {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT INTO queue_snapshots (timestamp, queue_length, channel) VALUES (?1, ?2, ?3)",
                params![timestamp, queue_length, channel],
            )?;
            Ok(())
        })
        .await
        .map_err(|_| StatsError::TaskCancelled)?
    }

    /// Aggregate statistics for the past `days`, optionally for one channel.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub async fn statistics(
        &self,
        days: u32,
        channel: Option<&str>,
    ) -> Result<Statistics, StatsError> {
        let since = timestamp(window_start(Duration::days(i64::from(days))));
        let channel = channel.map(str::to_string);

        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<Statistics, StatsError> {
            let conn = conn.blocking_lock();
            // ?2 IS NULL disables the channel filter.
            let total_interviews: i64 = conn.query_row(
                "SELECT COUNT(*) FROM interviews
                 WHERE event_type = 'started' AND timestamp >= ?1 AND (?2 IS NULL OR channel = ?2)",
                params![since, channel],
                |row| row.get(0),
            )?;

            let mut passed = 0;
            let mut failed = 0;
            let mut missed = 0;
            let mut stmt = conn.prepare(
                "SELECT event_type, COUNT(*) FROM interviews
                 WHERE event_type IN ('passed', 'failed', 'missed')
                 AND timestamp >= ?1 AND (?2 IS NULL OR channel = ?2)
                 GROUP BY event_type",
            )?;
            let rows = stmt.query_map(params![since, channel], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                let (kind, count) = row?;
                match RecordKind::parse(&kind) {
                    Some(RecordKind::Passed) => passed = count.unsigned_abs(),
                    Some(RecordKind::Failed) => failed = count.unsigned_abs(),
                    Some(RecordKind::Missed) => missed = count.unsigned_abs(),
                    _ => {}
                }
            }

            let avg_queue: Option<f64> = conn.query_row(
                "SELECT AVG(queue_length) FROM interviews
                 WHERE queue_length IS NOT NULL AND timestamp >= ?1 AND (?2 IS NULL OR channel = ?2)",
                params![since, channel],
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(
                "SELECT CAST(strftime('%H', timestamp) AS INTEGER) AS hour, COUNT(*) AS count
                 FROM interviews
                 WHERE event_type = 'started' AND timestamp >= ?1 AND (?2 IS NULL OR channel = ?2)
                 GROUP BY hour
                 ORDER BY count DESC, hour ASC
                 LIMIT 5",
            )?;
            let busiest_hours = stmt
                .query_map(params![since, channel], |row| {
                    Ok(HourCount {
                        hour: row.get(0)?,
                        count: row.get::<_, i64>(1)?.unsigned_abs(),
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Statistics {
                total_interviews: total_interviews.unsigned_abs(),
                passed,
                failed,
                missed,
                avg_queue_length: round1(avg_queue.unwrap_or(0.0)),
                busiest_hours,
                pass_rate: pass_rate(passed, passed + failed + missed),
            })
        })
        .await
        .map_err(|_| StatsError::TaskCancelled)?
    }

    /// Most recent interview rows, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn recent_interviews(
        &self,
        limit: usize,
        channel: Option<&str>,
    ) -> Result<Vec<InterviewRecord>, StatsError> {
        let channel = channel.map(str::to_string);

        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<InterviewRecord>, StatsError> {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(
                "SELECT username, timestamp, event_type, queue_length, channel, outcome_message
                 FROM interviews
                 WHERE (?1 IS NULL OR channel = ?1)
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?2",
            )?;
            let records = stmt
                .query_map(params![channel, to_sql_limit(limit)], read_record)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(records)
        })
        .await
        .map_err(|_| StatsError::TaskCancelled)?
    }

    /// Interview history for one user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn user_history(
        &self,
        username: &str,
        limit: usize,
    ) -> Result<Vec<InterviewRecord>, StatsError> {
        let username = username.to_string();

        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<InterviewRecord>, StatsError> {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(
                "SELECT username, timestamp, event_type, queue_length, channel, outcome_message
                 FROM interviews
                 WHERE username = ?1
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?2",
            )?;
            let records = stmt
                .query_map(params![username, to_sql_limit(limit)], read_record)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(records)
        })
        .await
        .map_err(|_| StatsError::TaskCancelled)?
    }

    /// Queue snapshots from the past `hours`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn queue_trends(
        &self,
        hours: u32,
        channel: Option<&str>,
    ) -> Result<Vec<QueueSample>, StatsError> {
        let since = timestamp(window_start(Duration::hours(i64::from(hours))));
        let channel = channel.map(str::to_string);

        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<QueueSample>, StatsError> {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(
                "SELECT timestamp, queue_length FROM queue_snapshots
                 WHERE timestamp >= ?1 AND (?2 IS NULL OR channel = ?2)
                 ORDER BY timestamp ASC, id ASC",
            )?;
            let samples = stmt
                .query_map(params![since, channel], |row| {
                    Ok(QueueSample {
                        timestamp: row.get(0)?,
                        queue_length: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(samples)
        })
        .await
        .map_err(|_| StatsError::TaskCancelled)?
    }

    /// Delete rows older than `days` from both tables.
    ///
    /// Returns the number of deleted rows.
    ///
    /// # Errors
    ///
    /// Returns an error if a delete fails.
    pub async fn clear_old_data(&self, days: u32) -> Result<u64, StatsError> {
        let cutoff = timestamp(window_start(Duration::days(i64::from(days))));

        let conn = self.conn.clone();
        let (interviews, snapshots) =
            tokio::task::spawn_blocking(move || -> Result<(usize, usize), StatsError> {
                let conn = conn.blocking_lock();
                let interviews =
                    conn.execute("DELETE FROM interviews WHERE timestamp < ?1", params![cutoff])?;
                let snapshots = conn.execute(
                    "DELETE FROM queue_snapshots WHERE timestamp < ?1",
                    params![cutoff],
                )?;
                Ok((interviews, snapshots))
            })
            .await
            .map_err(|_| StatsError::TaskCancelled)??;

        tracing::info!(interviews, snapshots, "Cleared old history records");
        Ok(u64::try_from(interviews + snapshots).unwrap_or(u64::MAX))
    }
}

#[async_trait]
impl StatsRecorder for InterviewStore {
    async fn record_start(
        &self,
        username: &str,
        queue_length: u32,
        channel: &str,
    ) -> Result<(), StatsError> {
        self.insert_interview(
            username,
            RecordKind::Started,
            Some(queue_length),
            channel,
            None,
            now(),
        )
        .await
    }

    async fn record_outcome(
        &self,
        username: &str,
        outcome: Outcome,
        message: &str,
        channel: &str,
    ) -> Result<(), StatsError> {
        let message = (!message.is_empty()).then_some(message);
        self.insert_interview(username, outcome.into(), None, channel, message, now())
            .await
    }

    async fn record_snapshot(&self, queue_length: u32, channel: &str) -> Result<(), StatsError> {
        self.insert_snapshot(queue_length, channel, now()).await
    }
}
