//! Database schema for interview history.

/// SQL schema for the history database.
pub const SCHEMA: &str = r"
PRAGMA journal_mode = WAL;

-- One row per interview start or outcome
CREATE TABLE IF NOT EXISTS interviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    event_type TEXT NOT NULL,
    queue_length INTEGER,
    channel TEXT,
    outcome_message TEXT
);

CREATE TABLE IF NOT EXISTS queue_snapshots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    queue_length INTEGER NOT NULL,
    channel TEXT
);

CREATE INDEX IF NOT EXISTS idx_interviews_timestamp ON interviews(timestamp);
CREATE INDEX IF NOT EXISTS idx_interviews_username ON interviews(username);
CREATE INDEX IF NOT EXISTS idx_interviews_event_type ON interviews(event_type);
";

/// Timestamp format stored in both tables. Local time, sortable as text.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
