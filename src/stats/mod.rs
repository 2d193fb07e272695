//! Interview history store.
//!
//! Records interview starts, outcomes and queue snapshots in `SQLite` and
//! answers the aggregate queries behind the `stats` command.

mod error;
mod schema;
mod store;
mod types;

pub use error::StatsError;
pub use schema::{SCHEMA, TIMESTAMP_FORMAT};
pub use store::{default_database_path, InterviewStore};
pub use types::{HourCount, InterviewRecord, QueueSample, RecordKind, Statistics};
