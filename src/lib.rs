//! interview-notify - push notifications for IRC interview queues.
//!
//! Tails IRC client logs, detects interview events and sends rate-limited
//! ntfy notifications, with optional `SQLite` interview statistics.

pub mod analytics;
pub mod config;
pub mod detect;
pub mod display;
pub mod monitor;
pub mod notification;
pub mod stats;
pub mod watcher;
