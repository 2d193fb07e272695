//! Notification dispatch over ntfy.
//!
//! Detected events are mapped to a fixed title, tags and priority, rate
//! limited per category, posted through a [`Transport`] and recorded in an
//! optional [`NotificationLog`].

mod dispatcher;
mod error;
mod log;
mod rate_limit;
mod telemetry;
mod transport;

pub use dispatcher::{
    style, Destination, DispatchOutcome, Dispatcher, NotificationRequest, DEFAULT_SERVER,
};
pub use error::NotificationError;
pub use log::{format_record, NotificationLog};
pub use rate_limit::{RateLimiter, DEFAULT_RATE_LIMIT};
pub use telemetry::{
    anonymous_id, send_telemetry, spawn_telemetry, telemetry_request, TELEMETRY_TOPIC,
};
pub use transport::{topic_url, NotificationHeaders, NtfyTransport, Priority, Transport};
