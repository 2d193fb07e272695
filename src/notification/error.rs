//! Notification error types.

use thiserror::Error;

/// Errors from delivering or recording a notification.
#[derive(Error, Debug)]
pub enum NotificationError {
    /// Request could not be sent or timed out.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("ntfy returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Server or topic does not form a valid URL.
    #[error("Invalid ntfy URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Header value could not be encoded.
    #[error("Invalid header {name}: {source}")]
    InvalidHeader {
        name: &'static str,
        #[source]
        source: reqwest::header::InvalidHeaderValue,
    },

    /// Writing the notification log failed.
    #[error("Failed to write notification log: {0}")]
    Log(#[from] std::io::Error),
}
