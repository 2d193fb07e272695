//! Push transport for notifications.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::Client;
use url::Url;

use super::error::NotificationError;

/// Connection timeout for ntfy requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall request timeout for ntfy requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// ntfy message priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    Min = 1,
    Low = 2,
    #[default]
    Default = 3,
    High = 4,
    Max = 5,
}

impl Priority {
    /// Numeric value sent in the `Priority` header.
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Headers attached to one push message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationHeaders {
    pub title: String,
    /// Comma separated ntfy tags (emoji shortcodes).
    pub tags: String,
    pub priority: Priority,
}

/// Delivers a message to a topic on a push server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `body` to `topic` on `server`.
    async fn send(
        &self,
        server: &str,
        topic: &str,
        body: &str,
        headers: &NotificationHeaders,
    ) -> Result<(), NotificationError>;
}

/// Transport posting to an ntfy server over HTTP.
#[derive(Debug, Clone)]
pub struct NtfyTransport {
    client: Client,
}

impl NtfyTransport {
    /// Build a transport with connect and request timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialised.
    pub fn new() -> Result<Self, NotificationError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

/// Build the POST URL for `topic` on `server`.
///
/// # Errors
///
/// Returns an error if the server is not an absolute URL.
pub fn topic_url(server: &str, topic: &str) -> Result<Url, NotificationError> {
    let base = if server.ends_with('/') {
        Url::parse(server)?
    } else {
        Url::parse(&format!("{server}/"))?
    };
    Ok(base.join(topic)?)
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, NotificationError> {
    HeaderValue::from_bytes(value.as_bytes())
        .map_err(|source| NotificationError::InvalidHeader { name, source })
}

#[async_trait]
impl Transport for NtfyTransport {
    async fn send(
        &self,
        server: &str,
        topic: &str,
        body: &str,
        headers: &NotificationHeaders,
    ) -> Result<(), NotificationError> {
        let url = topic_url(server, topic)?;

        let response = self
            .client
            .post(url)
            .header("Title", header_value("Title", &headers.title)?)
            .header("Tags", header_value("Tags", &headers.tags)?)
            .header("Priority", headers.priority.as_u8().to_string())
            .body(body.to_string())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotificationError::Status {
            status: status.as_u16(),
            body,
        })
    }
}
