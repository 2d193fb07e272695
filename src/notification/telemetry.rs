//! Opt-in anonymous start-up ping.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::task::JoinHandle;

use super::dispatcher::{Destination, DispatchOutcome, Dispatcher, NotificationRequest, DEFAULT_SERVER};
use crate::detect::Category;

/// Topic the telemetry ping is posted to.
pub const TELEMETRY_TOPIC: &str = "interview-notify-telemetry";

const TELEMETRY_SEED: &str = "H6IhIkah11ee1AxnDKClsujZ6gX9zHf8";

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Anonymous id derived from the nick. The nick itself is never sent.
#[must_use]
pub fn anonymous_id(nick: &str) -> String {
    sha256_hex(&format!("{}{TELEMETRY_SEED}", sha256_hex(nick)))
}

/// Build the telemetry request.
#[must_use]
pub fn telemetry_request(nick: &str, mode: &str) -> NotificationRequest {
    let body = format!(
        "anon_id={}, mode={mode}, version={}",
        anonymous_id(nick),
        env!("CARGO_PKG_VERSION")
    );
    NotificationRequest::new(Category::Telemetry, body)
        .with_destination(Destination::new(DEFAULT_SERVER, TELEMETRY_TOPIC))
}

/// Send the telemetry ping through `dispatcher`.
pub async fn send_telemetry(dispatcher: &Dispatcher, nick: &str, mode: &str) -> DispatchOutcome {
    tracing::debug!(topic = TELEMETRY_TOPIC, "Sending anonymous telemetry");
    dispatcher.send(telemetry_request(nick, mode)).await
}

/// Send the telemetry ping in the background so a slow server never
/// delays log monitoring.
pub fn spawn_telemetry(
    dispatcher: Arc<Dispatcher>,
    nick: String,
    mode: String,
) -> JoinHandle<DispatchOutcome> {
    tokio::spawn(async move { send_telemetry(&dispatcher, &nick, &mode).await })
}
