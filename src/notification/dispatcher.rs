//! Event to notification dispatch.

use std::sync::Arc;

use super::log::NotificationLog;
use super::rate_limit::RateLimiter;
use super::transport::{NotificationHeaders, Priority, Transport};
use crate::detect::{Category, DetectedEvent};

/// Default ntfy server.
pub const DEFAULT_SERVER: &str = "https://ntfy.sh/";

/// Server and topic a notification is posted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub server: String,
    pub topic: String,
}

impl Destination {
    /// Create a destination.
    #[must_use]
    pub fn new(server: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            topic: topic.into(),
        }
    }
}

/// Fixed presentation for a category: title, tags and priority.
#[must_use]
pub fn style(category: Category) -> (&'static str, &'static str, Priority) {
    match category {
        Category::OwnInterview => ("Your interview is happening❗", "rotating_light", Priority::Max),
        Category::Interview => ("Interview detected", "warning", Priority::Default),
        Category::Mention => ("You've been mentioned", "wave", Priority::Default),
        Category::Disconnect => ("You've been disconnected from IRC!", "x", Priority::Max),
        Category::Netsplit => (
            "Netsplit detected – requeue within 10min!",
            "electric_plug",
            Priority::Max,
        ),
        Category::Kick => (
            "You've been kicked – rejoin & requeue ASAP!",
            "anger",
            Priority::Max,
        ),
        Category::Telemetry => ("Anonymous Telemetry", "telephone_receiver", Priority::Default),
    }
}

/// One outbound notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub category: Category,
    pub title: String,
    pub body: String,
    pub priority: Priority,
    pub tags: String,
    /// Overrides the dispatcher's default destination.
    pub destination: Option<Destination>,
}

impl NotificationRequest {
    /// Build a request for `category` with its fixed style.
    #[must_use]
    pub fn new(category: Category, body: impl Into<String>) -> Self {
        let (title, tags, priority) = style(category);
        Self {
            category,
            title: title.to_string(),
            body: body.into(),
            priority,
            tags: tags.to_string(),
            destination: None,
        }
    }

    /// Build the request for a trigger event. Structured events yield `None`.
    #[must_use]
    pub fn for_event(event: &DetectedEvent) -> Option<Self> {
        event
            .category()
            .map(|category| Self::new(category, event.line.clone()))
    }

    /// Send to `destination` instead of the default.
    #[must_use]
    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = Some(destination);
        self
    }

    fn headers(&self) -> NotificationHeaders {
        NotificationHeaders {
            title: self.title.clone(),
            tags: self.tags.clone(),
            priority: self.priority,
        }
    }
}

/// What happened to a dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Delivered to the transport successfully.
    Sent,
    /// Dropped by the rate limiter.
    Suppressed,
    /// Accepted but the transport failed.
    Failed,
    /// The event carries no notification category.
    Ignored,
}

/// Turns events into rate-limited notifications.
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    target: Destination,
    rate_limiter: RateLimiter,
    log: Option<NotificationLog>,
}

impl Dispatcher {
    /// Create a dispatcher posting to `target` by default.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, target: Destination, rate_limiter: RateLimiter) -> Self {
        Self {
            transport,
            target,
            rate_limiter,
            log: None,
        }
    }

    /// Record accepted notifications in `log`.
    #[must_use]
    pub fn with_log(mut self, log: NotificationLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Get the default destination.
    #[must_use]
    pub fn target(&self) -> &Destination {
        &self.target
    }

    /// Notify about a detected event.
    pub async fn dispatch(&self, event: &DetectedEvent) -> DispatchOutcome {
        match NotificationRequest::for_event(event) {
            Some(request) => self.send(request).await,
            None => DispatchOutcome::Ignored,
        }
    }

    /// Rate limit, deliver and record one request.
    pub async fn send(&self, request: NotificationRequest) -> DispatchOutcome {
        if !self.rate_limiter.try_accept(request.category) {
            tracing::debug!(category = %request.category, "Notification rate limited");
            return DispatchOutcome::Suppressed;
        }

        let destination = request.destination.as_ref().unwrap_or(&self.target);
        let outcome = match self
            .transport
            .send(
                &destination.server,
                &destination.topic,
                &request.body,
                &request.headers(),
            )
            .await
        {
            Ok(()) => {
                tracing::debug!(
                    category = %request.category,
                    topic = %destination.topic,
                    "Notification sent"
                );
                DispatchOutcome::Sent
            }
            Err(e) => {
                tracing::warn!(category = %request.category, error = %e, "Notification failed");
                DispatchOutcome::Failed
            }
        };

        if let Some(log) = &self.log {
            if let Err(e) = log
                .append(request.category, request.priority, &request.title, &request.body)
                .await
            {
                tracing::error!(path = %log.path().display(), error = %e, "Notification log write failed");
            }
        }

        outcome
    }
}
