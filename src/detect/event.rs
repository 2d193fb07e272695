//! Detected event types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result of an interview, as announced by the bot's kick message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
    Missed,
}

impl Outcome {
    /// Returns the string representation used in storage and output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Missed => "missed",
        }
    }

    /// Parse a stored outcome name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "passed" => Some(Self::Passed),
            "failed" => Some(Self::Failed),
            "missed" => Some(Self::Missed),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification category. Rate limiting is keyed by this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// The configured nick is being interviewed.
    #[serde(rename = "your_interview")]
    OwnInterview,
    /// Someone else is being interviewed.
    Interview,
    Mention,
    Disconnect,
    Netsplit,
    Kick,
    /// Synthetic category for the start-up telemetry ping.
    Telemetry,
}

impl Category {
    /// Returns the stable name written to the notification log.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OwnInterview => "your_interview",
            Self::Interview => "interview",
            Self::Mention => "mention",
            Self::Disconnect => "disconnect",
            Self::Netsplit => "netsplit",
            Self::Kick => "kick",
            Self::Telemetry => "telemetry",
        }
    }

    /// Categories that are never rate limited.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::OwnInterview | Self::Disconnect | Self::Kick)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a line was recognised as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    OwnInterview,
    Interview,
    Mention,
    Disconnect,
    Netsplit,
    Kick,
    /// Structured interview start announcement.
    InterviewStarted { username: String, queue_length: u32 },
    /// Structured interview result from a bot kick message.
    InterviewOutcome {
        username: String,
        outcome: Outcome,
        message: String,
    },
}

impl EventKind {
    /// Notification category for trigger kinds, `None` for structured kinds.
    #[must_use]
    pub fn category(&self) -> Option<Category> {
        match self {
            Self::OwnInterview => Some(Category::OwnInterview),
            Self::Interview => Some(Category::Interview),
            Self::Mention => Some(Category::Mention),
            Self::Disconnect => Some(Category::Disconnect),
            Self::Netsplit => Some(Category::Netsplit),
            Self::Kick => Some(Category::Kick),
            Self::InterviewStarted { .. } | Self::InterviewOutcome { .. } => None,
        }
    }
}

/// An event recognised in one log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedEvent {
    /// What was recognised.
    pub kind: EventKind,
    /// The raw source line.
    pub line: String,
    /// Channel the line was read from.
    pub channel: String,
}

impl DetectedEvent {
    /// Create a new event.
    #[must_use]
    pub fn new(kind: EventKind, line: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            kind,
            line: line.into(),
            channel: channel.into(),
        }
    }

    /// Notification category, if this event should notify.
    #[must_use]
    pub fn category(&self) -> Option<Category> {
        self.kind.category()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_names() {
        assert_eq!(Category::OwnInterview.as_str(), "your_interview");
        assert_eq!(Category::Netsplit.to_string(), "netsplit");
        assert_eq!(
            serde_json::to_string(&Category::OwnInterview).unwrap(),
            "\"your_interview\""
        );
        assert_eq!(serde_json::to_string(&Category::Kick).unwrap(), "\"kick\"");
    }

    #[test]
    fn test_critical_categories() {
        assert!(Category::OwnInterview.is_critical());
        assert!(Category::Disconnect.is_critical());
        assert!(Category::Kick.is_critical());
        assert!(!Category::Interview.is_critical());
        assert!(!Category::Mention.is_critical());
        assert!(!Category::Netsplit.is_critical());
        assert!(!Category::Telemetry.is_critical());
    }

    #[test]
    fn test_outcome_parse() {
        assert_eq!(Outcome::parse("passed"), Some(Outcome::Passed));
        assert_eq!(Outcome::parse("missed"), Some(Outcome::Missed));
        assert_eq!(Outcome::parse("started"), None);
    }

    #[test]
    fn test_structured_kinds_have_no_category() {
        let started = EventKind::InterviewStarted {
            username: "alice".to_string(),
            queue_length: 3,
        };
        assert_eq!(started.category(), None);

        let event = DetectedEvent::new(EventKind::Mention, "bob: hi", "#red");
        assert_eq!(event.category(), Some(Category::Mention));
    }
}
