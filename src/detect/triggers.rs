//! Ordered trigger rules mapping a log line to at most one event.

use super::error::DetectError;
use super::event::{DetectedEvent, EventKind};
use super::extract::{strip_markup, Extractors};

const INTERVIEW_PREFIX: &str = "Currently interviewing:";
const NETSPLIT_MARKER: &str = "*.net *.split";
const PING_TIMEOUT_MARKER: &str = "Ping timeout: 121 seconds";

/// Inputs the detector needs from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorConfig {
    /// The user's own IRC nick.
    pub nick: String,
    /// Nicks of the interview bots.
    pub bot_nicks: Vec<String>,
    /// Only honour interview triggers when said by a bot.
    pub check_bot_nicks: bool,
}

impl DetectorConfig {
    /// Create a config with bot-nick scoping enabled.
    #[must_use]
    pub fn new(nick: impl Into<String>, bot_nicks: Vec<String>) -> Self {
        Self {
            nick: nick.into(),
            bot_nicks,
            check_bot_nicks: true,
        }
    }
}

/// How a trigger tests a line.
#[derive(Debug, Clone)]
enum Rule {
    /// Phrase that may be scoped to bot speech.
    Phrase(String),
    /// Phrase matched on the raw line, never scoped.
    RawPhrase(String),
    /// Plain substring.
    Literal(&'static str),
    Netsplit,
    /// "kick" alongside a bot nick and the own nick.
    Kick,
}

#[derive(Debug, Clone)]
struct Trigger {
    kind: EventKind,
    rule: Rule,
}

/// Stateless line classifier.
#[derive(Debug, Clone)]
pub struct EventDetector {
    config: DetectorConfig,
    /// Checked in order, first match wins.
    triggers: Vec<Trigger>,
    extractors: Extractors,
}

impl EventDetector {
    /// Build a detector.
    ///
    /// # Errors
    ///
    /// Returns an error if the nick is empty, no bot nicks are configured,
    /// or an extraction pattern fails to compile.
    pub fn new(mut config: DetectorConfig) -> Result<Self, DetectError> {
        config.nick = config.nick.trim().to_string();
        if config.nick.is_empty() {
            return Err(DetectError::MissingNick);
        }
        config.bot_nicks = config
            .bot_nicks
            .iter()
            .map(|nick| nick.trim().to_string())
            .filter(|nick| !nick.is_empty())
            .collect();
        if config.bot_nicks.is_empty() {
            return Err(DetectError::NoBotNicks);
        }

        let triggers = vec![
            Trigger {
                kind: EventKind::OwnInterview,
                rule: Rule::Phrase(format!("{INTERVIEW_PREFIX} {}", config.nick)),
            },
            Trigger {
                kind: EventKind::Interview,
                rule: Rule::Phrase(INTERVIEW_PREFIX.to_string()),
            },
            Trigger {
                kind: EventKind::Mention,
                rule: Rule::RawPhrase(format!("{}:", config.nick)),
            },
            Trigger {
                kind: EventKind::Disconnect,
                rule: Rule::Literal("Disconnected"),
            },
            Trigger {
                kind: EventKind::Netsplit,
                rule: Rule::Netsplit,
            },
            Trigger {
                kind: EventKind::Kick,
                rule: Rule::Kick,
            },
        ];

        let extractors = Extractors::new(&config.bot_nicks)?;

        Ok(Self {
            config,
            triggers,
            extractors,
        })
    }

    /// Get the effective configuration.
    #[must_use]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Classify a line. The first matching trigger wins.
    #[must_use]
    pub fn detect(&self, line: &str, channel: &str) -> Option<DetectedEvent> {
        let stripped = strip_markup(line);
        self.triggers
            .iter()
            .find(|trigger| self.matches(&trigger.rule, line, &stripped))
            .map(|trigger| DetectedEvent::new(trigger.kind.clone(), line, channel))
    }

    /// Run the structured extractors. Both may fire on the same line.
    #[must_use]
    pub fn extract(&self, line: &str, channel: &str) -> Vec<DetectedEvent> {
        let mut events = Vec::new();
        if let Some(start) = self.extractors.parse_interview_start(line) {
            events.push(DetectedEvent::new(
                EventKind::InterviewStarted {
                    username: start.username,
                    queue_length: start.queue_length,
                },
                line,
                channel,
            ));
        }
        if let Some(result) = self.extractors.parse_interview_outcome(line) {
            events.push(DetectedEvent::new(
                EventKind::InterviewOutcome {
                    username: result.username,
                    outcome: result.outcome,
                    message: result.message,
                },
                line,
                channel,
            ));
        }
        events
    }

    fn matches(&self, rule: &Rule, line: &str, stripped: &str) -> bool {
        match rule {
            Rule::Phrase(phrase) => {
                if self.config.check_bot_nicks {
                    self.config
                        .bot_nicks
                        .iter()
                        .any(|bot| line.contains(&format!("{bot}> {phrase}")))
                } else {
                    stripped.contains(phrase.as_str())
                }
            }
            Rule::RawPhrase(phrase) => line.contains(phrase.as_str()),
            Rule::Literal(needle) => line.contains(needle),
            Rule::Netsplit => is_netsplit(line),
            Rule::Kick => {
                line.to_lowercase().contains("kick")
                    && line.contains(&self.config.nick)
                    && self.config.bot_nicks.iter().any(|bot| line.contains(bot))
            }
        }
    }
}

/// A quit caused by a real netsplit or the 121 second ping timeout.
#[must_use]
pub fn is_netsplit(line: &str) -> bool {
    line.contains("left IRC")
        && (line.contains(NETSPLIT_MARKER) || line.contains(PING_TIMEOUT_MARKER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::event::Outcome;

    fn detector() -> EventDetector {
        EventDetector::new(DetectorConfig::new("alice", vec!["Gatekeeper".to_string()])).unwrap()
    }

    fn kind(detector: &EventDetector, line: &str) -> Option<EventKind> {
        detector.detect(line, "#red").map(|event| event.kind)
    }

    #[test]
    fn test_new_rejects_empty_nick() {
        let result = EventDetector::new(DetectorConfig::new("  ", vec!["Gatekeeper".to_string()]));
        assert!(matches!(result, Err(DetectError::MissingNick)));
    }

    #[test]
    fn test_new_rejects_blank_bot_nicks() {
        let result = EventDetector::new(DetectorConfig::new("alice", vec![" ".to_string()]));
        assert!(matches!(result, Err(DetectError::NoBotNicks)));
    }

    #[test]
    fn test_new_trims_bot_nicks() {
        let detector =
            EventDetector::new(DetectorConfig::new("alice", vec![" Gatekeeper ".to_string()]))
                .unwrap();
        assert_eq!(detector.config().bot_nicks, vec!["Gatekeeper".to_string()]);
    }

    #[test]
    fn test_own_interview() {
        let detector = detector();
        let line = "[12:00] <Gatekeeper> Currently interviewing: alice ::: #red ::: 3 remaining in queue.";
        assert_eq!(kind(&detector, line), Some(EventKind::OwnInterview));
    }

    #[test]
    fn test_other_interview() {
        let detector = detector();
        let line = "<Gatekeeper> Currently interviewing: bob ::: #red ::: 3 remaining in queue.";
        assert_eq!(kind(&detector, line), Some(EventKind::Interview));
    }

    #[test]
    fn test_interview_from_non_bot_ignored_when_scoped() {
        let detector = detector();
        let line = "<mallory> Currently interviewing: alice";
        assert_eq!(kind(&detector, line), None);
    }

    #[test]
    fn test_interview_from_non_bot_accepted_when_unscoped() {
        let mut config = DetectorConfig::new("alice", vec!["Gatekeeper".to_string()]);
        config.check_bot_nicks = false;
        let detector = EventDetector::new(config).unwrap();
        let line = "<mallory> Currently interviewing: alice";
        assert_eq!(kind(&detector, line), Some(EventKind::OwnInterview));
    }

    #[test]
    fn test_mention_is_never_scoped() {
        let detector = detector();
        assert_eq!(
            kind(&detector, "<mallory> alice: are you there?"),
            Some(EventKind::Mention)
        );
    }

    #[test]
    fn test_disconnect() {
        let detector = detector();
        assert_eq!(
            kind(&detector, "* Disconnected (Connection reset by peer)"),
            Some(EventKind::Disconnect)
        );
    }

    #[test]
    fn test_netsplit() {
        let detector = detector();
        assert_eq!(
            kind(&detector, "* bob (~b@host) has left IRC (*.net *.split)"),
            Some(EventKind::Netsplit)
        );
        assert_eq!(
            kind(&detector, "* bob has left IRC (Ping timeout: 121 seconds)"),
            Some(EventKind::Netsplit)
        );
        assert_eq!(
            kind(&detector, "* bob has left IRC (Ping timeout: 60 seconds)"),
            None
        );
        assert_eq!(kind(&detector, "* bob (Ping timeout: 121 seconds)"), None);
    }

    #[test]
    fn test_kick() {
        let detector = detector();
        assert_eq!(
            kind(&detector, "* Gatekeeper KICKED alice from the channel (flood)"),
            Some(EventKind::Kick)
        );
        // Bot nick required.
        assert_eq!(
            kind(&detector, "* RandomOp kicked alice from the channel (flood)"),
            None
        );
    }

    #[test]
    fn test_priority_order() {
        let detector = detector();
        // Own interview beats mention and kick.
        let line = "<Gatekeeper> Currently interviewing: alice ::: kick alice: now";
        assert_eq!(kind(&detector, line), Some(EventKind::OwnInterview));
        // Mention beats disconnect.
        assert_eq!(
            kind(&detector, "<bob> alice: Disconnected again?"),
            Some(EventKind::Mention)
        );
    }

    #[test]
    fn test_generic_chat_yields_nothing() {
        let detector = detector();
        for line in [
            "<bob> hello everyone",
            "<carol> how long is the queue?",
            "* bob has joined #red-invites",
            "<dave> I got disconnected yesterday",
        ] {
            assert_eq!(kind(&detector, line), None, "{line}");
        }
    }

    #[test]
    fn test_detect_carries_line_and_channel() {
        let detector = detector();
        let event = detector.detect("* Disconnected", "#ops").unwrap();
        assert_eq!(event.line, "* Disconnected");
        assert_eq!(event.channel, "#ops");
    }

    #[test]
    fn test_extract_start() {
        let detector = detector();
        let events = detector.extract(
            "<Gatekeeper> Currently interviewing: bob ::: #red ::: 5 remaining in queue.",
            "#red-invites",
        );
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].kind,
            EventKind::InterviewStarted {
                username: "bob".to_string(),
                queue_length: 5,
            }
        );
        assert_eq!(events[0].channel, "#red-invites");
    }

    #[test]
    fn test_extract_outcome() {
        let detector = detector();
        let events = detector.extract(
            "* Gatekeeper kicked bob from the channel (You have not passed the interview.)",
            "#red",
        );
        assert_eq!(events.len(), 1);
        match &events[0].kind {
            EventKind::InterviewOutcome {
                username, outcome, ..
            } => {
                assert_eq!(username, "bob");
                assert_eq!(*outcome, Outcome::Failed);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_extract_nothing() {
        assert!(detector().extract("<bob> hi", "#red").is_empty());
    }
}
