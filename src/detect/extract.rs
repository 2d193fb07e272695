//! Structured extraction of interview starts and outcomes.

use std::borrow::Cow;

use regex::Regex;

use super::event::Outcome;
use super::DetectError;

/// Pattern for `Currently interviewing: <user> ::: <channel> ::: <n> remaining in queue`.
const START_PATTERN: &str =
    r"(?i)Currently interviewing:\s+([^\s:]+)\s+:::.*?:::\s+(\d+)\s+remaining in queue";

/// Parsed interview start announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewStart {
    pub username: String,
    pub queue_length: u32,
}

/// Parsed interview result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewResult {
    pub username: String,
    pub outcome: Outcome,
    pub message: String,
}

/// Compiled extractors for structured interview events.
#[derive(Debug, Clone)]
pub struct Extractors {
    start: Regex,
    outcome: Regex,
}

impl Extractors {
    /// Compile the extractors. Kick outcomes are only accepted from `bot_nicks`.
    ///
    /// # Errors
    ///
    /// Returns `DetectError::InvalidPattern` if a pattern fails to compile.
    pub fn new(bot_nicks: &[String]) -> Result<Self, DetectError> {
        let bots = bot_nicks
            .iter()
            .map(|nick| regex::escape(nick))
            .collect::<Vec<_>>()
            .join("|");
        let outcome = format!(r"(?:{bots}) kicked\s+(\S+)\s+from the channel\s*\((.+?)\)\s*$");

        Ok(Self {
            start: Regex::new(START_PATTERN)?,
            outcome: Regex::new(&outcome)?,
        })
    }

    /// Extract username and queue length from an interview start line.
    #[must_use]
    pub fn parse_interview_start(&self, line: &str) -> Option<InterviewStart> {
        let caps = self.start.captures(line)?;
        let username = caps.get(1)?.as_str().trim().to_string();
        let queue_length = match caps.get(2)?.as_str().parse::<u32>() {
            Ok(n) => n,
            Err(e) => {
                tracing::debug!(line = %line, error = %e, "Failed to parse queue length");
                return None;
            }
        };
        Some(InterviewStart {
            username,
            queue_length,
        })
    }

    /// Extract username, outcome and message from a bot kick line.
    ///
    /// Kick reasons that match no known outcome yield `None`.
    #[must_use]
    pub fn parse_interview_outcome(&self, line: &str) -> Option<InterviewResult> {
        let caps = self.outcome.captures(line)?;
        let username = caps.get(1)?.as_str().trim().to_string();
        let message = caps.get(2)?.as_str().trim().to_string();

        let Some(outcome) = classify_outcome(&message) else {
            tracing::debug!(username = %username, message = %message, "Unknown kick reason");
            return None;
        };

        Some(InterviewResult {
            username,
            outcome,
            message,
        })
    }
}

/// Classify a kick reason into an interview outcome.
#[must_use]
pub fn classify_outcome(message: &str) -> Option<Outcome> {
    let lower = message.to_lowercase();
    if lower.contains("congratulations") && lower.contains("welcome to") {
        Some(Outcome::Passed)
    } else if lower.contains("not passed the interview") || lower.contains("you have not passed")
    {
        Some(Outcome::Failed)
    } else if lower.contains("missed your interview") {
        Some(Outcome::Missed)
    } else {
        None
    }
}

/// Remove `<...>` markup, including nick brackets, from a line.
#[must_use]
pub fn strip_markup(line: &str) -> Cow<'_, str> {
    if !line.contains('<') {
        return Cow::Borrowed(line);
    }

    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(open) = rest.find('<') {
        match rest[open..].find('>') {
            Some(close) => {
                out.push_str(&rest[..open]);
                rest = &rest[open + close + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}
