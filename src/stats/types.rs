//! Record types stored in and read from the history database.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::detect::Outcome;

/// Type of interview row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Started,
    Passed,
    Failed,
    Missed,
}

impl RecordKind {
    /// Returns the string representation for database storage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Missed => "missed",
        }
    }

    /// Parse a stored event type.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "started" => Some(Self::Started),
            other => Outcome::parse(other).map(Self::from),
        }
    }
}

impl From<Outcome> for RecordKind {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Passed => Self::Passed,
            Outcome::Failed => Self::Failed,
            Outcome::Missed => Self::Missed,
        }
    }
}

/// One row of the `interviews` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewRecord {
    pub username: String,
    pub timestamp: NaiveDateTime,
    pub kind: RecordKind,
    pub queue_length: Option<u32>,
    pub channel: Option<String>,
    pub outcome_message: Option<String>,
}

/// Number of interview starts in one hour of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourCount {
    pub hour: u8,
    pub count: u64,
}

/// Aggregate statistics over a time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Interview starts in the window.
    pub total_interviews: u64,
    pub passed: u64,
    pub failed: u64,
    pub missed: u64,
    /// Mean queue length over starts, one decimal.
    pub avg_queue_length: f64,
    /// Up to five busiest hours by starts, busiest first.
    pub busiest_hours: Vec<HourCount>,
    /// Passed as a percentage of all outcomes, one decimal.
    pub pass_rate: f64,
}

impl Statistics {
    /// Total recorded outcomes.
    #[must_use]
    pub fn outcomes(&self) -> u64 {
        self.passed + self.failed + self.missed
    }
}

/// A queue length snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSample {
    pub timestamp: NaiveDateTime,
    pub queue_length: u32,
}

/// Round to one decimal place.
#[must_use]
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Pass rate as a percentage of all outcomes.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub(crate) fn pass_rate(passed: u64, outcomes: u64) -> f64 {
    round1(passed as f64 / outcomes.max(1) as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_kind_roundtrip_names() {
        for kind in [
            RecordKind::Started,
            RecordKind::Passed,
            RecordKind::Failed,
            RecordKind::Missed,
        ] {
            assert_eq!(RecordKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(RecordKind::parse("kicked"), None);
    }

    #[test]
    fn test_pass_rate() {
        assert!((pass_rate(0, 0) - 0.0).abs() < f64::EPSILON);
        assert!((pass_rate(1, 3) - 33.3).abs() < f64::EPSILON);
        assert!((pass_rate(2, 3) - 66.7).abs() < f64::EPSILON);
        assert!((pass_rate(5, 5) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_statistics_outcomes() {
        let stats = Statistics {
            total_interviews: 4,
            passed: 1,
            failed: 2,
            missed: 1,
            avg_queue_length: 0.0,
            busiest_hours: Vec::new(),
            pass_rate: 25.0,
        };
        assert_eq!(stats.outcomes(), 4);
    }
}
