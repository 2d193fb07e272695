//! Event detection over single log lines.
//!
//! Trigger rules classify a line into at most one notification event, while
//! the structured extractors pull interview starts and outcomes for analytics.

mod error;
mod event;
mod extract;
mod triggers;

pub use error::DetectError;
pub use event::{Category, DetectedEvent, EventKind, Outcome};
pub use extract::{classify_outcome, strip_markup, Extractors, InterviewResult, InterviewStart};
pub use triggers::{is_netsplit, DetectorConfig, EventDetector};
