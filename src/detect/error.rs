//! Detector error types.

/// Errors building an [`EventDetector`](super::EventDetector).
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    /// Extraction pattern failed to compile.
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// No nick configured.
    #[error("Nick must not be empty")]
    MissingNick,

    /// No bot nicks configured.
    #[error("At least one bot nick is required")]
    NoBotNicks,
}
