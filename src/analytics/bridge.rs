//! Forwards interview lifecycle events to a statistics recorder.

use std::sync::Arc;

use async_trait::async_trait;

use crate::detect::{DetectedEvent, EventKind, Outcome};
use crate::stats::StatsError;

/// Write side of the statistics store.
#[async_trait]
pub trait StatsRecorder: Send + Sync {
    /// Record an interview start.
    async fn record_start(
        &self,
        username: &str,
        queue_length: u32,
        channel: &str,
    ) -> Result<(), StatsError>;

    /// Record an interview outcome.
    async fn record_outcome(
        &self,
        username: &str,
        outcome: Outcome,
        message: &str,
        channel: &str,
    ) -> Result<(), StatsError>;

    /// Record a queue length sample.
    async fn record_snapshot(&self, queue_length: u32, channel: &str) -> Result<(), StatsError>;
}

/// Routes structured events to a [`StatsRecorder`]. Store errors never
/// reach the caller.
#[derive(Clone)]
pub struct AnalyticsBridge {
    recorder: Arc<dyn StatsRecorder>,
}

impl AnalyticsBridge {
    /// Create a bridge over `recorder`.
    #[must_use]
    pub fn new(recorder: Arc<dyn StatsRecorder>) -> Self {
        Self { recorder }
    }

    /// Forward one event. Non-structured events are ignored.
    pub async fn forward(&self, event: &DetectedEvent) {
        match &event.kind {
            EventKind::InterviewStarted {
                username,
                queue_length,
            } => {
                if let Err(e) = self
                    .recorder
                    .record_start(username, *queue_length, &event.channel)
                    .await
                {
                    tracing::warn!(username = %username, error = %e, "Failed to record interview start");
                }
                if let Err(e) = self
                    .recorder
                    .record_snapshot(*queue_length, &event.channel)
                    .await
                {
                    tracing::warn!(channel = %event.channel, error = %e, "Failed to record queue snapshot");
                }
                tracing::debug!(
                    username = %username,
                    queue_length,
                    channel = %event.channel,
                    "Recorded interview start"
                );
            }
            EventKind::InterviewOutcome {
                username,
                outcome,
                message,
            } => {
                match self
                    .recorder
                    .record_outcome(username, *outcome, message, &event.channel)
                    .await
                {
                    Ok(()) => {
                        tracing::debug!(username = %username, outcome = %outcome, "Recorded interview outcome");
                    }
                    Err(e) => {
                        tracing::warn!(username = %username, error = %e, "Failed to record interview outcome");
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MemoryRecorder {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl StatsRecorder for MemoryRecorder {
        async fn record_start(
            &self,
            username: &str,
            queue_length: u32,
            channel: &str,
        ) -> Result<(), StatsError> {
            self.calls
                .lock()
                .await
                .push(format!("start {username} {queue_length} {channel}"));
            if self.fail {
                return Err(StatsError::TaskCancelled);
            }
            Ok(())
        }

        async fn record_outcome(
            &self,
            username: &str,
            outcome: Outcome,
            message: &str,
            channel: &str,
        ) -> Result<(), StatsError> {
            self.calls
                .lock()
                .await
                .push(format!("outcome {username} {outcome} {message} {channel}"));
            Ok(())
        }

        async fn record_snapshot(&self, queue_length: u32, channel: &str) -> Result<(), StatsError> {
            self.calls
                .lock()
                .await
                .push(format!("snapshot {queue_length} {channel}"));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_start_records_start_and_snapshot() {
        let recorder = Arc::new(MemoryRecorder::default());
        let bridge = AnalyticsBridge::new(recorder.clone());

        let event = DetectedEvent::new(
            EventKind::InterviewStarted {
                username: "bob".to_string(),
                queue_length: 7,
            },
            "line",
            "#red-invites",
        );
        bridge.forward(&event).await;

        assert_eq!(
            *recorder.calls.lock().await,
            vec!["start bob 7 #red-invites", "snapshot 7 #red-invites"]
        );
    }

    #[tokio::test]
    async fn test_outcome_recorded() {
        let recorder = Arc::new(MemoryRecorder::default());
        let bridge = AnalyticsBridge::new(recorder.clone());

        let event = DetectedEvent::new(
            EventKind::InterviewOutcome {
                username: "bob".to_string(),
                outcome: Outcome::Missed,
                message: "missed your interview".to_string(),
            },
            "line",
            "#red",
        );
        bridge.forward(&event).await;

        assert_eq!(
            *recorder.calls.lock().await,
            vec!["outcome bob missed missed your interview #red"]
        );
    }

    #[tokio::test]
    async fn test_trigger_events_ignored() {
        let recorder = Arc::new(MemoryRecorder::default());
        let bridge = AnalyticsBridge::new(recorder.clone());

        bridge
            .forward(&DetectedEvent::new(EventKind::Kick, "line", "#red"))
            .await;
        assert!(recorder.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_store_error_does_not_stop_snapshot() {
        let recorder = Arc::new(MemoryRecorder {
            fail: true,
            ..MemoryRecorder::default()
        });
        let bridge = AnalyticsBridge::new(recorder.clone());

        let event = DetectedEvent::new(
            EventKind::InterviewStarted {
                username: "bob".to_string(),
                queue_length: 1,
            },
            "line",
            "#red",
        );
        bridge.forward(&event).await;

        assert_eq!(recorder.calls.lock().await.len(), 2);
    }
}
