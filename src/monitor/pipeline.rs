//! Per-line processing: detection, analytics and dispatch.

use std::sync::Arc;

use async_trait::async_trait;

use crate::analytics::AnalyticsBridge;
use crate::detect::EventDetector;
use crate::notification::Dispatcher;
use crate::watcher::{LineHandler, LogSource};

/// The production [`LineHandler`].
///
/// Structured events go to analytics first, then the trigger event (if
/// any) goes to the dispatcher.
pub struct LinePipeline {
    detector: EventDetector,
    dispatcher: Arc<Dispatcher>,
    analytics: Option<AnalyticsBridge>,
}

impl LinePipeline {
    /// Create a pipeline without analytics.
    #[must_use]
    pub fn new(detector: EventDetector, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            detector,
            dispatcher,
            analytics: None,
        }
    }

    /// Forward interview starts and outcomes to `bridge`.
    #[must_use]
    pub fn with_analytics(mut self, bridge: AnalyticsBridge) -> Self {
        self.analytics = Some(bridge);
        self
    }

    /// Process one line read from `channel`.
    pub async fn process(&self, line: &str, channel: &str) {
        if let Some(bridge) = &self.analytics {
            for event in self.detector.extract(line, channel) {
                bridge.forward(&event).await;
            }
        }

        if let Some(event) = self.detector.detect(line, channel) {
            if let Some(category) = event.category() {
                tracing::info!(category = %category, channel = %channel, "Trigger detected");
            }
            let outcome = self.dispatcher.dispatch(&event).await;
            tracing::debug!(?outcome, "Dispatch finished");
        }
    }
}

#[async_trait]
impl LineHandler for LinePipeline {
    async fn handle_line(&self, line: &str, source: &LogSource) {
        self.process(line, &source.channel).await;
    }
}
