//! Per-category rate limiting.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::detect::Category;

/// Default window between two accepted sends of one category.
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_secs(60);

/// Tracks the last accepted send per category.
///
/// Critical categories are always accepted. Others are rejected while the
/// last accepted send of the same category is inside the window.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    last_sent: Mutex<HashMap<Category, Instant>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_LIMIT)
    }
}

impl RateLimiter {
    /// Create a limiter with the given window.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_sent: Mutex::new(HashMap::new()),
        }
    }

    /// Get the window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Check and record a send of `category` now.
    pub fn try_accept(&self, category: Category) -> bool {
        self.try_accept_at(category, Instant::now())
    }

    /// Check and record a send of `category` at `now`.
    pub fn try_accept_at(&self, category: Category, now: Instant) -> bool {
        let mut last_sent = self
            .last_sent
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if !category.is_critical() {
            if let Some(last) = last_sent.get(&category) {
                if now.saturating_duration_since(*last) < self.window {
                    return false;
                }
            }
        }

        last_sent.insert(category, now);
        true
    }
}
