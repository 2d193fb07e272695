//! Analytics bridge between detected events and the statistics store.

mod bridge;

pub use bridge::{AnalyticsBridge, StatsRecorder};
