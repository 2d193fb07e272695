//! Wiring from watched directories to detection and dispatch.

mod multi;
mod pipeline;

pub use multi::{DirectoryResult, Monitor, MonitorError};
pub use pipeline::LinePipeline;
