// src/pipeline/mod.rs

pub mod event_bus;
pub mod metrics;
pub mod session;

pub use event_bus::EventBus;
pub use metrics::{MetricsSummary, SessionMetrics};
pub use session::{DetectionSession, SessionSummary};
