//! moodtrace Telemetry
//!
//! Counters and latency metrics for the sentiment fusion engine.
//!
//! Provides:
//! - Per-blend-plan analysis counts
//! - Strategy abstention, escalation, and failure counts
//! - Latency accounting with `metrics` crate mirrors for exporters

pub mod metrics;

pub use crate::metrics::{AnalysisMetrics, MetricsSnapshot};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::metrics::{AnalysisMetrics, MetricsSnapshot};
}
