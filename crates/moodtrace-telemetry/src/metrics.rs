//! Metrics collection for sentiment analysis

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Metrics collector for the fusion engine.
///
/// Cheap to clone; all clones share the same counters. Every recording
/// is mirrored to the global `metrics` recorder when one is installed.
#[derive(Clone)]
pub struct AnalysisMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Default)]
struct MetricsInner {
    total_analyses: AtomicU64,
    lexicon_only: AtomicU64,
    embedding_and_lexicon: AtomicU64,
    llm_and_lexicon: AtomicU64,
    all_three: AtomicU64,
    embedding_abstentions: AtomicU64,
    remote_escalations: AtomicU64,
    remote_failures: AtomicU64,
    cancellations: AtomicU64,
    total_latency_us: AtomicU64,
}

impl AnalysisMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    /// Record a completed analysis under the blend plan that produced it
    pub fn record_analysis(&self, plan: &str, latency_us: u64) {
        self.inner.total_analyses.fetch_add(1, Ordering::Relaxed);
        self.inner
            .total_latency_us
            .fetch_add(latency_us, Ordering::Relaxed);

        let counter = match plan {
            "lexicon_only" => Some(&self.inner.lexicon_only),
            "embedding_and_lexicon" => Some(&self.inner.embedding_and_lexicon),
            "llm_and_lexicon" => Some(&self.inner.llm_and_lexicon),
            "all_three" => Some(&self.inner.all_three),
            _ => None,
        };
        if let Some(counter) = counter {
            counter.fetch_add(1, Ordering::Relaxed);
        }

        trace!(plan, latency_us, "analysis recorded");
        ::metrics::counter!("moodtrace_analyses_total", "plan" => plan.to_string()).increment(1);
        ::metrics::histogram!("moodtrace_analysis_latency_us").record(latency_us as f64);
    }

    /// Record the embedding strategy abstaining
    pub fn record_embedding_abstention(&self) {
        self.inner
            .embedding_abstentions
            .fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!("moodtrace_strategy_events_total", "event" => "embedding_abstain")
            .increment(1);
    }

    /// Record an escalation to the remote classifier
    pub fn record_remote_escalation(&self) {
        self.inner.remote_escalations.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!("moodtrace_strategy_events_total", "event" => "remote_escalation")
            .increment(1);
    }

    /// Record a swallowed remote classifier failure
    pub fn record_remote_failure(&self) {
        self.inner.remote_failures.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!("moodtrace_strategy_events_total", "event" => "remote_failure")
            .increment(1);
    }

    /// Record an analysis that fell back because of cancellation
    pub fn record_cancellation(&self) {
        self.inner.cancellations.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!("moodtrace_strategy_events_total", "event" => "cancelled")
            .increment(1);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSnapshot {
            total_analyses: load(&self.inner.total_analyses),
            lexicon_only: load(&self.inner.lexicon_only),
            embedding_and_lexicon: load(&self.inner.embedding_and_lexicon),
            llm_and_lexicon: load(&self.inner.llm_and_lexicon),
            all_three: load(&self.inner.all_three),
            embedding_abstentions: load(&self.inner.embedding_abstentions),
            remote_escalations: load(&self.inner.remote_escalations),
            remote_failures: load(&self.inner.remote_failures),
            cancellations: load(&self.inner.cancellations),
            total_latency_us: load(&self.inner.total_latency_us),
        }
    }
}

impl Default for AnalysisMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of current metrics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub total_analyses: u64,
    pub lexicon_only: u64,
    pub embedding_and_lexicon: u64,
    pub llm_and_lexicon: u64,
    pub all_three: u64,
    pub embedding_abstentions: u64,
    pub remote_escalations: u64,
    pub remote_failures: u64,
    pub cancellations: u64,
    pub total_latency_us: u64,
}

impl MetricsSnapshot {
    /// Calculate average latency per analysis
    pub fn avg_latency_us(&self) -> u64 {
        if self.total_analyses == 0 {
            0
        } else {
            self.total_latency_us / self.total_analyses
        }
    }

    /// Share of analyses that escalated to the remote model
    pub fn escalation_rate(&self) -> f64 {
        if self.total_analyses == 0 {
            0.0
        } else {
            self.remote_escalations as f64 / self.total_analyses as f64
        }
    }

    /// Share of analyses answered by the lexicon alone
    pub fn degradation_rate(&self) -> f64 {
        if self.total_analyses == 0 {
            0.0
        } else {
            self.lexicon_only as f64 / self.total_analyses as f64
        }
    }
}
