//! Bounded per-session record of analysed messages
//!
//! The history is owned by the caller and handed to the service by mutable
//! reference, so nothing is shared between sessions.

use moodtrace_core::Sentiment;
use serde::Serialize;
use std::collections::VecDeque;

/// Default number of entries retained
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// One analysed message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub text: String,
    pub sentiment: Sentiment,
}

/// Ring buffer of recent `(text, sentiment)` pairs
#[derive(Debug, Clone)]
pub struct SessionHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// A capacity of zero is treated as one
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record an entry, evicting the oldest when full
    pub fn push(&mut self, text: impl Into<String>, sentiment: Sentiment) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry {
            text: text.into(),
            sentiment,
        });
    }

    /// Up to `n` most recent entries, oldest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &HistoryEntry> {
        let start = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(start)
    }

    /// Texts of the `n` most recent entries, usable as classifier context
    pub fn recent_texts(&self, n: usize) -> Vec<String> {
        self.recent(n).map(|e| e.text.clone()).collect()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    /// Mean valence of everything retained
    pub fn average_valence(&self) -> Option<f64> {
        if self.entries.is_empty() {
            return None;
        }
        let sum: f64 = self.entries.iter().map(|e| e.sentiment.valence).sum();
        Some(sum / self.entries.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for SessionHistory {
    fn default() -> Self {
        Self::new()
    }
}
