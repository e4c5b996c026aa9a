//! In-process reference store with brute-force cosine search

use super::{Neighbor, NeighborMetadata, ReferenceEntry, ReferenceStore};
use async_trait::async_trait;
use moodtrace_core::{Error, Result};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Reference corpus held in memory.
///
/// Suitable for corpora of a few thousand sentences; every query scans
/// the whole category.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReferenceStore {
    entries: Vec<ReferenceEntry>,
}

impl InMemoryReferenceStore {
    pub fn new(entries: Vec<ReferenceEntry>) -> Self {
        Self { entries }
    }

    /// Load entries from a JSON array file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let entries: Vec<ReferenceEntry> = serde_json::from_str(&content)?;
        info!(
            "Loaded {} reference entries from {}",
            entries.len(),
            path.display()
        );
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ReferenceStore for InMemoryReferenceStore {
    async fn nearest_neighbors(
        &self,
        vector: &[f32],
        category: &str,
        k: usize,
        _timeout: Duration,
    ) -> Result<Vec<Neighbor>> {
        if vector.is_empty() {
            return Err(Error::provider("query vector is empty"));
        }

        let mut scored: Vec<(f64, &ReferenceEntry)> = self
            .entries
            .iter()
            .filter(|e| e.category == category && e.embedding.len() == vector.len())
            .map(|e| (cosine_similarity(vector, &e.embedding), e))
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(similarity, entry)| Neighbor {
                text: entry.text.clone(),
                similarity,
                metadata: NeighborMetadata {
                    valence: entry.valence,
                    arousal: entry.arousal,
                    dominance: entry.dominance,
                    primary_emotion: entry.primary_emotion.clone(),
                },
            })
            .collect())
    }
}

/// Cosine similarity clamped to `[0, 1]`; zero vectors score 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(text: &str, embedding: Vec<f32>, category: &str) -> ReferenceEntry {
        ReferenceEntry {
            text: text.to_string(),
            embedding,
            sentiment_label: "positive".to_string(),
            primary_emotion: "happy".to_string(),
            valence: 0.8,
            arousal: 0.4,
            dominance: 0.5,
            category: category.to_string(),
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-9);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_nearest_neighbors_ordering_and_category() {
        let store = InMemoryReferenceStore::new(vec![
            entry("far", vec![0.0, 1.0], "sentiment_reference"),
            entry("close", vec![1.0, 0.1], "sentiment_reference"),
            entry("exact-other", vec![1.0, 0.0], "other"),
            entry("middle", vec![1.0, 1.0], "sentiment_reference"),
        ]);

        let neighbors = store
            .nearest_neighbors(&[1.0, 0.0], "sentiment_reference", 2, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(neighbors.len(), 2);
        assert_eq!(neighbors[0].text, "close");
        assert_eq!(neighbors[1].text, "middle");
        assert!(neighbors[0].similarity >= neighbors[1].similarity);
    }

    #[tokio::test]
    async fn test_empty_query_vector_is_error() {
        let store = InMemoryReferenceStore::default();
        let result = store
            .nearest_neighbors(&[], "sentiment_reference", 3, Duration::from_secs(1))
            .await;
        assert!(matches!(result, Err(Error::ProviderUnavailable(_))));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        let entries = vec![entry("hello", vec![0.5, 0.5], "sentiment_reference")];
        std::fs::write(&path, serde_json::to_string(&entries).unwrap()).unwrap();

        let store = InMemoryReferenceStore::from_json_file(&path).unwrap();
        assert_eq!(store.len(), 1);
    }
}
