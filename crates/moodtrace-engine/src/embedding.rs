//! Nearest-neighbour sentiment voting over a labelled reference corpus
//!
//! Not a trained model: the classifier embeds the text, fetches the closest
//! labelled reference sentences, and takes a similarity-squared weighted
//! vote. Any provider problem or lack of close neighbours is an abstention
//! (`None`), never an error.

use crate::config::EmbeddingConfig;
use crate::providers::{bounded, EmbeddingProvider, Neighbor, ReferenceStore};
use moodtrace_core::{Error, Sentiment};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub struct EmbeddingClassifier {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn ReferenceStore>,
    config: EmbeddingConfig,
}

impl EmbeddingClassifier {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn ReferenceStore>,
        config: EmbeddingConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            config,
        }
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    /// Vote on `text`. Context is accepted for interface parity with the
    /// remote classifier; only the message itself is embedded.
    pub async fn classify(
        &self,
        text: &str,
        _context: &[String],
        cancel: &CancellationToken,
    ) -> Option<Sentiment> {
        let vector = match bounded(
            self.config.embed_timeout(),
            cancel,
            self.embedder.embed(text, self.config.embed_timeout()),
        )
        .await
        {
            Ok(v) if !v.is_empty() => v,
            Ok(_) => {
                warn!("embedding provider returned an empty vector; abstaining");
                return None;
            }
            Err(Error::Cancelled) => {
                debug!("embedding lookup cancelled; abstaining");
                return None;
            }
            Err(e) => {
                warn!("embedding lookup failed, abstaining: {}", e);
                return None;
            }
        };

        let mut neighbors = match bounded(
            self.config.search_timeout(),
            cancel,
            self.store.nearest_neighbors(
                &vector,
                &self.config.category,
                self.config.top_k,
                self.config.search_timeout(),
            ),
        )
        .await
        {
            Ok(n) => n,
            Err(Error::Cancelled) => {
                debug!("reference search cancelled; abstaining");
                return None;
            }
            Err(e) => {
                warn!("reference search failed, abstaining: {}", e);
                return None;
            }
        };
        if neighbors.len() > self.config.top_k {
            debug!(
                returned = neighbors.len(),
                top_k = self.config.top_k,
                "reference store returned extra neighbours; keeping the closest"
            );
            neighbors.truncate(self.config.top_k);
        }

        let vote = vote(&neighbors, self.config.min_similarity);
        if vote.is_none() {
            debug!(
                candidates = neighbors.len(),
                min_similarity = self.config.min_similarity,
                "no neighbours above similarity floor; abstaining"
            );
        }
        vote
    }
}

/// Similarity-squared weighted vote over the neighbours at or above
/// `min_similarity`. `None` when no neighbour qualifies.
pub fn vote(neighbors: &[Neighbor], min_similarity: f64) -> Option<Sentiment> {
    let kept: Vec<&Neighbor> = neighbors
        .iter()
        .filter(|n| n.similarity.is_finite() && n.similarity >= min_similarity)
        .collect();
    if kept.is_empty() {
        return None;
    }

    let mut total_weight = 0.0;
    let mut valence = 0.0;
    let mut arousal = 0.0;
    let mut dominance = 0.0;
    // Insertion order breaks ties between equally weighted emotions
    let mut emotion_weights: Vec<(&str, f64)> = Vec::new();
    let mut emotion_index: HashMap<&str, usize> = HashMap::new();

    for n in &kept {
        let w = n.similarity * n.similarity;
        total_weight += w;
        valence += w * n.metadata.valence;
        arousal += w * n.metadata.arousal;
        dominance += w * n.metadata.dominance;

        let label = n.metadata.primary_emotion.as_str();
        match emotion_index.get(label) {
            Some(&i) => emotion_weights[i].1 += w,
            None => {
                emotion_index.insert(label, emotion_weights.len());
                emotion_weights.push((label, w));
            }
        }
    }

    if total_weight <= 0.0 {
        return None;
    }

    let primary_emotion = emotion_weights
        .iter()
        .fold(None::<(&str, f64)>, |best, &(label, w)| match best {
            Some((_, bw)) if bw >= w => best,
            _ => Some((label, w)),
        })
        .map(|(label, _)| label)
        .unwrap_or("neutral");

    let avg_similarity = kept.iter().map(|n| n.similarity).sum::<f64>() / kept.len() as f64;
    let confidence = (avg_similarity * 1.1).min(1.0);

    Some(
        Sentiment::new(
            valence / total_weight,
            arousal / total_weight,
            dominance / total_weight,
            confidence,
            primary_emotion,
        )
        .with_label(format!("embedding_top{}", kept.len()))
        .with_label(format!("avg_sim={avg_similarity:.3}")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::NeighborMetadata;

    fn neighbor(similarity: f64, valence: f64, emotion: &str) -> Neighbor {
        Neighbor {
            text: format!("ref {emotion}"),
            similarity,
            metadata: NeighborMetadata {
                valence,
                arousal: 0.5,
                dominance: 0.5,
                primary_emotion: emotion.to_string(),
            },
        }
    }

    #[test]
    fn test_vote_abstains_below_floor() {
        let neighbors = vec![neighbor(0.39, 0.9, "happy"), neighbor(0.1, -0.9, "sad")];
        assert!(vote(&neighbors, 0.40).is_none());
        assert!(vote(&[], 0.40).is_none());
    }

    #[test]
    fn test_vote_quadratic_weighting() {
        // weights 0.81 and 0.25
        let neighbors = vec![neighbor(0.9, 1.0, "happy"), neighbor(0.5, -1.0, "sad")];
        let s = vote(&neighbors, 0.40).unwrap();

        let expected = (0.81 - 0.25) / (0.81 + 0.25);
        assert!((s.valence - expected).abs() < 1e-9);
        assert_eq!(s.primary_emotion, "happy");
        assert!((s.confidence - 0.77).abs() < 1e-9);
        assert_eq!(s.labels, vec!["embedding_top2", "avg_sim=0.700"]);
    }

    #[test]
    fn test_vote_plurality_by_summed_weight() {
        let neighbors = vec![
            neighbor(0.9, -0.5, "frustrated"),
            neighbor(0.7, -0.2, "confused"),
            neighbor(0.7, -0.3, "confused"),
        ];
        // frustrated 0.81 vs confused 0.98
        let s = vote(&neighbors, 0.40).unwrap();
        assert_eq!(s.primary_emotion, "confused");
    }

    #[test]
    fn test_vote_confidence_capped() {
        let neighbors = vec![neighbor(1.0, 0.5, "happy")];
        let s = vote(&neighbors, 0.40).unwrap();
        assert_eq!(s.confidence, 1.0);
    }

    #[test]
    fn test_vote_ignores_filtered_neighbors() {
        let neighbors = vec![neighbor(0.8, 0.6, "happy"), neighbor(0.2, -1.0, "sad")];
        let s = vote(&neighbors, 0.40).unwrap();
        assert!((s.valence - 0.6).abs() < 1e-9);
        assert_eq!(s.labels[0], "embedding_top1");
    }
}
