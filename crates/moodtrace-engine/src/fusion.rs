//! Priority/fallback fusion of the lexicon, embedding, and remote strategies
//!
//! Policy:
//! 1. The lexicon always scores the text.
//! 2. The embedding voter is always attempted and may abstain.
//! 3. The remote model is consulted only when the embedding result is
//!    missing or weak *and* the lexicon is unsure or near-neutral.
//! 4. The present subset selects a [`BlendPlan`] with a fixed weight table.
//!
//! Strategy failures degrade availability and are never returned; the
//! only caller-visible error is empty input.

use crate::config::{BlendWeights, FusionConfig};
use crate::embedding::EmbeddingClassifier;
use crate::lexicon::{LexiconScore, LexiconScorer};
use crate::remote::RemoteClassifier;
use moodtrace_core::{Error, Result, Sentiment};
use moodtrace_telemetry::AnalysisMetrics;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Scoring strategy contributing to a blend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Embedding,
    Llm,
    Lexicon,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Embedding => "embedding",
            Self::Llm => "llm",
            Self::Lexicon => "lexicon",
        }
    }
}

/// Which strategies produced a result, and therefore which weights apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendPlan {
    LexiconOnly,
    EmbeddingAndLexicon,
    LlmAndLexicon,
    AllThree,
}

impl BlendPlan {
    pub fn resolve(has_embedding: bool, has_llm: bool) -> Self {
        match (has_embedding, has_llm) {
            (true, true) => Self::AllThree,
            (true, false) => Self::EmbeddingAndLexicon,
            (false, true) => Self::LlmAndLexicon,
            (false, false) => Self::LexiconOnly,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LexiconOnly => "lexicon_only",
            Self::EmbeddingAndLexicon => "embedding_and_lexicon",
            Self::LlmAndLexicon => "llm_and_lexicon",
            Self::AllThree => "all_three",
        }
    }

    /// Weights per contributing strategy, in priority order
    pub fn weights(&self, table: &BlendWeights) -> Vec<(Strategy, f64)> {
        match self {
            Self::AllThree => vec![
                (Strategy::Embedding, table.embedding),
                (Strategy::Llm, table.llm),
                (Strategy::Lexicon, table.lexicon),
            ],
            Self::EmbeddingAndLexicon => {
                let share = table.llm_share_to_embedding;
                vec![
                    (Strategy::Embedding, table.embedding + table.llm * share),
                    (Strategy::Lexicon, table.lexicon + table.llm * (1.0 - share)),
                ]
            }
            Self::LlmAndLexicon => vec![
                (Strategy::Llm, table.llm_with_lexicon),
                (Strategy::Lexicon, table.lexicon_with_llm),
            ],
            Self::LexiconOnly => vec![(Strategy::Lexicon, 1.0)],
        }
    }
}

/// Orchestrates the scoring strategies for a single message
pub struct FusionEngine {
    lexicon: LexiconScorer,
    embedding: Option<EmbeddingClassifier>,
    remote: Option<RemoteClassifier>,
    config: FusionConfig,
    metrics: Option<AnalysisMetrics>,
}

impl FusionEngine {
    /// Create an engine that only has the lexicon available
    pub fn new(lexicon: LexiconScorer, config: FusionConfig) -> Self {
        Self {
            lexicon,
            embedding: None,
            remote: None,
            config,
            metrics: None,
        }
    }

    /// Enable the embedding strategy
    pub fn with_embedding(mut self, classifier: EmbeddingClassifier) -> Self {
        self.embedding = Some(classifier);
        self
    }

    /// Enable the remote strategy
    pub fn with_remote(mut self, classifier: RemoteClassifier) -> Self {
        self.remote = Some(classifier);
        self
    }

    /// Record analysis outcomes into a shared collector
    pub fn with_metrics(mut self, metrics: AnalysisMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn lexicon(&self) -> &LexiconScorer {
        &self.lexicon
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Analyze `text` with optional conversational `context`
    pub async fn analyze(&self, text: &str, context: &[String]) -> Result<Sentiment> {
        self.analyze_with_cancel(text, context, &CancellationToken::new())
            .await
    }

    /// Analyze `text`; on cancellation the lexicon-only result is returned
    pub async fn analyze_with_cancel(
        &self,
        text: &str,
        context: &[String],
        cancel: &CancellationToken,
    ) -> Result<Sentiment> {
        if text.trim().is_empty() {
            return Err(Error::invalid_input("text to analyze is empty"));
        }
        let start = Instant::now();

        let lex = self.lexicon.score(text);
        let lex_sentiment = lex.to_sentiment();

        let emb = match &self.embedding {
            Some(classifier) => classifier.classify(text, context, cancel).await,
            None => None,
        };
        if cancel.is_cancelled() {
            return Ok(self.cancelled(lex_sentiment, start));
        }
        if emb.is_none() && self.embedding.is_some() {
            if let Some(metrics) = &self.metrics {
                metrics.record_embedding_abstention();
            }
        }

        let mut llm = None;
        if let Some(remote) = &self.remote {
            if self.should_escalate(&lex, emb.as_ref()) {
                if let Some(metrics) = &self.metrics {
                    metrics.record_remote_escalation();
                }
                match remote.classify(text, context, cancel).await {
                    Ok(sentiment) => llm = Some(sentiment),
                    Err(Error::Cancelled) => return Ok(self.cancelled(lex_sentiment, start)),
                    Err(e) => {
                        warn!("remote classifier failed, continuing without it: {}", e);
                        if let Some(metrics) = &self.metrics {
                            metrics.record_remote_failure();
                        }
                    }
                }
            } else {
                debug!(
                    lexicon_confidence = lex.confidence,
                    lexicon_valence = lex.valence,
                    embedding_confidence = emb.as_ref().map(|e| e.confidence),
                    "remote escalation gate closed"
                );
            }
        }

        let plan = BlendPlan::resolve(emb.is_some(), llm.is_some());
        let sentiment = blend(
            plan,
            &self.config.weights,
            emb.as_ref(),
            llm.as_ref(),
            &lex_sentiment,
        );
        debug!(
            plan = plan.as_str(),
            valence = sentiment.valence,
            confidence = sentiment.confidence,
            "message analyzed"
        );

        if let Some(metrics) = &self.metrics {
            metrics.record_analysis(plan.as_str(), start.elapsed().as_micros() as u64);
        }
        Ok(sentiment)
    }

    /// Remote escalation gate: the embedding result is missing or weak,
    /// and the lexicon is unsure or near-neutral
    pub fn should_escalate(&self, lex: &LexiconScore, emb: Option<&Sentiment>) -> bool {
        let embedding_weak = emb
            .map(|e| e.confidence < self.config.embedding_confidence_threshold)
            .unwrap_or(true);
        let lexicon_ambiguous = lex.confidence < self.config.lexicon_confidence_threshold
            || lex.valence.abs() < self.config.ambiguous_valence_threshold;
        embedding_weak && lexicon_ambiguous
    }

    fn cancelled(&self, lex_sentiment: Sentiment, start: Instant) -> Sentiment {
        debug!("analysis cancelled; returning lexicon-only result");
        if let Some(metrics) = &self.metrics {
            metrics.record_cancellation();
            metrics.record_analysis(
                BlendPlan::LexiconOnly.as_str(),
                start.elapsed().as_micros() as u64,
            );
        }
        blend(
            BlendPlan::LexiconOnly,
            &self.config.weights,
            None,
            None,
            &lex_sentiment,
        )
    }
}

/// Blend the available strategy results under `plan`.
///
/// Axes are weight-normalised linear combinations (then clamped), the
/// confidence is the maximum contributing confidence, and emotion and
/// labels come from the highest-weighted contributor.
pub fn blend(
    plan: BlendPlan,
    table: &BlendWeights,
    emb: Option<&Sentiment>,
    llm: Option<&Sentiment>,
    lex: &Sentiment,
) -> Sentiment {
    let contributions: Vec<(Strategy, f64, &Sentiment)> = plan
        .weights(table)
        .into_iter()
        .filter_map(|(strategy, weight)| {
            let sentiment = match strategy {
                Strategy::Embedding => emb?,
                Strategy::Llm => llm?,
                Strategy::Lexicon => lex,
            };
            Some((strategy, weight, sentiment))
        })
        .collect();

    let total: f64 = contributions.iter().map(|(_, w, _)| w).sum();
    if contributions.is_empty() || total <= 0.0 {
        return lex.clone().with_label("blend=lexicon");
    }

    let weighted = |axis: fn(&Sentiment) -> f64| {
        contributions
            .iter()
            .map(|(_, w, s)| w * axis(s))
            .sum::<f64>()
            / total
    };
    let valence = weighted(|s| s.valence);
    let arousal = weighted(|s| s.arousal);
    let dominance = weighted(|s| s.dominance);
    let confidence = contributions
        .iter()
        .map(|(_, _, s)| s.confidence)
        .fold(0.0, f64::max);

    // First of equal weights wins, which keeps priority order
    let (_, _, lead) = contributions
        .iter()
        .fold(None::<&(Strategy, f64, &Sentiment)>, |best, c| match best {
            Some(b) if b.1 >= c.1 => Some(b),
            _ => Some(c),
        })
        .copied()
        .unwrap_or((Strategy::Lexicon, 1.0, lex));

    let tag = contributions
        .iter()
        .map(|(s, _, _)| s.as_str())
        .collect::<Vec<_>>()
        .join("+");

    Sentiment::new(
        valence,
        arousal,
        dominance,
        confidence,
        lead.primary_emotion.clone(),
    )
    .with_labels(lead.labels.clone())
    .with_label(format!("blend={tag}"))
}
