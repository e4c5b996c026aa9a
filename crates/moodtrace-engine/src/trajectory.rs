//! Conversation-level sentiment analysis
//!
//! Runs the fusion engine once per message with a bounded amount of
//! concurrency, then aggregates the ordered results: recency-weighted
//! overall sentiment, trend classification, volatility, peaks, turning
//! points, and resolution.

use crate::config::TrajectoryConfig;
use crate::fusion::FusionEngine;
use futures::stream::{self, StreamExt, TryStreamExt};
use moodtrace_core::{
    ConversationMessage, ConversationResult, Direction, Error, Resolution, Result, Sentiment,
    Trajectory, TurningPoint,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct TrajectoryAnalyzer {
    engine: Arc<FusionEngine>,
    config: TrajectoryConfig,
}

impl TrajectoryAnalyzer {
    pub fn new(engine: Arc<FusionEngine>, config: TrajectoryConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &TrajectoryConfig {
        &self.config
    }

    /// Analyze an ordered (chronological) conversation
    pub async fn analyze(&self, messages: &[ConversationMessage]) -> Result<ConversationResult> {
        self.analyze_with_cancel(messages, &CancellationToken::new())
            .await
    }

    /// Analyze a conversation; cancellation fails the whole batch
    pub async fn analyze_with_cancel(
        &self,
        messages: &[ConversationMessage],
        cancel: &CancellationToken,
    ) -> Result<ConversationResult> {
        if messages.is_empty() {
            return Ok(ConversationResult::empty());
        }
        if let Some(i) = messages.iter().position(|m| m.content.trim().is_empty()) {
            return Err(Error::invalid_input(format!("message {i} is empty")));
        }

        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        let contents = &contents;
        let window = self.config.context_window;

        // `buffered` keeps output in input order regardless of completion order
        let sentiments: Vec<Sentiment> = stream::iter(0..contents.len())
            .map(|i| {
                let context = context_for(contents, i, window);
                async move {
                    if cancel.is_cancelled() {
                        return Err(Error::Cancelled);
                    }
                    let sentiment = self
                        .engine
                        .analyze_with_cancel(contents[i], &context, cancel)
                        .await?;
                    if cancel.is_cancelled() {
                        return Err(Error::Cancelled);
                    }
                    Ok(sentiment)
                }
            })
            .buffered(self.config.concurrency.max(1))
            .try_collect()
            .await?;

        let result = aggregate(sentiments, &self.config);
        info!(
            messages = result.messages_analyzed,
            trajectory = ?result.trajectory,
            resolution = ?result.resolution,
            "conversation analyzed"
        );
        Ok(result)
    }
}

/// Up to `window` other messages around index `i`: the closest preceding
/// ones first, topped up with following messages near the start of a
/// conversation. Returned oldest first.
pub fn context_for(contents: &[&str], i: usize, window: usize) -> Vec<String> {
    let before_start = i.saturating_sub(window);
    let mut indices: Vec<usize> = (before_start..i).collect();
    let missing = window - indices.len();
    indices.extend((i + 1..contents.len()).take(missing));
    indices.into_iter().map(|j| contents[j].to_string()).collect()
}

/// Aggregate ordered per-message sentiments into a conversation result
pub fn aggregate(sentiments: Vec<Sentiment>, config: &TrajectoryConfig) -> ConversationResult {
    let n = sentiments.len();
    if n == 0 {
        return ConversationResult::empty();
    }
    let valences: Vec<f64> = sentiments.iter().map(|s| s.valence).collect();

    let overall = overall_sentiment(&sentiments, config);
    let trajectory = classify_trajectory(&valences, config);
    let turning_points = detect_turning_points(&valences, config.turning_point_threshold);
    let volatility = volatility(&valences);
    let resolution = classify_resolution(&valences, config);

    let peak_positive = extreme_by(&sentiments, |a, b| b > a);
    let peak_negative = extreme_by(&sentiments, |a, b| b < a);

    debug!(
        n,
        volatility,
        turning_points = turning_points.len(),
        "conversation aggregated"
    );

    ConversationResult {
        overall,
        trajectory,
        turning_points,
        peak_positive,
        peak_negative,
        volatility,
        resolution,
        messages_analyzed: n,
        per_message: sentiments,
    }
}

/// First sentiment whose valence beats every earlier one under `better`
fn extreme_by(sentiments: &[Sentiment], better: fn(f64, f64) -> bool) -> Sentiment {
    let mut best = &sentiments[0];
    for s in &sentiments[1..] {
        if better(best.valence, s.valence) {
            best = s;
        }
    }
    best.clone()
}

/// Exponential recency weighting: the latest message weighs 1, each
/// earlier one `recency_decay` times the next
pub fn overall_sentiment(sentiments: &[Sentiment], config: &TrajectoryConfig) -> Sentiment {
    let n = sentiments.len();
    let Some(latest) = sentiments.last() else {
        return Sentiment::neutral();
    };

    let mut total = 0.0;
    let mut valence = 0.0;
    let mut arousal = 0.0;
    let mut dominance = 0.0;
    for (i, s) in sentiments.iter().enumerate() {
        let w = config.recency_decay.powi((n - i - 1) as i32);
        total += w;
        valence += w * s.valence;
        arousal += w * s.arousal;
        dominance += w * s.dominance;
    }

    let confidence = (n as f64 / config.confidence_saturation.max(1) as f64).min(1.0);
    Sentiment::new(
        valence / total,
        arousal / total,
        dominance / total,
        confidence,
        latest.primary_emotion.clone(),
    )
    .with_label(format!("conversation_n={n}"))
}

/// Compare mean valence of the second half against the first
pub fn classify_trajectory(valences: &[f64], config: &TrajectoryConfig) -> Trajectory {
    let n = valences.len();
    if n < config.min_messages_for_trajectory.max(2) {
        return Trajectory::InsufficientData;
    }
    let (first, second) = valences.split_at(n / 2);
    let diff = mean(second) - mean(first);

    if diff > config.trend_threshold {
        Trajectory::Improving
    } else if diff < -config.trend_threshold {
        Trajectory::Declining
    } else {
        Trajectory::Stable
    }
}

/// Interior points that jump by more than `threshold` from both neighbours
pub fn detect_turning_points(valences: &[f64], threshold: f64) -> Vec<TurningPoint> {
    valences
        .windows(3)
        .enumerate()
        .filter_map(|(offset, w)| {
            let (prev, current, next) = (w[0], w[1], w[2]);
            let from_prev = (current - prev).abs();
            if from_prev > threshold && (current - next).abs() > threshold {
                Some(TurningPoint {
                    index: offset + 1,
                    valence: current,
                    direction: if current > prev {
                        Direction::Up
                    } else {
                        Direction::Down
                    },
                    magnitude: from_prev,
                })
            } else {
                None
            }
        })
        .collect()
}

/// Population standard deviation; zero for fewer than two values
pub fn volatility(valences: &[f64]) -> f64 {
    if valences.len() < 2 {
        return 0.0;
    }
    let m = mean(valences);
    let variance = valences.iter().map(|v| (v - m).powi(2)).sum::<f64>() / valences.len() as f64;
    variance.sqrt()
}

/// Mean valence of the final messages
pub fn classify_resolution(valences: &[f64], config: &TrajectoryConfig) -> Resolution {
    let window = config.resolution_window.max(1);
    if valences.len() < window {
        return Resolution::Unknown;
    }
    let tail = mean(&valences[valences.len() - window..]);

    if tail > config.resolution_threshold {
        Resolution::Positive
    } else if tail < -config.resolution_threshold {
        Resolution::Negative
    } else {
        Resolution::Neutral
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
