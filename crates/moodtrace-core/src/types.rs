//! Core types for moodtrace

use serde::{Deserialize, Serialize};

/// Affect scores for a single piece of text.
///
/// Built through [`Sentiment::new`], which clamps every axis into its
/// declared range: valence `[-1, 1]`, arousal/dominance/confidence `[0, 1]`.
/// The frustration, satisfaction, and confusion metrics are derived on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    /// Negative (-1) to positive (+1)
    pub valence: f64,

    /// Calm (0) to excited (1)
    pub arousal: f64,

    /// Submissive (0) to assertive (1)
    pub dominance: f64,

    /// Confidence score (0.0-1.0)
    pub confidence: f64,

    /// Dominant emotion label (neutral, happy, sad, frustrated, ...)
    pub primary_emotion: String,

    /// Provenance and diagnostic tags
    #[serde(default)]
    pub labels: Vec<String>,
}

impl Sentiment {
    /// Create a new sentiment, clamping every axis into range
    pub fn new(
        valence: f64,
        arousal: f64,
        dominance: f64,
        confidence: f64,
        primary_emotion: impl Into<String>,
    ) -> Self {
        Self {
            valence: clamp_or_zero(valence, -1.0, 1.0),
            arousal: clamp_or_zero(arousal, 0.0, 1.0),
            dominance: clamp_or_zero(dominance, 0.0, 1.0),
            confidence: clamp_or_zero(confidence, 0.0, 1.0),
            primary_emotion: primary_emotion.into(),
            labels: Vec::new(),
        }
    }

    /// All-zero neutral sentiment with no confidence
    pub fn neutral() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0, "neutral")
    }

    /// Append a diagnostic label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    /// Replace the label list
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    /// Frustration: negative valence amplified by arousal
    pub fn frustration(&self) -> f64 {
        if self.valence < 0.0 {
            self.arousal * self.valence.abs()
        } else {
            0.0
        }
    }

    /// Satisfaction: positive valence held with dominance
    pub fn satisfaction(&self) -> f64 {
        if self.valence > 0.0 {
            self.valence * self.dominance
        } else {
            0.0
        }
    }

    /// Confusion: low dominance combined with weak valence
    pub fn confusion(&self) -> f64 {
        (1.0 - self.dominance) * (1.0 - self.valence.abs()) * 0.5
    }

    /// Check that every numeric field lies in its declared range
    pub fn is_in_range(&self) -> bool {
        (-1.0..=1.0).contains(&self.valence)
            && (0.0..=1.0).contains(&self.arousal)
            && (0.0..=1.0).contains(&self.dominance)
            && (0.0..=1.0).contains(&self.confidence)
    }
}

impl Default for Sentiment {
    fn default() -> Self {
        Self::neutral()
    }
}

fn clamp_or_zero(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0_f64.clamp(min, max)
    } else {
        value.clamp(min, max)
    }
}

/// A chat message sent to a completion model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new chat message
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }
}

/// One message of a conversation submitted for trajectory analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Message text
    pub content: String,

    /// Optional speaker role
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl ConversationMessage {
    /// Create a message with no role
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role: None,
        }
    }

    /// Attach a speaker role
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }
}

impl From<&str> for ConversationMessage {
    fn from(content: &str) -> Self {
        Self::new(content)
    }
}

impl From<String> for ConversationMessage {
    fn from(content: String) -> Self {
        Self::new(content)
    }
}

/// Direction of valence movement across a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trajectory {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

/// Where a conversation ended up emotionally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Positive,
    Negative,
    Neutral,
    Unknown,
}

/// Sign of a turning point relative to the preceding message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

/// A sharp local extremum in the valence series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurningPoint {
    /// Message index within the conversation
    pub index: usize,

    /// Valence at that message
    pub valence: f64,

    pub direction: Direction,

    /// Absolute change from the preceding message
    pub magnitude: f64,
}

/// Conversation-level aggregate produced by trajectory analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationResult {
    /// Recency-weighted aggregate sentiment
    pub overall: Sentiment,

    pub trajectory: Trajectory,

    pub turning_points: Vec<TurningPoint>,

    /// Message sentiment with the highest valence
    pub peak_positive: Sentiment,

    /// Message sentiment with the lowest valence
    pub peak_negative: Sentiment,

    /// Population standard deviation of per-message valence
    pub volatility: f64,

    pub resolution: Resolution,

    /// Number of per-message sentiments actually produced
    pub messages_analyzed: usize,

    /// Per-message sentiments, in input order
    #[serde(default)]
    pub per_message: Vec<Sentiment>,
}

impl ConversationResult {
    /// Result for a conversation with nothing to analyze
    pub fn empty() -> Self {
        Self {
            overall: Sentiment::neutral(),
            trajectory: Trajectory::InsufficientData,
            turning_points: Vec::new(),
            peak_positive: Sentiment::neutral(),
            peak_negative: Sentiment::neutral(),
            volatility: 0.0,
            resolution: Resolution::Unknown,
            messages_analyzed: 0,
            per_message: Vec::new(),
        }
    }
}
