//! Configuration for scoring strategies, fusion, and trajectory analysis
//!
//! Every field carries a default so an empty YAML document is a valid
//! configuration. The escalation thresholds and blend weights are
//! empirically chosen; they are exposed here rather than re-derived.

use crate::tone::ToneRule;
use moodtrace_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub lexicon: LexiconConfig,
    pub embedding: EmbeddingConfig,
    pub remote: RemoteConfig,
    pub fusion: FusionConfig,
    pub trajectory: TrajectoryConfig,

    /// Model catalog used to resolve model ids by task
    pub routing: ModelRouting,

    pub providers: ProvidersConfig,

    /// Custom tone profiles; the built-in table is used when empty
    pub tone_profiles: Vec<ToneRule>,
}

impl EngineConfig {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse engine config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Reject thresholds and weights that would break range guarantees
    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, value: f64| -> Result<()> {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(Error::config(format!("{name} must be within [0, 1], got {value}")))
            }
        };

        unit("embedding.min_similarity", self.embedding.min_similarity)?;
        unit(
            "fusion.embedding_confidence_threshold",
            self.fusion.embedding_confidence_threshold,
        )?;
        unit(
            "fusion.lexicon_confidence_threshold",
            self.fusion.lexicon_confidence_threshold,
        )?;
        unit(
            "fusion.ambiguous_valence_threshold",
            self.fusion.ambiguous_valence_threshold,
        )?;
        unit(
            "fusion.weights.llm_share_to_embedding",
            self.fusion.weights.llm_share_to_embedding,
        )?;

        let w = &self.fusion.weights;
        for (name, value) in [
            ("embedding", w.embedding),
            ("llm", w.llm),
            ("lexicon", w.lexicon),
            ("llm_with_lexicon", w.llm_with_lexicon),
            ("lexicon_with_llm", w.lexicon_with_llm),
        ] {
            if !(value > 0.0) {
                return Err(Error::config(format!(
                    "fusion.weights.{name} must be positive, got {value}"
                )));
            }
        }

        if self.embedding.top_k == 0 {
            return Err(Error::config("embedding.top_k must be at least 1"));
        }
        if self.trajectory.concurrency == 0 {
            return Err(Error::config("trajectory.concurrency must be at least 1"));
        }
        if !(self.trajectory.recency_decay > 0.0 && self.trajectory.recency_decay <= 1.0) {
            return Err(Error::config(format!(
                "trajectory.recency_decay must be within (0, 1], got {}",
                self.trajectory.recency_decay
            )));
        }

        Ok(())
    }
}

/// Lexicon word-set extensions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    pub extra_positive: Vec<String>,
    pub extra_negative: Vec<String>,
}

/// Nearest-neighbour voting parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub enabled: bool,

    /// Neighbours requested from the reference store
    pub top_k: usize,

    /// Neighbours below this similarity are ignored
    pub min_similarity: f64,

    /// Reference corpus category to search
    pub category: String,

    pub embed_timeout_ms: u64,
    pub search_timeout_ms: u64,
}

impl EmbeddingConfig {
    pub fn embed_timeout(&self) -> Duration {
        Duration::from_millis(self.embed_timeout_ms)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_millis(self.search_timeout_ms)
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            top_k: 7,
            min_similarity: 0.40,
            category: "sentiment_reference".to_string(),
            embed_timeout_ms: 5_000,
            search_timeout_ms: 10_000,
        }
    }
}

/// Remote model classification parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub enabled: bool,
    pub timeout_ms: u64,

    /// Routing task whose model is used
    pub task: String,

    /// Context messages included in the prompt
    pub context_messages: usize,
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 20_000,
            task: "sentiment".to_string(),
            context_messages: 3,
        }
    }
}

/// Escalation gate and blend weights
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Remote escalation is considered when embedding confidence is below this
    pub embedding_confidence_threshold: f64,

    /// ...and lexicon confidence is below this
    pub lexicon_confidence_threshold: f64,

    /// ...or lexicon |valence| is below this
    pub ambiguous_valence_threshold: f64,

    pub weights: BlendWeights,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            embedding_confidence_threshold: 0.55,
            lexicon_confidence_threshold: 0.6,
            ambiguous_valence_threshold: 0.3,
            weights: BlendWeights::default(),
        }
    }
}

/// Weight table for the blend plans
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendWeights {
    /// All three present
    pub embedding: f64,
    pub llm: f64,
    pub lexicon: f64,

    /// Fraction of the LLM weight the embedding absorbs when the LLM is
    /// absent; the lexicon takes the rest
    pub llm_share_to_embedding: f64,

    /// LLM + lexicon only
    pub llm_with_lexicon: f64,
    pub lexicon_with_llm: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            embedding: 0.50,
            llm: 0.30,
            lexicon: 0.20,
            llm_share_to_embedding: 0.6,
            llm_with_lexicon: 0.70,
            lexicon_with_llm: 0.30,
        }
    }
}

/// Conversation-level analysis parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryConfig {
    /// Concurrent per-message analyses
    pub concurrency: usize,

    /// Other messages supplied as context to each analysis
    pub context_window: usize,

    /// Per-step decay of the recency weighting
    pub recency_decay: f64,

    pub min_messages_for_trajectory: usize,
    pub trend_threshold: f64,
    pub turning_point_threshold: f64,
    pub resolution_window: usize,
    pub resolution_threshold: f64,

    /// Message count at which overall confidence saturates
    pub confidence_saturation: usize,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            context_window: 3,
            recency_decay: 0.5,
            min_messages_for_trajectory: 4,
            trend_threshold: 0.3,
            turning_point_threshold: 0.5,
            resolution_window: 3,
            resolution_threshold: 0.3,
            confidence_saturation: 5,
        }
    }
}

/// Task → model id catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelRouting {
    pub models: HashMap<String, String>,
}

impl ModelRouting {
    /// Resolve the model id configured for `task`
    pub fn resolve(&self, task: &str) -> Option<&str> {
        self.models.get(task).map(String::as_str)
    }

    /// Route `task` to `model`
    pub fn set(&mut self, task: impl Into<String>, model: impl Into<String>) {
        self.models.insert(task.into(), model.into());
    }
}

impl Default for ModelRouting {
    fn default() -> Self {
        let mut models = HashMap::new();
        models.insert("sentiment".to_string(), "gpt-4o-mini".to_string());
        Self { models }
    }
}

/// Connection settings for the bundled provider implementations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// OpenAI-compatible API base URL; providers are disabled when unset
    pub base_url: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,

    pub embedding_model: String,

    /// JSON file with labelled reference entries
    pub reference_corpus: Option<PathBuf>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            reference_corpus: None,
        }
    }
}
