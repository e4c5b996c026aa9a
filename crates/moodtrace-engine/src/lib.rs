//! MoodTrace Engine
//!
//! Multi-strategy sentiment analysis for conversational text.
//!
//! Three strategies score a message on valence, arousal, and dominance:
//! - Lexicon: word lists and cue phrases, always available
//! - Embedding: similarity-weighted vote over a labelled reference corpus
//! - Remote: a routed language model, consulted only when the cheaper
//!   strategies are unsure
//!
//! The [`FusionEngine`] blends whatever is available and degrades to the
//! lexicon when external providers fail. [`TrajectoryAnalyzer`] lifts
//! per-message results to a conversation, and [`ToneSelector`] maps a
//! sentiment to a recommended response tone.

pub mod config;
pub mod embedding;
pub mod fusion;
pub mod history;
pub mod lexicon;
pub mod providers;
pub mod remote;
pub mod service;
pub mod tone;
pub mod trajectory;

pub use config::{
    BlendWeights, EmbeddingConfig, EngineConfig, FusionConfig, LexiconConfig, ModelRouting,
    ProvidersConfig, RemoteConfig, TrajectoryConfig,
};
pub use embedding::EmbeddingClassifier;
pub use fusion::{BlendPlan, FusionEngine, Strategy};
pub use history::{HistoryEntry, SessionHistory};
pub use lexicon::{LexiconScore, LexiconScorer};
pub use providers::{
    ChatCompletionProvider, EmbeddingProvider, InMemoryReferenceStore, Neighbor,
    NeighborMetadata, OpenAiCompatibleClient, ReferenceEntry, ReferenceStore,
};
pub use remote::RemoteClassifier;
pub use service::{Providers, SentimentService};
pub use tone::{ToneProfile, ToneRule, ToneSelector};
pub use trajectory::TrajectoryAnalyzer;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::fusion::FusionEngine;
    pub use crate::lexicon::LexiconScorer;
    pub use crate::providers::{ChatCompletionProvider, EmbeddingProvider, ReferenceStore};
    pub use crate::service::{Providers, SentimentService};
    pub use crate::tone::ToneSelector;
    pub use crate::trajectory::TrajectoryAnalyzer;
    pub use moodtrace_core::{ConversationMessage, ConversationResult, Sentiment};
}
