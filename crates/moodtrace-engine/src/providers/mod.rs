//! External collaborator interfaces
//!
//! The engine reaches embeddings, vector search, and chat completion only
//! through these traits. Bundled implementations:
//! - [`OpenAiCompatibleClient`]: embeddings and chat over HTTP
//! - [`InMemoryReferenceStore`]: brute-force cosine search over a loaded corpus

pub mod memory;
pub mod openai;

pub use memory::InMemoryReferenceStore;
pub use openai::OpenAiCompatibleClient;

use async_trait::async_trait;
use moodtrace_core::{ChatMessage, Error, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Produces embedding vectors for text
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str, timeout: Duration) -> Result<Vec<f32>>;
}

/// Nearest-neighbour search over a labelled reference corpus
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    /// Up to `k` neighbours in `category`, most similar first
    async fn nearest_neighbors(
        &self,
        vector: &[f32],
        category: &str,
        k: usize,
        timeout: Duration,
    ) -> Result<Vec<Neighbor>>;
}

/// Chat completion against a routed model
#[async_trait]
pub trait ChatCompletionProvider: Send + Sync {
    /// Raw text of the model's reply
    async fn complete(
        &self,
        model_id: &str,
        messages: &[ChatMessage],
        timeout: Duration,
    ) -> Result<String>;
}

/// One row of the labelled reference corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub text: String,
    pub embedding: Vec<f32>,
    pub sentiment_label: String,
    pub primary_emotion: String,
    pub valence: f64,
    pub arousal: f64,
    pub dominance: f64,

    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    "sentiment_reference".to_string()
}

/// A reference entry returned by a similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub text: String,

    /// Cosine similarity in `[0, 1]`
    pub similarity: f64,

    pub metadata: NeighborMetadata,
}

/// Affect labels attached to a reference entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborMetadata {
    pub valence: f64,
    pub arousal: f64,
    pub dominance: f64,
    pub primary_emotion: String,
}

/// Run a provider call under both a deadline and the caller's cancellation.
///
/// Cancellation wins over a simultaneously ready result.
pub(crate) async fn bounded<T, F>(
    timeout: Duration,
    cancel: &CancellationToken,
    call: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        outcome = tokio::time::timeout(timeout, call) => match outcome {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout),
        },
    }
}
