//! OpenAI-compatible HTTP provider
//!
//! Speaks the `/embeddings` and `/chat/completions` endpoints:
//! ```text
//! POST {base}/embeddings        {"model": "...", "input": "text"}
//! POST {base}/chat/completions  {"model": "...", "messages": [...], "temperature": 0}
//! ```

use super::{ChatCompletionProvider, EmbeddingProvider};
use async_trait::async_trait;
use moodtrace_core::{ChatMessage, Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Client for any server exposing the OpenAI REST surface
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    embedding_model: String,
}

impl OpenAiCompatibleClient {
    pub fn new(base_url: impl Into<String>, embedding_model: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            embedding_model: embedding_model.into(),
        })
    }

    /// Authenticate with a bearer token
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn post(&self, path: &str, timeout: Duration) -> reqwest::RequestBuilder {
        let request = self
            .http
            .post(format!("{}/{}", self.base_url, path))
            .timeout(timeout);
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send<B, R>(&self, path: &str, body: &B, timeout: Duration) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .post(path, timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::provider(format!("{path} request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::provider(format!(
                "{path} returned {status}: {}",
                truncate(&detail, 200)
            )));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| Error::provider(format!("{path} returned malformed body: {e}")))
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiCompatibleClient {
    async fn embed(&self, text: &str, timeout: Duration) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: text,
        };
        let response: EmbeddingResponse = self.send("embeddings", &request, timeout).await?;

        let vector = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::provider("embeddings response contained no data"))?;

        debug!(dimensions = vector.len(), "embedding received");
        Ok(vector)
    }
}

#[async_trait]
impl ChatCompletionProvider for OpenAiCompatibleClient {
    async fn complete(
        &self,
        model_id: &str,
        messages: &[ChatMessage],
        timeout: Duration,
    ) -> Result<String> {
        let request = ChatRequest {
            model: model_id,
            messages,
            temperature: 0.0,
        };
        let response: ChatResponse = self.send("chat/completions", &request, timeout).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::provider("chat completion contained no content"))
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}
