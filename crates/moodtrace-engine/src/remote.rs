//! Remote language-model sentiment classification
//!
//! Unlike the embedding voter, this strategy fails rather than abstains:
//! invoking it is an explicit, costly decision made by the fusion engine.

use crate::config::{ModelRouting, RemoteConfig};
use crate::providers::{bounded, ChatCompletionProvider};
use moodtrace_core::{ChatMessage, Error, Result, Sentiment};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const SYSTEM_PROMPT: &str = "You are an affect analysis service. Rate the emotional content of \
the user's message on three axes: valence from -1 (very negative) to 1 (very positive), \
arousal from 0 (calm) to 1 (excited), dominance from 0 (submissive) to 1 (assertive). \
Respond with a single JSON object and nothing else, using exactly these keys: \
\"valence\", \"arousal\", \"dominance\", \"confidence\" (0 to 1), \"primary_emotion\" \
(one of neutral, happy, sad, frustrated, confused, excited, assertive, anxious, angry), \
\"labels\" (a short list of descriptive tags).";

pub struct RemoteClassifier {
    provider: Arc<dyn ChatCompletionProvider>,
    model_id: String,
    config: RemoteConfig,
}

impl RemoteClassifier {
    /// Create a classifier whose model is resolved through `routing`
    pub fn new(
        provider: Arc<dyn ChatCompletionProvider>,
        routing: &ModelRouting,
        config: RemoteConfig,
    ) -> Result<Self> {
        let model_id = routing
            .resolve(&config.task)
            .ok_or_else(|| {
                Error::config(format!("No model routed for task '{}'", config.task))
            })?
            .to_string();

        Ok(Self {
            provider,
            model_id,
            config,
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Ask the routed model to score `text`, with recent `context`
    pub async fn classify(
        &self,
        text: &str,
        context: &[String],
        cancel: &CancellationToken,
    ) -> Result<Sentiment> {
        let messages = build_prompt(text, context, self.config.context_messages);
        debug!(model = %self.model_id, "requesting remote sentiment classification");

        let raw = bounded(
            self.config.timeout(),
            cancel,
            self.provider
                .complete(&self.model_id, &messages, self.config.timeout()),
        )
        .await?;

        let sentiment = parse_response(&raw)?;
        Ok(sentiment.with_label(format!("llm:{}", self.model_id)))
    }
}

/// Build the chat transcript sent to the model
pub fn build_prompt(text: &str, context: &[String], max_context: usize) -> Vec<ChatMessage> {
    let mut user = String::new();
    let start = context.len().saturating_sub(max_context);
    let recent = &context[start..];
    if !recent.is_empty() {
        user.push_str("Recent conversation context:\n");
        for line in recent {
            user.push_str("- ");
            user.push_str(line);
            user.push('\n');
        }
        user.push('\n');
    }
    user.push_str("Message to analyze:\n");
    user.push_str(text);

    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)]
}

#[derive(Debug, Deserialize)]
struct RemoteVerdict {
    valence: Option<f64>,
    arousal: Option<f64>,
    dominance: Option<f64>,
    confidence: Option<f64>,
    #[serde(default)]
    primary_emotion: Option<Value>,
    /// Non-string entries are dropped
    #[serde(default)]
    labels: Option<Vec<Value>>,
}

/// Parse the first balanced JSON object in a model reply
pub fn parse_response(raw: &str) -> Result<Sentiment> {
    let block = extract_json_object(raw)
        .ok_or_else(|| Error::unparseable("no JSON object in model response"))?;

    let verdict: RemoteVerdict = serde_json::from_str(block)
        .map_err(|e| Error::unparseable(format!("invalid JSON object: {e}")))?;

    let required = |name: &str, value: Option<f64>| {
        value
            .filter(|v| v.is_finite())
            .ok_or_else(|| Error::unparseable(format!("missing numeric field '{name}'")))
    };
    let valence = required("valence", verdict.valence)?;
    let arousal = required("arousal", verdict.arousal)?;
    let dominance = required("dominance", verdict.dominance)?;
    let confidence = required("confidence", verdict.confidence)?;

    let primary_emotion = verdict
        .primary_emotion
        .as_ref()
        .and_then(Value::as_str)
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| "neutral".to_string());

    let mut labels = vec!["llm".to_string()];
    labels.extend(
        verdict
            .labels
            .into_iter()
            .flatten()
            .filter_map(|label| label.as_str().map(str::to_string)),
    );

    Ok(Sentiment::new(valence, arousal, dominance, confidence, primary_emotion).with_labels(labels))
}

/// First balanced `{...}` substring, skipping braces inside JSON strings
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
