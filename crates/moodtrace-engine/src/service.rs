//! Service facade wiring the strategies, trajectory analysis, and tone
//! selection together from an [`EngineConfig`]

use crate::config::{EngineConfig, ProvidersConfig};
use crate::embedding::EmbeddingClassifier;
use crate::fusion::FusionEngine;
use crate::history::SessionHistory;
use crate::lexicon::LexiconScorer;
use crate::providers::{
    ChatCompletionProvider, EmbeddingProvider, InMemoryReferenceStore, OpenAiCompatibleClient,
    ReferenceStore,
};
use crate::remote::RemoteClassifier;
use crate::tone::{ToneProfile, ToneSelector};
use crate::trajectory::TrajectoryAnalyzer;
use moodtrace_core::{ConversationMessage, ConversationResult, Result, Sentiment};
use moodtrace_telemetry::AnalysisMetrics;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// External collaborators available to the engine
#[derive(Clone, Default)]
pub struct Providers {
    pub embedding: Option<Arc<dyn EmbeddingProvider>>,
    pub reference_store: Option<Arc<dyn ReferenceStore>>,
    pub chat: Option<Arc<dyn ChatCompletionProvider>>,
}

impl Providers {
    /// No external providers; analysis is lexicon-only
    pub fn none() -> Self {
        Self::default()
    }

    /// Build the bundled HTTP client and in-memory reference store
    pub fn from_config(config: &ProvidersConfig) -> Result<Self> {
        let mut providers = Self::none();

        if let Some(base_url) = &config.base_url {
            let mut client = OpenAiCompatibleClient::new(base_url.as_str(), &config.embedding_model)?;
            match std::env::var(&config.api_key_env) {
                Ok(key) if !key.is_empty() => client = client.with_api_key(key),
                _ => warn!(
                    "{} is not set; sending provider requests without credentials",
                    config.api_key_env
                ),
            }
            let client = Arc::new(client);
            providers.embedding = Some(client.clone());
            providers.chat = Some(client);
        }

        if let Some(path) = &config.reference_corpus {
            let store = InMemoryReferenceStore::from_json_file(path)?;
            providers.reference_store = Some(Arc::new(store));
        }

        Ok(providers)
    }
}

/// Entry point for message, conversation, and tone analysis
pub struct SentimentService {
    engine: Arc<FusionEngine>,
    trajectory: TrajectoryAnalyzer,
    tone: ToneSelector,
    metrics: AnalysisMetrics,
    context_window: usize,
}

impl SentimentService {
    /// Assemble a service; strategies whose providers are missing or that
    /// are disabled in `config` are left out
    pub fn new(config: EngineConfig, providers: Providers) -> Result<Self> {
        config.validate()?;
        let metrics = AnalysisMetrics::new();

        let lexicon = LexiconScorer::with_config(&config.lexicon)?;
        let mut engine =
            FusionEngine::new(lexicon, config.fusion.clone()).with_metrics(metrics.clone());

        match (
            config.embedding.enabled,
            providers.embedding,
            providers.reference_store,
        ) {
            (true, Some(embedder), Some(store)) => {
                engine = engine.with_embedding(EmbeddingClassifier::new(
                    embedder,
                    store,
                    config.embedding.clone(),
                ));
                info!("Embedding strategy enabled");
            }
            (true, _, _) => info!("Embedding strategy unavailable: provider or reference store missing"),
            (false, _, _) => info!("Embedding strategy disabled"),
        }

        match (config.remote.enabled, providers.chat) {
            (true, Some(chat)) => {
                let remote = RemoteClassifier::new(chat, &config.routing, config.remote.clone())?;
                info!("Remote strategy enabled (model: {})", remote.model_id());
                engine = engine.with_remote(remote);
            }
            (true, None) => info!("Remote strategy unavailable: no chat provider"),
            (false, _) => info!("Remote strategy disabled"),
        }

        let engine = Arc::new(engine);
        let trajectory = TrajectoryAnalyzer::new(engine.clone(), config.trajectory.clone());
        let tone = ToneSelector::with_rules(config.tone_profiles);

        Ok(Self {
            engine,
            trajectory,
            tone,
            metrics,
            context_window: config.trajectory.context_window,
        })
    }

    /// Lexicon-only service with default configuration
    pub fn offline() -> Result<Self> {
        Self::new(EngineConfig::default(), Providers::none())
    }

    pub fn engine(&self) -> &Arc<FusionEngine> {
        &self.engine
    }

    pub fn metrics(&self) -> &AnalysisMetrics {
        &self.metrics
    }

    pub async fn analyze_message(&self, text: &str, context: &[String]) -> Result<Sentiment> {
        self.engine.analyze(text, context).await
    }

    pub async fn analyze_message_with_cancel(
        &self,
        text: &str,
        context: &[String],
        cancel: &CancellationToken,
    ) -> Result<Sentiment> {
        self.engine.analyze_with_cancel(text, context, cancel).await
    }

    /// Analyze with the session's recent messages as context, then record
    /// the result in the session
    pub async fn analyze_message_recorded(
        &self,
        text: &str,
        history: &mut SessionHistory,
    ) -> Result<Sentiment> {
        let context = history.recent_texts(self.context_window);
        let sentiment = self.engine.analyze(text, &context).await?;
        history.push(text, sentiment.clone());
        Ok(sentiment)
    }

    pub async fn analyze_conversation(
        &self,
        messages: &[ConversationMessage],
    ) -> Result<ConversationResult> {
        self.trajectory.analyze(messages).await
    }

    pub async fn analyze_conversation_with_cancel(
        &self,
        messages: &[ConversationMessage],
        cancel: &CancellationToken,
    ) -> Result<ConversationResult> {
        self.trajectory.analyze_with_cancel(messages, cancel).await
    }

    pub fn recommend_tone(&self, sentiment: &Sentiment) -> ToneProfile {
        self.tone.select_tone(sentiment)
    }

    pub fn recommend_conversation_tone(&self, result: &ConversationResult) -> ToneProfile {
        self.tone.select_tone_for_conversation(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moodtrace_core::{Resolution, Trajectory};

    #[tokio::test]
    async fn test_offline_message() {
        let service = SentimentService::offline().unwrap();
        let s = service
            .analyze_message("This is excellent, thank you so much!", &[])
            .await
            .unwrap();

        assert!(s.valence > 0.0);
        assert!(s.labels.iter().any(|l| l == "blend=lexicon"));
        assert_eq!(service.metrics().snapshot().total_analyses, 1);
    }

    #[tokio::test]
    async fn test_recorded_history() {
        let service = SentimentService::offline().unwrap();
        let mut history = SessionHistory::new();

        service
            .analyze_message_recorded("hello there", &mut history)
            .await
            .unwrap();
        service
            .analyze_message_recorded("this is terrible and broken", &mut history)
            .await
            .unwrap();

        assert_eq!(history.len(), 2);
        assert!(history.latest().unwrap().sentiment.valence < 0.0);
    }

    #[tokio::test]
    async fn test_empty_message_not_recorded() {
        let service = SentimentService::offline().unwrap();
        let mut history = SessionHistory::new();

        assert!(service
            .analyze_message_recorded("   ", &mut history)
            .await
            .is_err());
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_conversation_and_tone() {
        let service = SentimentService::offline().unwrap();
        let messages: Vec<ConversationMessage> = [
            "This is terrible, nothing works",
            "I hate this broken app",
            "Okay that helped a bit",
            "Great, it works now",
            "Thanks, this is perfect",
            "Excellent, wonderful support",
        ]
        .into_iter()
        .map(ConversationMessage::from)
        .collect();

        let result = service.analyze_conversation(&messages).await.unwrap();
        assert_eq!(result.messages_analyzed, 6);
        assert_eq!(result.trajectory, Trajectory::Improving);
        assert_eq!(result.resolution, Resolution::Positive);

        let tone = service.recommend_conversation_tone(&result);
        assert!(!tone.name.is_empty());
    }

    #[test]
    fn test_remote_without_route_fails() {
        use crate::providers::ChatCompletionProvider;
        use moodtrace_core::ChatMessage;
        use std::time::Duration;

        struct Silent;
        #[async_trait::async_trait]
        impl ChatCompletionProvider for Silent {
            async fn complete(&self, _: &str, _: &[ChatMessage], _: Duration) -> Result<String> {
                Ok("{}".to_string())
            }
        }

        let mut config = EngineConfig::default();
        config.routing.models.clear();
        let providers = Providers {
            chat: Some(Arc::new(Silent)),
            ..Providers::none()
        };
        assert!(SentimentService::new(config, providers).is_err());
    }

    #[test]
    fn test_providers_from_default_config_are_empty() {
        let providers = Providers::from_config(&ProvidersConfig::default()).unwrap();
        assert!(providers.embedding.is_none());
        assert!(providers.chat.is_none());
        assert!(providers.reference_store.is_none());
    }
}
