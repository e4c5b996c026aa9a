//! Fusion engine integration tests
//!
//! Exercises strategy selection, escalation gating, blending, and
//! graceful degradation against mock providers.


use mock_providers::{neighbor, MockChat, MockEmbedder, MockReferenceStore};
use moodtrace_core::{Error, Sentiment};
use moodtrace_engine::config::{EmbeddingConfig, FusionConfig, ModelRouting, RemoteConfig};
use moodtrace_engine::fusion::{blend, BlendPlan};
use moodtrace_engine::{EmbeddingClassifier, FusionEngine, LexiconScorer, RemoteClassifier};
use moodtrace_telemetry::AnalysisMetrics;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// No lexicon hits: low confidence, neutral valence
const AMBIGUOUS: &str = "I went to the store today";

/// Three positive hits: full confidence, strongly positive
const CONFIDENT: &str = "This is excellent, wonderful, perfect!";

fn lexicon_only() -> FusionEngine {
    FusionEngine::new(LexiconScorer::new().unwrap(), FusionConfig::default())
}

fn engine(
    embedder: &Arc<MockEmbedder>,
    store: &Arc<MockReferenceStore>,
    chat: Option<&Arc<MockChat>>,
) -> FusionEngine {
    let mut engine = lexicon_only().with_embedding(EmbeddingClassifier::new(
        embedder.clone(),
        store.clone(),
        EmbeddingConfig::default(),
    ));
    if let Some(chat) = chat {
        let remote = RemoteClassifier::new(
            chat.clone(),
            &ModelRouting::default(),
            RemoteConfig::default(),
        )
        .unwrap();
        engine = engine.with_remote(remote);
    }
    engine
}

async fn baseline(text: &str) -> Sentiment {
    lexicon_only().analyze(text, &[]).await.unwrap()
}

fn has_label(s: &Sentiment, label: &str) -> bool {
    s.labels.iter().any(|l| l == label)
}

#[tokio::test]
async fn test_all_providers_failing_equals_lexicon() {
    let embedder = Arc::new(MockEmbedder::new().failing());
    let store = Arc::new(MockReferenceStore::empty());
    let chat = Arc::new(MockChat::new("{}").failing());

    let fused = engine(&embedder, &store, Some(&chat))
        .analyze(AMBIGUOUS, &[])
        .await
        .unwrap();

    assert_eq!(fused, baseline(AMBIGUOUS).await);
    assert_eq!(embedder.call_count(), 1);
    assert_eq!(store.call_count(), 0);
    assert_eq!(chat.call_count(), 1);
}

#[tokio::test]
async fn test_unparseable_remote_reply_is_dropped() {
    let embedder = Arc::new(MockEmbedder::new());
    let store = Arc::new(MockReferenceStore::empty());
    let chat = Arc::new(MockChat::new("The user seems fairly calm to me."));

    let fused = engine(&embedder, &store, Some(&chat))
        .analyze(AMBIGUOUS, &[])
        .await
        .unwrap();

    assert_eq!(fused, baseline(AMBIGUOUS).await);
    assert_eq!(chat.call_count(), 1);
}

#[tokio::test]
async fn test_confident_lexicon_skips_remote() {
    let embedder = Arc::new(MockEmbedder::new());
    let store = Arc::new(MockReferenceStore::empty());
    let chat = Arc::new(MockChat::verdict(-0.9, 0.9, 0.9, 1.0, "angry"));

    let fused = engine(&embedder, &store, Some(&chat))
        .analyze(CONFIDENT, &[])
        .await
        .unwrap();

    assert_eq!(chat.call_count(), 0);
    assert_eq!(fused.valence, 1.0);
    assert_eq!(fused.primary_emotion, "happy");
    assert!(has_label(&fused, "blend=lexicon"));
}

#[tokio::test]
async fn test_ambiguous_text_escalates_when_embedding_abstains() {
    let embedder = Arc::new(MockEmbedder::new());
    let store = Arc::new(MockReferenceStore::empty());
    let chat = Arc::new(MockChat::verdict(0.6, 0.4, 0.5, 0.9, "Happy"));

    let fused = engine(&embedder, &store, Some(&chat))
        .analyze(AMBIGUOUS, &[])
        .await
        .unwrap();

    assert_eq!(chat.call_count(), 1);
    assert_eq!(chat.last_model().as_deref(), Some("gpt-4o-mini"));
    // 0.7 * 0.6 + 0.3 * 0.0
    assert!((fused.valence - 0.42).abs() < 1e-9);
    assert_eq!(fused.confidence, 0.9);
    assert_eq!(fused.primary_emotion, "happy");
    assert!(has_label(&fused, "llm:gpt-4o-mini"));
    assert!(has_label(&fused, "blend=llm+lexicon"));
}

#[tokio::test]
async fn test_strong_embedding_skips_remote() {
    let embedder = Arc::new(MockEmbedder::new());
    let store = Arc::new(MockReferenceStore::new(vec![neighbor(0.9, 0.8, "happy")]));
    let chat = Arc::new(MockChat::verdict(-0.9, 0.9, 0.9, 1.0, "angry"));

    let fused = engine(&embedder, &store, Some(&chat))
        .analyze(AMBIGUOUS, &[])
        .await
        .unwrap();

    assert_eq!(chat.call_count(), 0);
    // embedding 0.68, lexicon 0.32
    assert!((fused.valence - 0.544).abs() < 1e-9);
    assert_eq!(fused.primary_emotion, "happy");
    assert!(has_label(&fused, "embedding_top1"));
    assert!(has_label(&fused, "blend=embedding+lexicon"));
}

#[tokio::test]
async fn test_weak_embedding_blends_all_three() {
    let embedder = Arc::new(MockEmbedder::new());
    // confidence 0.495, below the 0.55 escalation floor
    let store = Arc::new(MockReferenceStore::new(vec![neighbor(0.45, -0.4, "sad")]));
    let chat = Arc::new(MockChat::verdict(0.2, 0.5, 0.5, 0.9, "neutral"));

    let fused = engine(&embedder, &store, Some(&chat))
        .analyze(AMBIGUOUS, &[])
        .await
        .unwrap();

    assert_eq!(chat.call_count(), 1);
    // 0.5 * -0.4 + 0.3 * 0.2 + 0.2 * 0.0
    assert!((fused.valence + 0.14).abs() < 1e-9);
    assert_eq!(fused.primary_emotion, "sad");
    assert_eq!(fused.confidence, 0.9);
    assert!(has_label(&fused, "blend=embedding+llm+lexicon"));
}

#[tokio::test]
async fn test_no_neighbours_above_floor_falls_back() {
    let embedder = Arc::new(MockEmbedder::new());
    let store = Arc::new(MockReferenceStore::new(vec![
        neighbor(0.35, 0.9, "happy"),
        neighbor(0.30, 0.9, "happy"),
    ]));
    let metrics = AnalysisMetrics::new();

    let fused = engine(&embedder, &store, None)
        .with_metrics(metrics.clone())
        .analyze(AMBIGUOUS, &[])
        .await
        .unwrap();

    assert_eq!(fused, baseline(AMBIGUOUS).await);
    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.embedding_abstentions, 1);
    assert_eq!(snapshot.lexicon_only, 1);
    assert_eq!(snapshot.remote_escalations, 0);
}

#[tokio::test(start_paused = true)]
async fn test_slow_embedding_times_out() {
    let embedder = Arc::new(MockEmbedder::new().with_latency(Duration::from_secs(10)));
    let store = Arc::new(MockReferenceStore::new(vec![neighbor(0.9, 0.8, "happy")]));

    let fused = engine(&embedder, &store, None)
        .analyze(AMBIGUOUS, &[])
        .await
        .unwrap();

    assert_eq!(fused, baseline(AMBIGUOUS).await);
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn test_search_failure_abstains() {
    let embedder = Arc::new(MockEmbedder::new());
    let store = Arc::new(MockReferenceStore::new(vec![neighbor(0.9, 0.8, "happy")]).failing());
    let metrics = AnalysisMetrics::new();

    let fused = engine(&embedder, &store, None)
        .with_metrics(metrics.clone())
        .analyze(AMBIGUOUS, &[])
        .await
        .unwrap();

    assert_eq!(fused, baseline(AMBIGUOUS).await);
    assert_eq!(embedder.call_count(), 1);
    assert_eq!(store.call_count(), 1);
    assert_eq!(metrics.snapshot().embedding_abstentions, 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_search_times_out() {
    let embedder = Arc::new(MockEmbedder::new());
    let store = Arc::new(
        MockReferenceStore::new(vec![neighbor(0.9, 0.8, "happy")])
            .with_latency(Duration::from_secs(30)),
    );
    let metrics = AnalysisMetrics::new();

    let start = tokio::time::Instant::now();
    let fused = engine(&embedder, &store, None)
        .with_metrics(metrics.clone())
        .analyze(AMBIGUOUS, &[])
        .await
        .unwrap();

    assert_eq!(fused, baseline(AMBIGUOUS).await);
    assert_eq!(store.call_count(), 1);
    assert_eq!(metrics.snapshot().embedding_abstentions, 1);
    // search deadline is 10s
    assert!(start.elapsed() < Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_search_abstains_promptly() {
    let embedder = Arc::new(MockEmbedder::new());
    let store = Arc::new(
        MockReferenceStore::new(vec![neighbor(0.9, 0.8, "happy")])
            .with_latency(Duration::from_secs(8)),
    );
    let classifier =
        EmbeddingClassifier::new(embedder.clone(), store.clone(), EmbeddingConfig::default());

    let cancel = CancellationToken::new();
    let start = tokio::time::Instant::now();
    let (vote, _) = tokio::join!(classifier.classify(AMBIGUOUS, &[], &cancel), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });

    assert!(vote.is_none());
    assert_eq!(store.call_count(), 1);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_vote_limited_to_top_k() {
    let embedder = Arc::new(MockEmbedder::new());
    let mut neighbors = vec![neighbor(0.9, 0.8, "happy"); 7];
    neighbors.extend(vec![neighbor(0.9, -0.9, "sad"); 2]);
    let store = Arc::new(MockReferenceStore::new(neighbors).ignoring_k());
    let chat = Arc::new(MockChat::verdict(-0.9, 0.9, 0.9, 1.0, "angry"));

    let fused = engine(&embedder, &store, Some(&chat))
        .analyze(AMBIGUOUS, &[])
        .await
        .unwrap();

    // only the seven closest vote: embedding valence 0.8, weight 0.68
    assert!(has_label(&fused, "embedding_top7"));
    assert!((fused.valence - 0.544).abs() < 1e-9);
    assert_eq!(fused.primary_emotion, "happy");
    assert_eq!(chat.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_slow_remote_times_out() {
    let embedder = Arc::new(MockEmbedder::new());
    let store = Arc::new(MockReferenceStore::empty());
    let chat = Arc::new(
        MockChat::verdict(0.6, 0.4, 0.5, 0.9, "happy").with_latency(Duration::from_secs(30)),
    );
    let metrics = AnalysisMetrics::new();

    let fused = engine(&embedder, &store, Some(&chat))
        .with_metrics(metrics.clone())
        .analyze(AMBIGUOUS, &[])
        .await
        .unwrap();

    assert_eq!(fused, baseline(AMBIGUOUS).await);
    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.remote_escalations, 1);
    assert_eq!(snapshot.remote_failures, 1);
}

#[tokio::test]
async fn test_cancelled_before_start_returns_lexicon() {
    let embedder = Arc::new(MockEmbedder::new());
    let store = Arc::new(MockReferenceStore::new(vec![neighbor(0.9, 0.8, "happy")]));
    let chat = Arc::new(MockChat::verdict(0.6, 0.4, 0.5, 0.9, "happy"));
    let metrics = AnalysisMetrics::new();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let fused = engine(&embedder, &store, Some(&chat))
        .with_metrics(metrics.clone())
        .analyze_with_cancel(AMBIGUOUS, &[], &cancel)
        .await
        .unwrap();

    assert_eq!(fused, baseline(AMBIGUOUS).await);
    assert_eq!(chat.call_count(), 0);
    assert_eq!(metrics.snapshot().cancellations, 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_during_remote_call_returns_lexicon() {
    let embedder = Arc::new(MockEmbedder::new());
    let store = Arc::new(MockReferenceStore::empty());
    let chat = Arc::new(
        MockChat::verdict(0.6, 0.4, 0.5, 0.9, "happy").with_latency(Duration::from_secs(10)),
    );
    let engine = engine(&embedder, &store, Some(&chat));

    let cancel = CancellationToken::new();
    let (fused, _) = tokio::join!(engine.analyze_with_cancel(AMBIGUOUS, &[], &cancel), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });

    assert_eq!(fused.unwrap(), baseline(AMBIGUOUS).await);
    assert_eq!(chat.call_count(), 1);
}

#[tokio::test]
async fn test_context_reaches_remote_prompt() {
    let embedder = Arc::new(MockEmbedder::new());
    let store = Arc::new(MockReferenceStore::empty());
    let chat = Arc::new(MockChat::verdict(0.0, 0.2, 0.5, 0.8, "neutral"));

    let context = vec!["my order never arrived".to_string()];
    engine(&embedder, &store, Some(&chat))
        .analyze(AMBIGUOUS, &context)
        .await
        .unwrap();

    let messages = chat.last_messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[1].content.contains("my order never arrived"));
    assert!(messages[1].content.ends_with(AMBIGUOUS));
}

#[tokio::test]
async fn test_empty_text_is_rejected() {
    let embedder = Arc::new(MockEmbedder::new());
    let store = Arc::new(MockReferenceStore::empty());
    let engine = engine(&embedder, &store, None);

    for text in ["", "   ", "\n\t"] {
        let err = engine.analyze(text, &[]).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
    assert_eq!(embedder.call_count(), 0);
}

#[tokio::test]
async fn test_frustrated_message_without_providers() {
    let fused = lexicon_only()
        .analyze("This is terrible, I'm so frustrated!", &[])
        .await
        .unwrap();

    assert_eq!(fused.primary_emotion, "frustrated");
    assert!(fused.valence < -0.5);
    assert!(fused.frustration() > 0.0);
}

fn unit() -> impl Strategy<Value = f64> {
    0.0f64..=1.0
}

fn sentiment() -> impl Strategy<Value = Sentiment> {
    (-1.0f64..=1.0, unit(), unit(), unit())
        .prop_map(|(v, a, d, c)| Sentiment::new(v, a, d, c, "neutral"))
}

proptest! {
    #[test]
    fn blended_sentiment_stays_in_range(
        emb in sentiment(),
        llm in sentiment(),
        lex in sentiment(),
        has_emb in any::<bool>(),
        has_llm in any::<bool>(),
    ) {
        let plan = BlendPlan::resolve(has_emb, has_llm);
        let fused = blend(
            plan,
            &FusionConfig::default().weights,
            has_emb.then_some(&emb),
            has_llm.then_some(&llm),
            &lex,
        );
        prop_assert!(fused.is_in_range());
    }

    #[test]
    fn lexicon_only_analysis_stays_in_range(text in "[a-zA-Z!?' ]{1,120}") {
        prop_assume!(!text.trim().is_empty());
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let fused = runtime.block_on(lexicon_only().analyze(&text, &[])).unwrap();
        prop_assert!(fused.is_in_range());
    }
}
