//! MoodTrace CLI
//!
//! Scores messages and conversations for sentiment and recommends a
//! response tone. Results are printed as JSON.

use anyhow::Result;
use clap::{Parser, Subcommand};
use moodtrace_core::Sentiment;
use moodtrace_engine::{Providers, SentimentService};
use serde_json::json;
use std::path::PathBuf;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

mod config;

#[derive(Parser, Debug)]
#[command(name = "moodtrace")]
#[command(about = "Multi-strategy sentiment and conversation trajectory analysis", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "moodtrace.yaml")]
    config: PathBuf,

    /// OpenAI-compatible API base URL
    #[arg(short, long, env = "MOODTRACE_BASE_URL")]
    base_url: Option<String>,

    /// Model used for remote classification
    #[arg(short, long)]
    model: Option<String>,

    /// Use the lexicon only; never contact external providers
    #[arg(long)]
    offline: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a single message
    Message {
        text: String,

        /// Preceding messages, oldest first
        #[arg(long)]
        context: Vec<String>,
    },

    /// Analyze a conversation from a JSON file
    Conversation { file: PathBuf },

    /// Recommend a tone for explicit sentiment values
    Tone {
        #[arg(long, allow_negative_numbers = true)]
        valence: f64,

        #[arg(long)]
        arousal: f64,

        #[arg(long)]
        dominance: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays valid JSON
    init_tracing(cli.verbose);

    let overrides = config::Overrides {
        base_url: cli.base_url.clone(),
        model: cli.model.clone(),
        offline: cli.offline,
    };
    let engine_config = config::load(&cli.config, &overrides)?;

    let providers = if cli.offline {
        Providers::none()
    } else {
        Providers::from_config(&engine_config.providers)?
    };
    let service = SentimentService::new(engine_config, providers)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Interrupt received, cancelling analysis...");
        on_signal.cancel();
    });

    let output = match cli.command {
        Command::Message { text, context } => {
            let sentiment = service
                .analyze_message_with_cancel(&text, &context, &cancel)
                .await?;
            let tone = service.recommend_tone(&sentiment);
            json!({
                "sentiment": sentiment_json(&sentiment),
                "tone": tone,
            })
        }
        Command::Conversation { file } => {
            let messages = config::read_conversation(&file)?;
            info!("Analyzing {} messages from {}", messages.len(), file.display());
            let result = service
                .analyze_conversation_with_cancel(&messages, &cancel)
                .await?;
            let tone = service.recommend_conversation_tone(&result);
            json!({
                "conversation": result,
                "tone": tone,
            })
        }
        Command::Tone {
            valence,
            arousal,
            dominance,
        } => {
            let sentiment = Sentiment::new(valence, arousal, dominance, 1.0, "neutral");
            json!({ "tone": service.recommend_tone(&sentiment) })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);

    let snapshot = service.metrics().snapshot();
    info!(
        analyses = snapshot.total_analyses,
        avg_latency_us = snapshot.avg_latency_us(),
        escalation_rate = snapshot.escalation_rate(),
        degradation_rate = snapshot.degradation_rate(),
        "Done"
    );
    Ok(())
}

/// Sentiment plus its derived metrics
fn sentiment_json(sentiment: &Sentiment) -> serde_json::Value {
    json!({
        "valence": sentiment.valence,
        "arousal": sentiment.arousal,
        "dominance": sentiment.dominance,
        "confidence": sentiment.confidence,
        "primary_emotion": sentiment.primary_emotion,
        "labels": sentiment.labels,
        "frustration": sentiment.frustration(),
        "satisfaction": sentiment.satisfaction(),
        "confusion": sentiment.confusion(),
    })
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("moodtrace=debug,moodtrace_engine=debug,moodtrace_telemetry=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("moodtrace=info,moodtrace_engine=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
