//! CLI configuration loading and input files

use moodtrace_core::ConversationMessage;
use moodtrace_engine::EngineConfig;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Command-line overrides applied on top of the config file
#[derive(Debug, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub offline: bool,
}

/// Load engine configuration from file (defaults when absent) and apply overrides
pub fn load(config_path: &Path, overrides: &Overrides) -> anyhow::Result<EngineConfig> {
    let mut config = if config_path.exists() {
        debug!("Loading configuration from {}", config_path.display());
        EngineConfig::from_file(config_path)?
    } else {
        debug!(
            "No configuration at {}, using defaults",
            config_path.display()
        );
        EngineConfig::default()
    };

    if let Some(base_url) = &overrides.base_url {
        config.providers.base_url = Some(base_url.clone());
    }

    if let Some(model) = &overrides.model {
        let task = config.remote.task.clone();
        config.routing.set(task, model.clone());
    }

    if overrides.offline {
        config.embedding.enabled = false;
        config.remote.enabled = false;
    }

    config.validate()?;
    Ok(config)
}

/// Conversation file: a JSON array of strings or of message objects
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ConversationFile {
    Texts(Vec<String>),
    Messages(Vec<ConversationMessage>),
    Wrapped { messages: Vec<ConversationMessage> },
}

/// Read a conversation from a JSON file
pub fn read_conversation(path: &Path) -> anyhow::Result<Vec<ConversationMessage>> {
    let content = std::fs::read_to_string(path)?;
    parse_conversation(&content)
}

pub fn parse_conversation(content: &str) -> anyhow::Result<Vec<ConversationMessage>> {
    let file: ConversationFile = serde_json::from_str(content)
        .map_err(|e| anyhow::anyhow!("Invalid conversation file: {}", e))?;

    Ok(match file {
        ConversationFile::Texts(texts) => texts.into_iter().map(ConversationMessage::from).collect(),
        ConversationFile::Messages(messages) | ConversationFile::Wrapped { messages } => messages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load(Path::new("/nonexistent/moodtrace.yaml"), &Overrides::default()).unwrap();
        assert!(config.remote.enabled);
        assert_eq!(config.routing.resolve("sentiment"), Some("gpt-4o-mini"));
    }

    #[test]
    fn test_overrides_applied() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "trajectory:\n  concurrency: 2").unwrap();

        let overrides = Overrides {
            base_url: Some("http://localhost:8000/v1".to_string()),
            model: Some("local-model".to_string()),
            offline: true,
        };
        let config = load(file.path(), &overrides).unwrap();

        assert_eq!(config.trajectory.concurrency, 2);
        assert_eq!(
            config.providers.base_url.as_deref(),
            Some("http://localhost:8000/v1")
        );
        assert_eq!(config.routing.resolve("sentiment"), Some("local-model"));
        assert!(!config.embedding.enabled);
        assert!(!config.remote.enabled);
    }

    #[test]
    fn test_invalid_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "embedding:\n  min_similarity: 3.0").unwrap();

        assert!(load(file.path(), &Overrides::default()).is_err());
    }

    #[test]
    fn test_conversation_formats() {
        let texts = parse_conversation(r#"["hi", "this is broken"]"#).unwrap();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[1].content, "this is broken");

        let messages =
            parse_conversation(r#"[{"content": "hi", "role": "user"}, {"content": "hello"}]"#)
                .unwrap();
        assert_eq!(messages[0].role.as_deref(), Some("user"));
        assert_eq!(messages[1].role, None);

        let wrapped = parse_conversation(r#"{"messages": [{"content": "hi"}]}"#).unwrap();
        assert_eq!(wrapped.len(), 1);

        assert!(parse_conversation(r#"{"text": "nope"}"#).is_err());
    }
}
