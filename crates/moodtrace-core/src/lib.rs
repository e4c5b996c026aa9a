//! moodtrace Core
//!
//! Core types and error handling shared across moodtrace components.
//!
//! This crate provides:
//! - The `Sentiment` value object (valence/arousal/dominance affect scores)
//! - Conversation-level results (trajectory, turning points, resolution)
//! - Chat message types passed to remote models
//! - Error types and result handling

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    ChatMessage, ConversationMessage, ConversationResult, Direction, Resolution, Sentiment,
    Trajectory, TurningPoint,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{
        ChatMessage, ConversationMessage, ConversationResult, Sentiment, Trajectory,
    };
}
