//! Error types for moodtrace

/// Result type alias using moodtrace's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for moodtrace operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller supplied text the engine cannot analyze (e.g. empty)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Embedding, vector search, or remote model call failed
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Remote model answered without a usable JSON object
    #[error("unparseable response: {0}")]
    UnparseableResponse(String),

    /// The caller cancelled the operation
    #[error("operation cancelled")]
    Cancelled,

    /// Timeout errors
    #[error("operation timed out")]
    Timeout,

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::ProviderUnavailable(msg.into())
    }

    /// Create a new unparseable response error
    pub fn unparseable(msg: impl Into<String>) -> Self {
        Self::UnparseableResponse(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether a strategy hitting this error should simply be treated as absent.
    ///
    /// Only input validation and cancellation are caller-visible.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidInput(_) | Self::Cancelled)
    }
}
