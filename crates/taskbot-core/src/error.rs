use thiserror::Error;

/// Top-level error type for taskbot.
#[derive(Debug, Error)]
pub enum TaskbotError {
    /// Task or inbox persistence error.
    #[error("store error: {0}")]
    Store(String),

    /// Error from a messaging channel (decoding or delivery).
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
