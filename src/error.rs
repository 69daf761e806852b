// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WorklogError>;

#[derive(Error, Debug)]
pub enum WorklogError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{service} API error: {message}")]
    RemoteApi { service: String, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Encryption error: {0}")]
    Crypto(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorklogError {
    pub fn remote(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteApi {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Configuration problems are detected before any network traffic.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
