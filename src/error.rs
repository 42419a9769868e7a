//! Error types for the content pipeline

use thiserror::Error;

/// Pipeline error type
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No capability is registered for the file extension
    #[error("unsupported file type: {extension}")]
    UnsupportedFileType {
        /// Extension as resolved from the path (may be empty)
        extension: String,
    },

    /// File is larger than its capability allows
    #[error("file size {size} bytes exceeds the {limit} byte size limit")]
    SizeExceeded {
        /// Declared file size
        size: u64,
        /// Capability limit
        limit: u64,
    },

    /// An extraction or task strategy failed
    #[error("strategy '{strategy}' failed: {message}")]
    Strategy {
        /// Strategy name
        strategy: String,
        /// Failure detail
        message: String,
    },

    /// Malformed capability or strategy registry
    #[error("invalid registry: {0}")]
    InvalidRegistry(String),

    /// Invalid configuration value
    #[error("invalid configuration: {field}: {message}")]
    InvalidConfig {
        /// Config field name
        field: String,
        /// Detailed message
        message: String,
    },

    /// Unknown agent id
    #[error("agent not found: {0}")]
    AgentNotFound(String),

    /// Status change out of a terminal task state
    #[error("invalid task transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store error: {0}")]
    Store(#[from] sled::Error),
}

impl PipelineError {
    pub fn strategy(strategy: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Strategy {
            strategy: strategy.into(),
            message: message.into(),
        }
    }

    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, PipelineError>;
