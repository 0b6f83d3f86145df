//! Error types and handling for Memoro Core

use thiserror::Error;

/// Result type alias for Memoro operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Memoro Core
#[derive(Error, Debug)]
pub enum Error {
    /// Memory store errors
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    /// LLM client errors
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Session trace errors
    #[error("Trace error: {0}")]
    Trace(#[from] TraceError),

    /// Session / turn errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Memory store errors
///
/// Every variant except `Io` is deterministic given the file-system state and
/// is fed back to the model as a tool-result error rather than aborting the
/// turn.
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Path escapes the memory root: {path}")]
    PathTraversal { path: String },

    #[error("File not found: {path}")]
    NotFound { path: String },

    #[error("File already exists: {path}")]
    AlreadyExists { path: String },

    #[error("old_str occurred {matches} times; it must match exactly once")]
    AmbiguousMatch { matches: usize },

    #[error("Invalid memory command: {message}")]
    InvalidCommand { message: String },

    #[error("IO failure on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// LLM client errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },
}

impl LlmError {
    /// Whether a bounded retry with backoff is worthwhile.
    ///
    /// Only transient transport conditions qualify; everything else is
    /// deterministic and surfaces immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Network { .. } => true,
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Session trace errors
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Failed to persist session trace: {message}")]
    Persist { message: String },

    #[error("Failed to load session trace: {path}")]
    Load { path: String },

    #[error("Invalid session trace format")]
    InvalidFormat,
}

/// Session / turn errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Tool-call round limit exceeded: {max_rounds}")]
    RoundLimitExceeded { max_rounds: usize },
}
