//! Configuration for the LLM backend and sessions

use crate::error::{LlmError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default Anthropic model
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

/// Default Anthropic API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Default per-response token cap
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Default bound on tool-call rounds within one turn
pub const DEFAULT_MAX_ROUNDS: usize = 30;

/// Resolved LLM backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key for the backend
    pub api_key: String,

    /// Model identifier
    pub model: String,

    /// API base URL
    pub base_url: String,

    /// Maximum tokens per response
    pub max_tokens: u32,

    /// Sampling temperature (backend default when unset)
    pub temperature: Option<f32>,

    /// Bounded retries for transient backend failures
    pub max_retries: u32,
}

impl LlmConfig {
    /// Create a configuration with defaults for everything but key and model
    pub fn new<S: Into<String>>(api_key: S, model: S) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            max_retries: 2,
        }
    }

    /// Resolve configuration from the environment.
    ///
    /// Reads `ANTHROPIC_API_KEY` (required), `ANTHROPIC_MODEL`, and
    /// `ANTHROPIC_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| LlmError::Authentication {
            message: "ANTHROPIC_API_KEY is not set".to_string(),
        })?;
        let mut config = Self::new(api_key, String::new());
        config.model =
            std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        if let Ok(base_url) = std::env::var("ANTHROPIC_BASE_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }
}

/// Configuration for a conversation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Resolved system prompt text
    pub system_prompt: String,

    /// On-disk directory backing the `/memories` root
    pub memory_root: PathBuf,

    /// Directory for session trace files; `None` keeps traces in memory only
    pub sessions_dir: Option<PathBuf>,

    /// Bound on tool-call rounds per turn; exceeding it fails the turn
    pub max_rounds: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            system_prompt: String::new(),
            memory_root: PathBuf::from("memory/memories"),
            sessions_dir: Some(PathBuf::from("sessions")),
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }
}

impl SessionConfig {
    /// Set the system prompt
    pub fn with_system_prompt<S: Into<String>>(mut self, system_prompt: S) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    /// Set the memory root directory
    pub fn with_memory_root<P: Into<PathBuf>>(mut self, memory_root: P) -> Self {
        self.memory_root = memory_root.into();
        self
    }

    /// Set the sessions directory (or disable persistence with `None`)
    pub fn with_sessions_dir(mut self, sessions_dir: Option<PathBuf>) -> Self {
        self.sessions_dir = sessions_dir;
        self
    }

    /// Set the per-turn round bound
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }
}
