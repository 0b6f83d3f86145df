//! # Memoro Core
//!
//! Core library for Memoro - a conversational agent that autonomously reads
//! and writes its own long-term memory files.
//!
//! This library provides the building blocks of the runtime: a sandboxed
//! memory store driven by a closed command set, the tool-execution loop that
//! mediates between an LLM backend and that store, a per-session trace
//! recorder, and the stream-event protocol surfacing turn progress to a
//! consumer.

// Core modules
pub mod config;
pub mod error;
pub mod llm;
pub mod memory;
pub mod prompt;
pub mod session;
pub mod trace;

// Re-export commonly used types
pub use config::{LlmConfig, SessionConfig};
pub use error::{Error, Result};
pub use llm::{AnthropicClient, LlmClient, TokenUsage};
pub use memory::{MemoryCommand, MemoryStore};
pub use session::{Session, StreamEvent, TokenReport, TurnOutcome};
pub use trace::{SessionTrace, SessionTraceRecorder};

/// Current version of the memoro-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for the library
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

/// Initialize tracing with a specific debug mode
pub fn init_tracing_with_debug(debug: bool) {
    let filter = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();
}
